//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `strata-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations on the project tree
//!   - `CommandRunner`: One-shot external processes
//!   - `AdapterRegistry`: Adapter metadata and loading
//!   - `ExecutionObserver`: Progress notifications
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    AdapterRegistry, CommandOutput, CommandRunner, CommandSpec, ExecutionObserver, Filesystem,
    NoopObserver,
};

#[cfg(test)]
pub use output::MockAdapterRegistry;
