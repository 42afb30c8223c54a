//! Application layer for Strata.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (Orchestrator, BlueprintExecutor, AdapterService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Report**: Per-module results and the run report
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. All business rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod report;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use services::{
    AdapterDetails, AdapterInfo, AdapterService, BlueprintExecutor, CancellationFlag,
    ExecutionContext, Orchestrator, ParameterInfo,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    AdapterRegistry, CommandOutput, CommandRunner, CommandSpec, ExecutionObserver, Filesystem,
    NoopObserver,
};

pub use error::ApplicationError;
pub use report::{ActionError, ExecutionResult, ModuleStatus, RecipeExecutionReport, Warning};
