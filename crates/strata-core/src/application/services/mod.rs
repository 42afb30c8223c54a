//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "run a recipe" or "describe an adapter".

pub mod adapter_service;
pub mod blueprint_executor;
pub mod orchestrator;

pub use adapter_service::{AdapterDetails, AdapterInfo, AdapterService, ParameterInfo};
pub use blueprint_executor::{BlueprintExecutor, ExecutionContext};
pub use orchestrator::{CancellationFlag, Orchestrator};
