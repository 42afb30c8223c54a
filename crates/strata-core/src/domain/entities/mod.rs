pub mod adapter;
pub mod blueprint;
pub mod recipe;

pub use crate::domain::DomainError;
pub use adapter::{AdapterMetadata, LoadedAdapter, PathOverrideDecl, Requirement};
pub use blueprint::{ActionKind, Blueprint, BlueprintAction};
pub use recipe::{ExecutionOptions, GenomeSpec, ModuleRef, ProjectSpec, Recipe};
