// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Strata.
//!
//! Pure logic: recipes, parameter schemas, smart paths, dependency planning,
//! blueprints, template substitution, merge strategies and file modifiers.
//! Nothing in here touches the filesystem or spawns processes; that goes
//! through the ports in the application layer.
//!
//! - **No I/O**: every function is a transformation of values
//! - **Immutable inputs**: recipes and blueprints are never mutated
//! - **Explicit errors**: every failure is a [`DomainError`] variant
pub mod capabilities;
pub mod entities;
pub mod error;
pub mod merge;
pub mod modifiers;
pub mod parameters;
pub mod planner;
pub mod smart_path;
pub mod template;
pub mod value_objects;

mod validation;

pub use capabilities::Capability;
pub use entities::{
    ActionKind, AdapterMetadata, Blueprint, BlueprintAction, ExecutionOptions, GenomeSpec,
    LoadedAdapter, ModuleRef, PathOverrideDecl, ProjectSpec, Recipe, Requirement,
};
pub use error::{DomainError, ErrorCategory};
pub use merge::MergeStrategy;
pub use modifiers::{FileModifier, ModifierRegistry, Modified};
pub use parameters::{
    ParameterDef, ParameterResolution, ParameterResolver, ParameterSchema, ParameterWarning,
    ResolvedParameters,
};
pub use planner::{DependencyPlanner, ExecutionPlan, PlanNode};
pub use smart_path::{
    OverrideSource, PathContext, PathOverride, PathOverrideWarning, SmartPathKey,
    SmartPathResolver,
};
pub use template::TemplateContext;
pub use validation::DomainValidator;
pub use value_objects::{ModuleCategory, ModuleKey, ParameterType, ParameterValue, ProjectLayout};
