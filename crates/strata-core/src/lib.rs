//! Strata Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Strata
//! project scaffolding engine, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           strata-cli (CLI)              │
//! │     (Parses recipes, renders report)    │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (Orchestrator, BlueprintExecutor, ...)  │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Registry, Filesystem, CommandRunner)   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    strata-adapters (Infrastructure)     │
//! │ (InMemoryAdapterRegistry, LocalFs, ...) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │ (Recipe, Planner, SmartPaths, Modifiers)│
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_core::prelude::*;
//!
//! # fn adapters() -> (Arc<dyn AdapterRegistry>, Arc<dyn Filesystem>, Arc<dyn CommandRunner>) { unimplemented!() }
//! let (registry, filesystem, runner) = adapters();
//!
//! let recipe = Recipe::new("my-app")
//!     .with_module(ModuleRef::new(ModuleCategory::Framework, "nextjs"))
//!     .with_module(ModuleRef::new(ModuleCategory::Database, "drizzle"));
//!
//! let report = Orchestrator::new(registry, filesystem, runner).run(&recipe);
//! assert!(report.is_success());
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        AdapterRegistry, AdapterService, CommandRunner, ExecutionObserver, ExecutionResult,
        Filesystem, Orchestrator, RecipeExecutionReport,
    };
    pub use crate::domain::{
        AdapterMetadata, Blueprint, BlueprintAction, ExecutionOptions, LoadedAdapter,
        ModuleCategory, ModuleKey, ModuleRef, ParameterSchema, Recipe,
    };
    pub use crate::error::{StrataError, StrataResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
