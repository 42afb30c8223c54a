//! Infrastructure adapters for Strata.
//!
//! This crate implements the ports defined in `strata-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod genomes;
pub mod process;
pub mod recipe_loader;
pub mod registry;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use genomes::Genome;
pub use process::{ProcessRunner, RecordingRunner};
pub use recipe_loader::{RecipeFormat, RecipeLoadError, load_recipe};
pub use registry::{InMemoryAdapterRegistry, ManifestLoader};
