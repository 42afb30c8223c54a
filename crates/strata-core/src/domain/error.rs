// ============================================================================
// domain/error.rs - DOMAIN ERROR TAXONOMY
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they are copied into per-module execution results)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Recipe shape (fatal before any file I/O)
    // ========================================================================
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("Module '{category}:{id}' is listed more than once")]
    DuplicateModule { category: String, id: String },

    // ========================================================================
    // Planning (fatal before any file I/O)
    // ========================================================================
    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Module '{module}' requires '{dependency}', which is not in the recipe")]
    MissingDependency { module: String, dependency: String },

    #[error("Module '{module}' conflicts with '{conflicts_with}'")]
    ModuleConflict {
        module: String,
        conflicts_with: String,
    },

    // ========================================================================
    // Parameters
    // ========================================================================
    #[error("Missing required parameter '{parameter}' for module '{module}'")]
    MissingRequiredParameter { module: String, parameter: String },

    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    // ========================================================================
    // Templates, blueprints and merges
    // ========================================================================
    #[error("Unresolved template variable '{{{{{name}}}}}'")]
    UnresolvedVariable { name: String },

    #[error("Invalid blueprint '{blueprint}': {reason}")]
    InvalidBlueprint { blueprint: String, reason: String },

    #[error("Unknown file modifier '{name}'")]
    UnknownModifier { name: String },

    #[error("Cannot merge into {target}: {reason}")]
    UnsupportedMergeSyntax { target: String, reason: String },

    #[error("Invalid manifest content in {target}: {reason}")]
    InvalidManifest { target: String, reason: String },

    #[error("Unknown smart path key '{key}'")]
    UnknownSmartPath { key: String },

    #[error("Invalid module reference '{0}'")]
    InvalidModuleKey(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidRecipe(msg) => vec![
                "Check the shape of your recipe file".into(),
                format!("Details: {msg}"),
            ],
            Self::DuplicateModule { category, id } => vec![
                format!("Remove the duplicate '{category}:{id}' entry"),
                "Merge its parameters into a single module entry".into(),
            ],
            Self::CyclicDependency { cycle } => vec![
                format!("These modules require each other: {}", cycle.join(", ")),
                "Break the cycle by removing one of the modules".into(),
            ],
            Self::MissingDependency { module, dependency } => vec![
                format!("Add '{dependency}' to the recipe, or remove '{module}'"),
                "Try: strata list to see available modules".into(),
            ],
            Self::ModuleConflict {
                module,
                conflicts_with,
            } => vec![
                format!("'{module}' and '{conflicts_with}' cannot be used together"),
                "Keep only one of them in the recipe".into(),
            ],
            Self::MissingRequiredParameter { module, parameter } => vec![
                format!("Set '{parameter}' under the parameters of '{module}'"),
            ],
            Self::UnresolvedVariable { name } => vec![
                format!("No value is available for '{name}'"),
                "Check the variable name in the blueprint or add the parameter".into(),
            ],
            Self::UnsupportedMergeSyntax { target, .. } => vec![
                format!("{target} contains syntax the merger does not understand"),
                "Edit the file by hand or simplify the object literal".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRecipe(_)
            | Self::DuplicateModule { .. }
            | Self::MissingRequiredParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::InvalidModuleKey(_)
            | Self::InvalidBlueprint { .. } => ErrorCategory::Validation,
            Self::CyclicDependency { .. }
            | Self::MissingDependency { .. }
            | Self::ModuleConflict { .. }
            | Self::UnsupportedMergeSyntax { .. }
            | Self::InvalidManifest { .. } => ErrorCategory::Compatibility,
            Self::UnknownModifier { .. } | Self::UnknownSmartPath { .. } => {
                ErrorCategory::NotFound
            }
            Self::UnresolvedVariable { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether this error belongs to the structural class that aborts a run
    /// before any artifact is written.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidRecipe(_)
                | Self::DuplicateModule { .. }
                | Self::CyclicDependency { .. }
                | Self::MissingDependency { .. }
                | Self::ModuleConflict { .. }
                | Self::InvalidModuleKey(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
