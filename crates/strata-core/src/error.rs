//! The error type every Strata Core entry point returns.
//!
//! Domain errors are rule violations found in recipes, blueprints and
//! modifier input. Application errors come from running them against a
//! filesystem and a shell. Callers mostly care about one distinction, exposed
//! by [`StrataError::is_structural`]: a structural error rejects the whole
//! recipe before anything is written, anything else fails a single module.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{self, DomainError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StrataError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Strata itself is set up wrongly, e.g. an adapters directory that
    /// does not exist.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An invariant Strata relies on did not hold.
    #[error("Internal error: {message}. This is a bug in Strata.")]
    Internal { message: String },
}

impl StrataError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// What the user can do about it, most specific first.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { .. } => vec![
                "Check adapters.local_path and any STRATA_* environment variables".into(),
                "Show the effective configuration: strata config list".into(),
            ],
            Self::Internal { .. } => vec![
                "Re-run with RUST_LOG=strata_core=debug to see the failing step".into(),
            ],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category().into(),
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Recipe-level problems: shape, duplicates, cycles, missing or
    /// conflicting modules. These stop a run before the first write.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_structural())
    }
}

/// Coarse grouping used for exit codes and styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Configuration,
    Internal,
}

impl From<domain::ErrorCategory> for ErrorCategory {
    fn from(category: domain::ErrorCategory) -> Self {
        match category {
            domain::ErrorCategory::Validation => Self::Validation,
            domain::ErrorCategory::Compatibility => Self::Compatibility,
            domain::ErrorCategory::NotFound => Self::NotFound,
            domain::ErrorCategory::Internal => Self::Internal,
        }
    }
}

pub type StrataResult<T> = Result<T, StrataError>;
