//! Error types for strata
//!
//! All modules use `StrataResult<T>` as their return type. Variants carry
//! the offending identifier (glob pattern, path, stage name) as a field so
//! callers can match on the failure kind instead of parsing messages.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for strata operations
pub type StrataResult<T> = Result<T, StrataError>;

/// All errors that can occur in strata
#[derive(Error, Debug)]
pub enum StrataError {
    // Build context errors
    #[error("failed to materialize build context: {reason}")]
    ContextExtract { reason: String },

    #[error("build context source not found: {0}")]
    ContextSourceNotFound(PathBuf),

    #[error("operation cancelled")]
    Cancelled,

    // Glob / checksum errors
    #[error("unable to resolve glob {pattern:?}: {reason}")]
    GlobResolve { pattern: String, reason: String },

    #[error("no glob matches for globs: {}", globs.join(", "))]
    NoGlobMatches { globs: Vec<String> },

    #[error("unable to checksum {path}: {reason}")]
    PathChecksum { path: PathBuf, reason: String },

    // Stage chain errors
    #[error("stage not found: {0}")]
    StageNotFound(String),

    #[error("stage {stage} is not signed yet")]
    StageNotSigned { stage: String },

    #[error("stage {stage} is already resolved")]
    StageAlreadyResolved { stage: String },

    #[error("failed to resolve dependency {name}: {reason}")]
    DependencyResolve { name: String, reason: String },

    // Build plan errors
    #[error("invalid build plan at {path}: {reason}")]
    PlanInvalid { path: PathBuf, reason: String },

    #[error("build plan not found: {0}")]
    PlanNotFound(PathBuf),

    // Configuration errors
    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl StrataError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a glob resolution error
    pub fn glob(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GlobResolve {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoGlobMatches { .. } => {
                Some("Check the source patterns against the build context contents")
            }
            Self::ContextSourceNotFound(_) => {
                Some("Set `context` in strata.toml to a directory or tar archive")
            }
            Self::PlanNotFound(_) => {
                Some("Run from a directory containing strata.toml, or pass --plan")
            }
            _ => None,
        }
    }
}
