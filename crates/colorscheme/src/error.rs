//! Error types for preference handling.

use std::io;
use std::path::PathBuf;

/// Errors produced while parsing, loading or persisting a preference.
///
/// None of these are fatal to a [`PreferenceController`](crate::PreferenceController):
/// invalid input is rejected at the call site, and storage failures degrade to
/// in-memory operation.
#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    /// The value is not one of `light`, `dark` or `light dark`.
    #[error("Invalid color scheme mode '{0}'. Expected light, dark or system.")]
    InvalidMode(String),

    /// The backing store could not be read or written.
    #[error("Preference storage unavailable: {reason}")]
    StorageUnavailable {
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The store file exists but does not hold a JSON object.
    #[error("Malformed preference file {path}: {source}")]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SchemeError {
    /// Create an invalid mode error.
    pub fn invalid_mode(value: impl Into<String>) -> Self {
        Self::InvalidMode(value.into())
    }

    /// Create a storage error without an underlying I/O cause.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a storage error wrapping an I/O failure.
    pub fn io(reason: impl Into<String>, source: io::Error) -> Self {
        Self::StorageUnavailable {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// True for failures of the persistence layer, as opposed to bad input.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable { .. } | Self::MalformedStore { .. }
        )
    }
}
