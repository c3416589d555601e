//! Error types for bundle resolution and sync.

use thiserror::Error;

use crate::spec::FetchMode;
use crate::sync::SyncPhase;

/// Errors that abort a single bundle sync.
///
/// Every variant is terminal for the call that produced it; no lock record is
/// ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The fetch spec cannot be resolved as configured.
    #[error("invalid fetch spec: {reason}")]
    InvalidSpec { reason: String },

    /// The registry could not list the tags published for the repository.
    #[error("listing tags for '{repository}': {source}")]
    TagListingFailed {
        repository: String,
        #[source]
        source: anyhow::Error,
    },

    /// No published tag satisfies the configured selection.
    #[error("determining tag selection for '{repository}' ({selection}): {source}")]
    NoMatchingVersion {
        repository: String,
        selection: String,
        #[source]
        source: anyhow::Error,
    },

    /// The artifact fetcher failed to pull or unpack the bundle.
    #[error("fetching bundle '{reference}' ({mode}): {source}")]
    FetchFailed {
        reference: String,
        mode: FetchMode,
        #[source]
        source: anyhow::Error,
    },
}

impl SyncError {
    pub(crate) fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
        }
    }

    /// The terminal phase the sync reached when this error was raised.
    pub fn phase(&self) -> SyncPhase {
        match self {
            SyncError::InvalidSpec { .. }
            | SyncError::TagListingFailed { .. }
            | SyncError::NoMatchingVersion { .. } => SyncPhase::ResolveFailed,
            SyncError::FetchFailed { .. } => SyncPhase::FetchFailed,
        }
    }

    /// Returns true if a later call with the same spec could succeed.
    ///
    /// Configuration errors never clear up on their own; collaborator
    /// failures (registry outages, newly published tags) might.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::InvalidSpec { .. })
    }
}

/// Errors from loading a fetch spec document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported spec file extension: {0}")]
    UnsupportedFormat(String),

    #[error("invalid spec: {message}")]
    Invalid { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_spec_is_not_retryable() {
        let err = SyncError::invalid_spec("expected non-empty repository");
        assert!(!err.is_retryable());
        assert_eq!(err.phase(), SyncPhase::ResolveFailed);
        assert_eq!(
            err.to_string(),
            "invalid fetch spec: expected non-empty repository"
        );
    }

    #[test]
    fn test_fetch_failed_keeps_context_and_source() {
        let err = SyncError::FetchFailed {
            reference: "example.com/app:1.2.0".to_string(),
            mode: FetchMode::Recursive,
            source: anyhow::anyhow!("manifest unknown"),
        };

        assert!(err.is_retryable());
        assert_eq!(err.phase(), SyncPhase::FetchFailed);
        assert_eq!(
            err.to_string(),
            "fetching bundle 'example.com/app:1.2.0' (recursive): manifest unknown"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("manifest unknown"));
    }

    #[test]
    fn test_no_matching_version_names_repository_and_selection() {
        let err = SyncError::NoMatchingVersion {
            repository: "example.com/app".to_string(),
            selection: ">=3.0.0".to_string(),
            source: anyhow::anyhow!("no tag satisfies constraints"),
        };

        let message = err.to_string();
        assert!(message.contains("example.com/app"));
        assert!(message.contains(">=3.0.0"));
        assert!(message.contains("no tag satisfies constraints"));
    }
}
