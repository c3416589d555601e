//! Fetch configuration for a single bundle sync.

use std::fmt;
use std::time::Duration;

use crate::error::SyncError;
use crate::lock::LockRecord;

/// Placeholder rendered by [`FetchSpec::describe`] when no repository is set.
const UNKNOWN_REPOSITORY: &str = "?";

/// Immutable configuration for one bundle sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    /// Repository identity of the bundle, e.g. `example.com/org/app`.
    pub repository: String,

    /// How a concrete tag is picked for the repository.
    pub selection: VersionSelection,

    /// Whether nested bundles are materialized as well.
    pub mode: FetchMode,

    /// Tag pinned by an earlier lock record.
    ///
    /// Distinct from `selection`: a pinned tag is never re-resolved, it is
    /// only carried into the next lock record.
    pub preresolved_tag: Option<String>,

    /// Settings forwarded untouched to the registry collaborators.
    pub transport: TransportOptions,
}

impl FetchSpec {
    /// Create a shallow, unselected spec for a repository.
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            selection: VersionSelection::None,
            mode: FetchMode::Shallow,
            preresolved_tag: None,
            transport: TransportOptions::default(),
        }
    }

    /// Select the highest tag satisfying a semver selection.
    pub fn with_selection(mut self, selection: SemverSelection) -> Self {
        self.selection = VersionSelection::Semver(selection);
        self
    }

    /// Set the fetch mode.
    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the transport options forwarded to the collaborators.
    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// Pin a tag to be recorded verbatim in the lock record.
    pub fn with_preresolved_tag(mut self, tag: impl Into<String>) -> Self {
        self.preresolved_tag = Some(tag.into());
        self
    }

    /// The pinned tag, if one is set and non-empty.
    pub fn preresolved_tag(&self) -> Option<&str> {
        self.preresolved_tag.as_deref().filter(|tag| !tag.is_empty())
    }

    /// Short, human-readable identity of what will be fetched.
    ///
    /// Renders `?` for an empty repository instead of failing; only meant
    /// for logs and progress output.
    pub fn describe(&self) -> String {
        if self.repository.is_empty() {
            return UNKNOWN_REPOSITORY.to_string();
        }
        match &self.selection {
            VersionSelection::None => self.repository.clone(),
            VersionSelection::Semver(selection) => {
                format!("{}:tag={}", self.repository, selection.description())
            }
        }
    }

    /// Pin this spec to a previously recorded lock.
    ///
    /// The locked image replaces the repository, the selection is dropped so
    /// no tag listing happens, and the lock's tag is carried forward as the
    /// preresolved tag. Mode and transport settings are kept.
    pub fn locked(&self, lock: &LockRecord) -> Result<Self, SyncError> {
        if lock.image.is_empty() {
            return Err(SyncError::invalid_spec(
                "expected lock record image to be non-empty",
            ));
        }

        Ok(Self {
            repository: lock.image.clone(),
            selection: VersionSelection::None,
            mode: self.mode,
            preresolved_tag: Some(lock.tag.clone()),
            transport: self.transport.clone(),
        })
    }
}

/// How the tag to fetch is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionSelection {
    /// The repository string alone determines the reference.
    #[default]
    None,
    /// Pick the highest published tag satisfying a semver constraint.
    Semver(SemverSelection),
}

/// Semver-constrained tag selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemverSelection {
    /// Constraint expression, e.g. `>=1.0.0 <2.0.0`.
    pub constraints: String,

    /// Prerelease policy; `None` excludes all prerelease tags.
    pub prereleases: Option<Prereleases>,
}

impl SemverSelection {
    pub fn new(constraints: impl Into<String>) -> Self {
        Self {
            constraints: constraints.into(),
            prereleases: None,
        }
    }

    /// Allow prerelease tags, optionally restricted to the given identifiers.
    pub fn with_prereleases<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prereleases = Some(Prereleases {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Human-readable form used in descriptions and error messages.
    pub fn description(&self) -> String {
        match &self.prereleases {
            None => self.constraints.clone(),
            Some(pre) if pre.identifiers.is_empty() => {
                format!("{} (+prereleases)", self.constraints)
            }
            Some(pre) => format!(
                "{} (+prereleases: {})",
                self.constraints,
                pre.identifiers.join(",")
            ),
        }
    }
}

/// Prerelease policy for semver selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prereleases {
    /// Identifiers a prerelease must contain; empty allows any prerelease.
    pub identifiers: Vec<String>,
}

/// Whether nested bundles referenced by the fetched bundle are materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// Fetch only the top-level bundle.
    #[default]
    Shallow,
    /// Fetch the bundle and every bundle nested inside it.
    Recursive,
}

impl FetchMode {
    pub fn from_recursive(recursive: bool) -> Self {
        if recursive {
            FetchMode::Recursive
        } else {
            FetchMode::Shallow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Shallow => "shallow",
            FetchMode::Recursive => "recursive",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry transport settings.
///
/// Never interpreted by the sync layer; handed as-is to the collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Name of the secret holding registry credentials.
    pub secret_ref: Option<String>,

    /// Skip TLS certificate verification.
    pub dangerous_skip_tls_verify: bool,

    /// Maximum time to wait for response headers.
    pub response_header_timeout: Option<Duration>,
}
