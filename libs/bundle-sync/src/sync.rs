//! Bundle sync orchestration.
//!
//! A sync resolves the configured reference (listing tags and ranking them
//! when a selection is configured), fetches the bundle in the configured mode,
//! and assembles a lock record:
//!
//! ```text
//! Init -> Resolving -> ResolveFailed
//!                   -> Resolved -> Fetching -> FetchFailed
//!                                           -> Fetched -> LockAssembled
//! ```
//!
//! Nothing is retried within a call and no lock record accompanies an error.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::SyncError;
use crate::lock::LockRecord;
use crate::reference::{guess_tag, ResolvedReference};
use crate::registry::{BundleFetcher, VersionSelector};
use crate::spec::{FetchMode, FetchSpec, SemverSelection, VersionSelection};

/// Phases of a single sync call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Init,
    Resolving,
    ResolveFailed,
    Resolved,
    Fetching,
    FetchFailed,
    Fetched,
    LockAssembled,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Init => "init",
            SyncPhase::Resolving => "resolving",
            SyncPhase::ResolveFailed => "resolve_failed",
            SyncPhase::Resolved => "resolved",
            SyncPhase::Fetching => "fetching",
            SyncPhase::FetchFailed => "fetch_failed",
            SyncPhase::Fetched => "fetched",
            SyncPhase::LockAssembled => "lock_assembled",
        }
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncPhase::ResolveFailed | SyncPhase::FetchFailed | SyncPhase::LockAssembled
        )
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syncs one bundle spec into destination directories.
///
/// Holds only immutable configuration and shared collaborators, so a single
/// instance can serve concurrent calls for distinct destinations.
pub struct BundleSync {
    spec: FetchSpec,
    selector: Arc<dyn VersionSelector>,
    fetcher: Arc<dyn BundleFetcher>,
}

impl BundleSync {
    /// Create a sync for a spec.
    pub fn new(
        spec: FetchSpec,
        selector: Arc<dyn VersionSelector>,
        fetcher: Arc<dyn BundleFetcher>,
    ) -> Self {
        Self {
            spec,
            selector,
            fetcher,
        }
    }

    /// Short identity of the target for logs and progress output.
    pub fn describe(&self) -> String {
        self.spec.describe()
    }

    /// Turn the spec into one concrete reference.
    ///
    /// Only queries the remote tag namespace; the destination is untouched.
    pub async fn resolve_reference(&self) -> Result<ResolvedReference, SyncError> {
        let repository = self.spec.repository.as_str();
        if repository.is_empty() {
            return Err(SyncError::invalid_spec("expected non-empty repository"));
        }

        match &self.spec.selection {
            // A repository that already embeds a tag or digest is not checked
            // here; the fetch rejects it with the registry's own message.
            VersionSelection::None => Ok(ResolvedReference::verbatim(repository)),
            VersionSelection::Semver(selection) => {
                let tag = self.select_tag(repository, selection).await?;
                Ok(ResolvedReference::tagged(repository, &tag))
            }
        }
    }

    async fn select_tag(
        &self,
        repository: &str,
        selection: &SemverSelection,
    ) -> Result<String, SyncError> {
        let tags = self
            .selector
            .list_tags(repository, &self.spec.transport)
            .await
            .map_err(|source| SyncError::TagListingFailed {
                repository: repository.to_string(),
                source,
            })?;

        debug!(
            repository = %repository,
            tag_count = tags.len(),
            selection = %selection.description(),
            "Listed tags"
        );

        self.selector
            .select_highest(&tags, selection)
            .map_err(|source| SyncError::NoMatchingVersion {
                repository: repository.to_string(),
                selection: selection.description(),
                source,
            })
    }

    /// Fetch the bundle into `destination` and return its lock record.
    ///
    /// Creating and cleaning up `destination` is the fetcher's job. Callers
    /// must not sync two specs into the same destination concurrently.
    pub async fn sync(&self, destination: &Path) -> Result<LockRecord, SyncError> {
        let bundle = self.describe();
        let mode = self.spec.mode;

        info!(
            bundle = %bundle,
            destination = %destination.display(),
            mode = %mode,
            phase = %SyncPhase::Resolving,
            "Syncing bundle"
        );

        let resolved = self.resolve_reference().await?;
        debug!(
            bundle = %bundle,
            reference = %resolved,
            phase = %SyncPhase::Resolved,
            "Resolved bundle reference"
        );

        let fetched = self.fetch(&resolved, destination).await?;
        debug!(
            reference = %resolved,
            fetched = %fetched,
            phase = %SyncPhase::Fetched,
            "Fetched bundle"
        );

        let lock = self.assemble_lock(&resolved, fetched);
        info!(
            bundle = %bundle,
            image = %lock.image,
            tag = %lock.tag,
            phase = %SyncPhase::LockAssembled,
            "Bundle synced"
        );

        Ok(lock)
    }

    async fn fetch(
        &self,
        resolved: &ResolvedReference,
        destination: &Path,
    ) -> Result<String, SyncError> {
        let mode = self.spec.mode;
        let transport = &self.spec.transport;

        debug!(
            reference = %resolved,
            mode = %mode,
            phase = %SyncPhase::Fetching,
            "Fetching bundle"
        );

        let result = match mode {
            FetchMode::Shallow => {
                self.fetcher
                    .fetch_bundle(resolved.as_str(), destination, transport)
                    .await
            }
            FetchMode::Recursive => {
                self.fetcher
                    .fetch_bundle_recursively(resolved.as_str(), destination, transport)
                    .await
            }
        };

        result.map_err(|source| SyncError::FetchFailed {
            reference: resolved.to_string(),
            mode,
            source,
        })
    }

    fn assemble_lock(&self, resolved: &ResolvedReference, image: String) -> LockRecord {
        let tag = match self.spec.preresolved_tag() {
            Some(tag) => tag.to_string(),
            None => {
                // Digest-only fetch results fall back to the requested tag
                let fetched_tag = guess_tag(&image);
                if fetched_tag.is_empty() {
                    guess_tag(resolved.as_str())
                } else {
                    fetched_tag
                }
            }
        };

        LockRecord { image, tag }
    }
}
