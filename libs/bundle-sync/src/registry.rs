//! Registry collaborator interfaces.
//!
//! The sync layer never talks to a registry itself. Tag listing, pulling,
//! unpacking, caching, and credentials all live behind these traits.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::spec::{SemverSelection, TransportOptions};
use crate::versions;

/// Picks a concrete tag for a repository.
#[async_trait]
pub trait VersionSelector: Send + Sync {
    /// List every tag currently published for a repository.
    async fn list_tags(
        &self,
        repository: &str,
        transport: &TransportOptions,
    ) -> Result<Vec<String>>;

    /// Return the highest-ranked tag satisfying the selection.
    ///
    /// Fails when no tag qualifies.
    fn select_highest(&self, tags: &[String], selection: &SemverSelection) -> Result<String> {
        versions::highest_constrained_version(tags, selection)
    }
}

/// Pulls a bundle and unpacks it into a destination directory.
///
/// Implementations must leave `destination` untouched, or roll it back, when
/// they return an error.
#[async_trait]
pub trait BundleFetcher: Send + Sync {
    /// Fetch only the top-level bundle.
    ///
    /// Returns the reference actually fetched, which may be digest-qualified
    /// even when `reference` was a tag.
    async fn fetch_bundle(
        &self,
        reference: &str,
        destination: &Path,
        transport: &TransportOptions,
    ) -> Result<String>;

    /// Fetch the bundle and every bundle nested inside it.
    async fn fetch_bundle_recursively(
        &self,
        reference: &str,
        destination: &Path,
        transport: &TransportOptions,
    ) -> Result<String>;
}
