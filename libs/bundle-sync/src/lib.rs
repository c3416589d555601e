//! # plfm-bundle-sync
//!
//! Resolves a reference to a registry content bundle, fetches it into a local
//! directory, and records the exact reference used so later runs reproduce
//! the same content without re-resolving floating version selectors.
//!
//! ## Flow
//!
//! ```text
//! FetchSpec ──> BundleSync::resolve_reference ──> [VersionSelector]
//!                         │
//!                         ▼
//!               BundleFetcher (shallow | recursive) ──> LockRecord
//! ```
//!
//! Registry access, caching, credentials, and unpacking sit behind the
//! [`VersionSelector`] and [`BundleFetcher`] traits.
//!
//! ## Modules
//!
//! - `spec`: fetch configuration (`FetchSpec`, `VersionSelection`, `FetchMode`)
//! - `config`: loading specs from TOML/JSON documents
//! - `sync`: the sync orchestrator
//! - `versions`: semver tag ranking
//! - `reference`: best-effort reference parsing
//! - `lock`: lock records

pub mod config;
pub mod error;
pub mod lock;
pub mod reference;
pub mod registry;
pub mod spec;
pub mod sync;
pub mod versions;

pub use error::{ConfigError, SyncError};
pub use lock::LockRecord;
pub use reference::{guess_tag, GuessedRefParts, ResolvedReference};
pub use registry::{BundleFetcher, VersionSelector};
pub use spec::{
    FetchMode, FetchSpec, Prereleases, SemverSelection, TransportOptions, VersionSelection,
};
pub use sync::{BundleSync, SyncPhase};
pub use versions::highest_constrained_version;
