//! Best-effort parsing of registry references.
//!
//! References are either `repository:tag` or `repository@digest` (a tagged
//! digest reference `repository:tag@digest` is also accepted). Parsing never
//! fails: anything that does not look like a tag or digest is left in the
//! repository part.

use std::fmt;

/// Fully-qualified reference handed to the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedReference(String);

impl ResolvedReference {
    /// Reference made of the repository identity verbatim.
    pub fn verbatim(repository: &str) -> Self {
        Self(repository.to_string())
    }

    /// Reference made of a repository and a selected tag.
    pub fn tagged(repository: &str, tag: &str) -> Self {
        Self(format!("{repository}:{tag}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Components guessed from a reference string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuessedRefParts {
    pub repository: String,
    /// Empty when the reference carries no tag.
    pub tag: String,
    /// Empty when the reference carries no digest.
    pub digest: String,
}

impl GuessedRefParts {
    /// Split a reference into repository, tag, and digest.
    ///
    /// Examples:
    /// - `example.com/app:1.2.0` -> (example.com/app, 1.2.0, "")
    /// - `example.com/app@sha256:abc` -> (example.com/app, "", sha256:abc)
    /// - `localhost:5000/app` -> (localhost:5000/app, "", "")
    pub fn guess(reference: &str) -> Self {
        let (name_part, digest) = match reference.split_once('@') {
            Some((name, digest)) => (name, digest.to_string()),
            None => (reference, String::new()),
        };

        let (repository, tag) = match name_part.rsplit_once(':') {
            // A colon followed by a path segment is a registry port
            Some((repo, tag)) if !tag.contains('/') => (repo, tag.to_string()),
            _ => (name_part, String::new()),
        };

        Self {
            repository: repository.to_string(),
            tag,
            digest,
        }
    }
}

/// Tag component of a reference, or an empty string for digest-only refs.
pub fn guess_tag(reference: &str) -> String {
    GuessedRefParts::guess(reference).tag
}
