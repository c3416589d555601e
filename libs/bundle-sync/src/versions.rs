//! Semver tag ranking.
//!
//! Constraint evaluation is delegated to the `semver` crate. Expressions are
//! normalized first so that registry-style constraints work:
//!
//! - comparators separated by spaces or commas are ANDed (`>=1.0.0 <2.0.0`)
//! - `||` separates alternatives (`^1.2 || ^2.0`)
//! - a bare version means an exact match (`1.2.3` is `=1.2.3`)
//! - versions may carry a leading `v`, as tags do (`>=v1.0.0`)
//!
//! Prereleases admitted by the policy are compared by full semver precedence:
//! `1.2.0-rc.1` fails `>=1.2.0` and `2.0.0-rc.1` satisfies `<2.0.0`.
//! Implied upper bounds (`^1`, `~1.2`, `1.*`) still exclude prereleases of
//! the next release.

use anyhow::{bail, Context, Result};
use semver::{BuildMetadata, Comparator, Op, Version, VersionReq};
use tracing::debug;

use crate::spec::{Prereleases, SemverSelection};

/// Return the tag holding the highest version that satisfies `selection`.
///
/// Tags that are not semantic versions (optionally prefixed with `v`) are
/// ignored. The original tag string is returned, not the parsed version.
pub fn highest_constrained_version(tags: &[String], selection: &SemverSelection) -> Result<String> {
    let alternatives = parse_constraints(&selection.constraints)?;

    let semver_tags: Vec<(&String, Version)> = tags
        .iter()
        .filter_map(|tag| parse_tag(tag).map(|version| (tag, version)))
        .collect();
    let semver_count = semver_tags.len();

    let candidates: Vec<(&String, Version)> = semver_tags
        .into_iter()
        .filter(|(_, version)| prerelease_allowed(version, selection.prereleases.as_ref()))
        .collect();
    let prerelease_filtered = candidates.len();

    let best = candidates
        .into_iter()
        .filter(|(_, version)| satisfies(version, &alternatives))
        .max_by(|(_, a), (_, b)| a.cmp(b));

    debug!(
        constraints = %selection.constraints,
        tags = tags.len(),
        semver_tags = semver_count,
        after_prerelease_filter = prerelease_filtered,
        selected = ?best.as_ref().map(|(tag, _)| tag.as_str()),
        "Ranked tags"
    );

    match best {
        Some((tag, _)) => Ok(tag.clone()),
        None => bail!(
            "expected to find at least one version matching '{}', but did not \
             (tags: {}, semver tags: {}, after prerelease filter: {})",
            selection.description(),
            tags.len(),
            semver_count,
            prerelease_filtered
        ),
    }
}

/// Parse a constraint expression into ORed requirements.
pub fn parse_constraints(expression: &str) -> Result<Vec<VersionReq>> {
    let mut alternatives = Vec::new();
    for branch in expression.split("||") {
        let normalized = normalize_comparators(branch);
        if normalized.is_empty() {
            bail!("empty semver constraint in '{expression}'");
        }
        let req = VersionReq::parse(&normalized)
            .with_context(|| format!("invalid semver constraint '{}'", branch.trim()))?;
        alternatives.push(req);
    }
    Ok(alternatives)
}

fn normalize_comparators(branch: &str) -> String {
    let mut comparators = Vec::new();
    let mut pending_op = String::new();

    for token in branch
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
    {
        // `>= 1.0.0` splits the operator from its version
        if token.chars().all(is_operator_char) {
            pending_op.push_str(token);
            continue;
        }

        let split = token.find(|c: char| !is_operator_char(c)).unwrap_or(0);
        let (attached_op, version) = token.split_at(split);
        let version = strip_v_prefix(version);
        let op = std::mem::take(&mut pending_op) + attached_op;

        if op.is_empty() && is_exact_version(version) {
            comparators.push(format!("={version}"));
        } else {
            comparators.push(format!("{op}{version}"));
        }
    }

    if !pending_op.is_empty() {
        comparators.push(pending_op);
    }

    comparators.join(", ")
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^')
}

fn strip_v_prefix(version: &str) -> &str {
    version
        .strip_prefix('v')
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(version)
}

fn is_exact_version(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit())
        && !token.contains(|c: char| matches!(c, '*' | 'x' | 'X'))
}

fn parse_tag(tag: &str) -> Option<Version> {
    let trimmed = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(trimmed).ok()
}

fn prerelease_allowed(version: &Version, policy: Option<&Prereleases>) -> bool {
    if version.pre.is_empty() {
        return true;
    }
    match policy {
        None => false,
        Some(policy) if policy.identifiers.is_empty() => true,
        Some(policy) => version
            .pre
            .as_str()
            .split('.')
            .any(|id| policy.identifiers.iter().any(|wanted| wanted == id)),
    }
}

fn satisfies(version: &Version, alternatives: &[VersionReq]) -> bool {
    let version = Version {
        build: BuildMetadata::EMPTY,
        ..version.clone()
    };
    alternatives.iter().any(|req| {
        req.comparators
            .iter()
            .all(|comparator| comparator_admits(comparator, &version))
    })
}

type Triple = (u64, u64, u64);

fn triple(version: &Version) -> Triple {
    (version.major, version.minor, version.patch)
}

/// Evaluate one comparator by precedence.
///
/// `semver` only lets a prerelease match a comparator on its own release
/// triple; prerelease admission is decided by the policy instead, so this
/// compares any version against the comparator's bounds.
fn comparator_admits(comparator: &Comparator, version: &Version) -> bool {
    let floor = Version {
        major: comparator.major,
        minor: comparator.minor.unwrap_or(0),
        patch: comparator.patch.unwrap_or(0),
        pre: comparator.pre.clone(),
        build: BuildMetadata::EMPTY,
    };
    // First release above a partial version; its prereleases are excluded too.
    let partial_ceiling: Triple = match comparator.minor {
        Some(minor) => (comparator.major, minor + 1, 0),
        None => (comparator.major + 1, 0, 0),
    };
    let is_full = comparator.minor.is_some() && comparator.patch.is_some();

    match comparator.op {
        Op::Exact | Op::Wildcard if is_full => *version == floor,
        Op::Exact | Op::Wildcard => *version >= floor && triple(version) < partial_ceiling,
        Op::Greater if is_full => *version > floor,
        Op::Greater => triple(version) >= partial_ceiling,
        Op::GreaterEq => *version >= floor,
        Op::Less => *version < floor,
        Op::LessEq if is_full => *version <= floor,
        Op::LessEq => triple(version) < partial_ceiling,
        Op::Tilde => *version >= floor && triple(version) < partial_ceiling,
        Op::Caret => *version >= floor && triple(version) < caret_ceiling(comparator),
        _ => comparator.matches(version),
    }
}

fn caret_ceiling(comparator: &Comparator) -> Triple {
    match (comparator.major, comparator.minor, comparator.patch) {
        (0, Some(0), Some(patch)) => (0, 0, patch + 1),
        (0, Some(minor), _) => (0, minor + 1, 0),
        (major, _, _) => (major + 1, 0, 0),
    }
}
