//! Loading fetch specs from configuration documents.
//!
//! A bundle directory is described in TOML or JSON with camelCase keys:
//!
//! ```toml
//! image = "example.com/app"
//! recursive = true
//! dangerousSkipTLSVerify = false
//! responseHeaderTimeoutSecs = 30
//!
//! [secretRef]
//! name = "registry-creds"
//!
//! [tagSelection.semver]
//! constraints = ">=1.0.0 <2.0.0"
//!
//! [tagSelection.semver.prereleases]
//! identifiers = ["rc"]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::spec::{
    FetchMode, FetchSpec, Prereleases, SemverSelection, TransportOptions, VersionSelection,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BundleDocument {
    image: String,

    #[serde(default)]
    tag_selection: Option<TagSelectionDocument>,

    #[serde(default)]
    recursive: bool,

    #[serde(default)]
    secret_ref: Option<SecretRefDocument>,

    #[serde(default, rename = "dangerousSkipTLSVerify")]
    dangerous_skip_tls_verify: bool,

    #[serde(default)]
    response_header_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TagSelectionDocument {
    #[serde(default)]
    semver: Option<SemverDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SemverDocument {
    constraints: String,

    #[serde(default)]
    prereleases: Option<PrereleasesDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrereleasesDocument {
    #[serde(default)]
    identifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecretRefDocument {
    name: String,
}

impl TryFrom<BundleDocument> for FetchSpec {
    type Error = ConfigError;

    fn try_from(doc: BundleDocument) -> Result<Self, Self::Error> {
        let selection = match doc.tag_selection {
            None => VersionSelection::None,
            Some(TagSelectionDocument { semver: None }) => {
                return Err(invalid("tagSelection must specify semver"));
            }
            Some(TagSelectionDocument {
                semver: Some(semver),
            }) => {
                if semver.constraints.trim().is_empty() {
                    return Err(invalid("tagSelection.semver.constraints must be non-empty"));
                }
                VersionSelection::Semver(SemverSelection {
                    constraints: semver.constraints,
                    prereleases: semver.prereleases.map(|pre| Prereleases {
                        identifiers: pre.identifiers,
                    }),
                })
            }
        };

        Ok(FetchSpec {
            repository: doc.image,
            selection,
            mode: FetchMode::from_recursive(doc.recursive),
            preresolved_tag: None,
            transport: TransportOptions {
                secret_ref: doc.secret_ref.map(|secret| secret.name),
                dangerous_skip_tls_verify: doc.dangerous_skip_tls_verify,
                response_header_timeout: doc.response_header_timeout_secs.map(Duration::from_secs),
            },
        })
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_string(),
    }
}

impl FetchSpec {
    /// Parse a spec from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let doc: BundleDocument = toml::from_str(contents)?;
        doc.try_into()
    }

    /// Parse a spec from a JSON document.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let doc: BundleDocument = serde_json::from_str(contents)?;
        doc.try_into()
    }

    /// Load a spec from a `.toml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "toml" => Self::from_toml_str(&std::fs::read_to_string(path)?),
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}
