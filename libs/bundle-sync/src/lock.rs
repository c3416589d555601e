//! Lock records produced by a successful sync.

use serde::{Deserialize, Serialize};

/// Pin of the exact reference a sync fetched.
///
/// Only ever built after a successful fetch. Serialization (and where the
/// record is stored) is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Reference reported by the fetcher, usually digest-qualified.
    pub image: String,

    /// Tag to display or reuse on the next run; empty when unknown.
    #[serde(default)]
    pub tag: String,
}

impl LockRecord {
    /// Returns true if the recorded image is pinned by digest.
    pub fn is_digest_pinned(&self) -> bool {
        self.image.contains('@')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_record_serializes_image_and_tag() {
        let lock = LockRecord {
            image: "example.com/app@sha256:abc".to_string(),
            tag: String::new(),
        };

        let json = serde_json::to_value(&lock).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "image": "example.com/app@sha256:abc", "tag": "" })
        );
        assert!(lock.is_digest_pinned());
    }

    #[test]
    fn test_lock_record_tag_defaults_to_empty() {
        let lock: LockRecord =
            serde_json::from_str(r#"{"image":"example.com/app:1.0.0"}"#).unwrap();
        assert_eq!(lock.tag, "");
        assert!(!lock.is_digest_pinned());
    }
}
