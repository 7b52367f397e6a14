// action.rs — The action data model.
//
// An Action is an immutable description of one operation an agent intends
// to perform: a dotted type category ("file.write", "git.push"), a target
// resource identifier, and an open string-keyed metadata map. The caller
// constructs one Action per attempt; it is never mutated and never
// persisted by this crate.
//
// Metadata is deliberately NOT exposed as a raw map. Each condition
// operator reads it through a typed, validated accessor so that a type
// mismatch is an explicit error instead of a silent coercion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EvaluationError;

/// Open string-keyed metadata attached to an action.
///
/// Backed by a `BTreeMap` so iteration (and therefore serialization) is
/// deterministic regardless of insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionMetadata(BTreeMap<String, String>);

impl ActionMetadata {
    /// Create an empty metadata map.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add an entry and return self (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether a key is present at all.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Read a key as a number for threshold comparisons.
    ///
    /// A missing key defaults to 0.0; a present but unparsable value is a
    /// typed evaluation error that the engine converts to a fail-close deny.
    pub fn numeric(&self, key: &str) -> Result<f64, EvaluationError> {
        match self.0.get(key) {
            None => Ok(0.0),
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| EvaluationError::MetadataNotNumeric {
                    key: key.to_string(),
                    value: raw.clone(),
                }),
        }
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for ActionMetadata {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for ActionMetadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An immutable, identified description of an operation an agent intends
/// to perform. One per attempt; the `action_id` is what decisions and
/// audit records refer back to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    /// Unique per attempt.
    pub action_id: Uuid,

    /// Dotted category, e.g. "file.write", "git.push", "tool.invoke".
    pub action_type: String,

    /// Resource identifier the operation targets
    /// (a path, a git ref, a tool endpoint).
    pub target: String,

    /// Open metadata consulted by metadata-keyed conditions.
    #[serde(default)]
    pub metadata: ActionMetadata,
}

impl Action {
    /// Create an action with a fresh v4 UUID.
    pub fn create(
        action_type: impl Into<String>,
        target: impl Into<String>,
        metadata: ActionMetadata,
    ) -> Self {
        Self {
            action_id: Uuid::new_v4(),
            action_type: action_type.into(),
            target: target.into(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_stamps_a_fresh_id() {
        let a = Action::create("file.write", "/tmp/a.txt", ActionMetadata::new());
        let b = Action::create("file.write", "/tmp/a.txt", ActionMetadata::new());
        assert_ne!(a.action_id, b.action_id);
    }

    #[test]
    fn metadata_numeric_defaults_missing_key_to_zero() {
        let meta = ActionMetadata::new();
        assert_eq!(meta.numeric("size_bytes").unwrap(), 0.0);
    }

    #[test]
    fn metadata_numeric_parses_numbers() {
        let meta = ActionMetadata::new().with("size_bytes", "1048576");
        assert_eq!(meta.numeric("size_bytes").unwrap(), 1048576.0);
    }

    #[test]
    fn metadata_numeric_rejects_garbage() {
        let meta = ActionMetadata::new().with("size_bytes", "lots");
        let err = meta.numeric("size_bytes").unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::MetadataNotNumeric { ref key, .. } if key == "size_bytes"
        ));
    }

    #[test]
    fn metadata_iterates_in_key_order() {
        let meta = ActionMetadata::new().with("b", "2").with("a", "1");
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn action_serialization_round_trip() {
        let action = Action::create(
            "git.push",
            "refs/heads/main",
            ActionMetadata::new().with("force", "true"),
        );
        let json = serde_json::to_string(&action).expect("serialize");
        let restored: Action = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(action, restored);
    }
}
