// policy.rs — The policy data model.
//
// A Policy is an immutable named rule: a conjunctive condition list paired
// with an allow/deny severity. Policies are loaded once at process start
// and never added, removed, or mutated afterwards — registry order is
// decision order, so the loaded sequence IS the precedence.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::condition::Condition;

/// Every declared policy id must carry this prefix.
pub const POLICY_ID_PREFIX: &str = "AW-";

/// Sentinel id stamped on the synthetic deny the engine returns when
/// evaluation itself fails. Never declarable in a rule source.
pub const FAIL_CLOSE_POLICY_ID: &str = "AW-FAIL-CLOSE";

/// Sentinel id stamped on the default allow returned when no policy
/// matched. Never declarable in a rule source.
pub const DEFAULT_ALLOW_POLICY_ID: &str = "AW-DEFAULT-ALLOW";

/// Engine-owned ids a rule source is not allowed to declare.
pub const RESERVED_POLICY_IDS: &[&str] = &[FAIL_CLOSE_POLICY_ID, DEFAULT_ALLOW_POLICY_ID];

/// Whether a matching policy permits or blocks the action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Allow,
    Deny,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Allow => write!(f, "allow"),
            Severity::Deny => write!(f, "deny"),
        }
    }
}

/// An immutable rule: id, human naming, severity, and the conjunctive
/// condition list an action must fully satisfy to match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Policy {
    /// Globally unique, fixed reserved-prefix format (e.g. "AW-GOV-001").
    pub id: String,

    /// Short machine-friendly name (e.g. "governance-path-write").
    pub name: String,

    /// Human-readable description; doubles as the decision reason, so it
    /// must be non-empty (enforced at load).
    pub description: String,

    /// Allow or deny when all conditions hold.
    pub severity: Severity,

    /// Conjunctive condition list; validated non-empty at load.
    pub conditions: Vec<Condition>,
}

impl Policy {
    pub fn is_deny(&self) -> bool {
        self.severity == Severity::Deny
    }
}

/// Check the reserved-prefix id format: "AW-" followed by at least one
/// character, all uppercase alphanumerics or dashes.
pub fn is_valid_policy_id(id: &str) -> bool {
    match id.strip_prefix(POLICY_ID_PREFIX) {
        None => false,
        Some(rest) => {
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        }
    }
}
