// hints.rs — The fixed policy-id → replan-hint table.
//
// Denial is always actionable: every deny decision produced by a declared
// deny policy looks up this table for a natural-language suggestion and,
// where one makes sense, a structured alternative describing how to
// reshape the action to comply. A policy id absent from the table yields
// no suggestion — an explicit gap, never a crash.

use serde::Serialize;
use serde_json::json;

use crate::policy::FAIL_CLOSE_POLICY_ID;

/// Guidance attached to a deny decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplanHint {
    /// Natural-language replan suggestion.
    pub suggestion: String,
    /// Optional structured hint for callers that replan mechanically.
    pub alternative: Option<serde_json::Value>,
}

impl ReplanHint {
    fn new(suggestion: &str, alternative: Option<serde_json::Value>) -> Self {
        Self {
            suggestion: suggestion.to_string(),
            alternative,
        }
    }
}

/// Look up the replan hint for a policy id.
///
/// The table is fixed at compile time and covers the built-in rule set
/// plus the fail-close sentinel. Custom rule sources that declare their
/// own deny policies get `None` here.
pub fn replan_hint(policy_id: &str) -> Option<ReplanHint> {
    match policy_id {
        "AW-GOV-001" => Some(ReplanHint::new(
            "move change to non-governance path",
            Some(json!({
                "action_type": "file.write",
                "target_hint": "any path outside .github/workflows"
            })),
        )),
        "AW-GOV-002" => Some(ReplanHint::new(
            "leave repository hooks untouched; propose the automation as reviewable source instead",
            None,
        )),
        "AW-GIT-001" => Some(ReplanHint::new(
            "open a pull request against a feature branch instead of pushing directly",
            Some(json!({
                "action_type": "git.push",
                "target_hint": "refs/heads/<feature-branch>",
                "then": "open a pull request"
            })),
        )),
        "AW-GIT-002" => Some(ReplanHint::new(
            "push without force, or rebase onto the remote head first",
            Some(json!({
                "action_type": "git.push",
                "metadata": { "force": "false" }
            })),
        )),
        "AW-SEC-001" => Some(ReplanHint::new(
            "keep secret material out of tracked files; use the credential store instead",
            None,
        )),
        "AW-NET-001" => Some(ReplanHint::new(
            "target a non-production environment, or hand the action to a human operator",
            Some(json!({
                "metadata": { "environment": "staging" }
            })),
        )),
        "AW-RES-001" => Some(ReplanHint::new(
            "split the write into smaller pieces or stage the payload out of band",
            None,
        )),
        FAIL_CLOSE_POLICY_ID => Some(ReplanHint::new(
            "report the adjudication failure; do not retry the action unchanged",
            None,
        )),
        _ => None,
    }
}
