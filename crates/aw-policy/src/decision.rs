// decision.rs — The adjudication result and its external contract.
//
// Exactly one Decision exists per evaluation. It is immutable, carries a
// snapshot of the action's identifying fields (so the contract and audit
// record are self-contained), and for every deny a non-empty reason plus
// whatever replan guidance the hint table knows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::{Action, ActionMetadata};
use crate::error::{FailCloseError, PolicyError};
use crate::hints::ReplanHint;
use crate::policy::{DEFAULT_ALLOW_POLICY_ID, FAIL_CLOSE_POLICY_ID};

/// The adjudication outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

/// How binding the outcome is: allows are soft (advisory confirmation),
/// denies are hard (the runtime must not execute the action).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSeverity {
    Soft,
    Hard,
}

/// Copy of the originating action's identifying fields, retained on the
/// decision so downstream consumers never need the Action value itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionSnapshot {
    pub action_type: String,
    pub target: String,
    pub metadata: ActionMetadata,
}

impl From<&Action> for ActionSnapshot {
    fn from(action: &Action) -> Self {
        Self {
            action_type: action.action_type.clone(),
            target: action.target.clone(),
            metadata: action.metadata.clone(),
        }
    }
}

/// The adjudication result for one action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// Fresh per evaluation.
    pub decision_id: Uuid,

    /// Back-reference to the adjudicated action (not ownership).
    pub action_id: Uuid,

    /// Identifying fields of that action.
    pub action: ActionSnapshot,

    /// The policy that produced this decision, or a reserved sentinel
    /// ("AW-FAIL-CLOSE", "AW-DEFAULT-ALLOW").
    pub policy_id: String,

    pub result: Verdict,

    /// Non-empty for every deny.
    pub reason: String,

    pub severity: DecisionSeverity,

    /// Natural-language replan hint; present for hint-table denials.
    pub suggestion: Option<String>,

    /// Structured replan hint.
    pub alternative: Option<serde_json::Value>,

    pub timestamp: DateTime<Utc>,
}

impl Decision {
    fn base(action: &Action, policy_id: &str, result: Verdict, reason: String) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            action_id: action.action_id,
            action: ActionSnapshot::from(action),
            policy_id: policy_id.to_string(),
            result,
            reason,
            severity: match result {
                Verdict::Allow => DecisionSeverity::Soft,
                Verdict::Deny => DecisionSeverity::Hard,
            },
            suggestion: None,
            alternative: None,
            timestamp: Utc::now(),
        }
    }

    /// An allow produced by a matching allow policy.
    pub(crate) fn allowed(action: &Action, policy_id: &str, reason: String) -> Self {
        Self::base(action, policy_id, Verdict::Allow, reason)
    }

    /// A deny produced by a matching deny policy, with whatever replan
    /// guidance the hint table offers.
    pub(crate) fn denied(
        action: &Action,
        policy_id: &str,
        reason: String,
        hint: Option<ReplanHint>,
    ) -> Self {
        let mut decision = Self::base(action, policy_id, Verdict::Deny, reason);
        if let Some(hint) = hint {
            decision.suggestion = Some(hint.suggestion);
            decision.alternative = hint.alternative;
        }
        decision
    }

    /// The default allow when no policy matched at all.
    pub(crate) fn default_allow(action: &Action) -> Self {
        Self::base(
            action,
            DEFAULT_ALLOW_POLICY_ID,
            Verdict::Allow,
            "no policy matched".to_string(),
        )
    }

    /// The synthetic hard deny the engine returns when evaluation itself
    /// failed. Tagged with the fail-close sentinel id.
    pub(crate) fn fail_close(action: &Action, failure: &FailCloseError, hint: Option<ReplanHint>) -> Self {
        let mut decision = Self::base(
            action,
            FAIL_CLOSE_POLICY_ID,
            Verdict::Deny,
            format!("evaluation failed, failing closed: {}", failure),
        );
        if let Some(hint) = hint {
            decision.suggestion = Some(hint.suggestion);
            decision.alternative = hint.alternative;
        }
        decision
    }

    /// Hard deny for the unreachable "registry never loaded" state.
    /// Exists so even an impossible internal state resolves toward deny.
    pub(crate) fn fail_close_unloaded(action: &Action) -> Self {
        Self::base(
            action,
            FAIL_CLOSE_POLICY_ID,
            Verdict::Deny,
            "policy registry not loaded, failing closed".to_string(),
        )
    }

    pub fn is_denied(&self) -> bool {
        self.result == Verdict::Deny
    }

    pub fn is_allowed(&self) -> bool {
        self.result == Verdict::Allow
    }

    /// Project this decision into the externally consumable contract.
    pub fn to_contract(&self) -> DecisionContract {
        DecisionContract {
            decision_id: self.decision_id,
            action_id: self.action_id,
            action_type: self.action.action_type.clone(),
            action_target: self.action.target.clone(),
            action_metadata: self.action.metadata.clone(),
            policy_id: self.policy_id.clone(),
            result: self.result,
            reason: self.reason.clone(),
            suggestion: self.suggestion.clone(),
            alternative: self.alternative.clone(),
            severity: self.severity,
            timestamp: self.timestamp,
        }
    }

    /// Consume the decision through `Result` flow: an allow passes the
    /// decision through, a deny becomes [`PolicyError::Denied`].
    pub fn authorize(self) -> Result<Decision, PolicyError> {
        match self.result {
            Verdict::Allow => Ok(self),
            Verdict::Deny => Err(PolicyError::Denied {
                policy_id: self.policy_id,
                reason: self.reason,
                suggestion: self.suggestion,
            }),
        }
    }
}

/// The serialization projection of a [`Decision`] exposed across
/// boundaries: every human/machine-relevant field, no internal
/// bookkeeping. Serializes losslessly to JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionContract {
    pub decision_id: Uuid,
    pub action_id: Uuid,
    pub action_type: String,
    pub action_target: String,
    pub action_metadata: ActionMetadata,
    pub policy_id: String,
    pub result: Verdict,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<serde_json::Value>,
    pub severity: DecisionSeverity,
    pub timestamp: DateTime<Utc>,
}
