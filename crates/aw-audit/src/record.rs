// record.rs — The audit record data model.
//
// One DecisionRecord per adjudicated action: the full decision contract
// plus the originating action's identifying fields, flattened into the
// wire form compliance tooling reads. Records are immutable copies — the
// trail never holds a live reference into the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aw_policy::{Action, ActionMetadata, Decision, DecisionSeverity, Verdict};

/// One line in the decision log / one entry in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRecord {
    /// When this record was written (distinct from the decision's own
    /// timestamp — a replayed log keeps both).
    pub recorded_at: DateTime<Utc>,

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

    /// Hash of the previous record line (JSONL log only; None for the
    /// first record and for in-memory trail entries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
}

impl DecisionRecord {
    /// Build a record from a decision and its originating action.
    pub fn new(decision: &Decision, action: &Action) -> Self {
        Self {
            recorded_at: Utc::now(),
            decision_id: decision.decision_id,
            action_id: action.action_id,
            action_type: action.action_type.clone(),
            action_target: action.target.clone(),
            action_metadata: action.metadata.clone(),
            policy_id: decision.policy_id.clone(),
            result: decision.result,
            reason: decision.reason.clone(),
            suggestion: decision.suggestion.clone(),
            alternative: decision.alternative.clone(),
            severity: decision.severity,
            timestamp: decision.timestamp,
            previous_hash: None,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.result == Verdict::Deny
    }
}
