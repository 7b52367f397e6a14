// evaluator.rs — Pure single-policy evaluation.
//
// Maps (Action, Policy) → Option<Decision>. Stateless, no I/O, no side
// effects: the same action against the same policy always produces the
// same answer. Conditions are conjunctive — the first unsatisfied one
// short-circuits to "no match".
//
// Errors from condition matching (malformed regex, non-numeric metadata)
// propagate out of here untouched. Swallowing one would turn an evaluator
// defect into a silent allow; the engine owns the fail-close conversion.

use crate::action::Action;
use crate::decision::Decision;
use crate::error::EvaluationError;
use crate::hints;
use crate::policy::{Policy, Severity};

/// The stateless condition-matching evaluator.
#[derive(Debug, Default)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one policy against one action.
    ///
    /// Returns `Ok(None)` when the policy does not match, `Ok(Some(_))`
    /// with the allow/deny decision when it does, and `Err(_)` when a
    /// condition could not be evaluated at all.
    pub fn evaluate(
        &self,
        action: &Action,
        policy: &Policy,
    ) -> Result<Option<Decision>, EvaluationError> {
        for condition in &policy.conditions {
            if !condition.matches(action)? {
                tracing::trace!(
                    policy_id = %policy.id,
                    condition = condition.key(),
                    "condition unsatisfied"
                );
                return Ok(None);
            }
        }

        let decision = match policy.severity {
            Severity::Deny => Decision::denied(
                action,
                &policy.id,
                policy.description.clone(),
                hints::replan_hint(&policy.id),
            ),
            Severity::Allow => {
                Decision::allowed(action, &policy.id, policy.description.clone())
            }
        };
        Ok(Some(decision))
    }
}
