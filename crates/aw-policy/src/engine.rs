// engine.rs — The adjudication orchestrator.
//
// `evaluate()` is the single chokepoint: every action an agent proposes
// flows through here, and it is total — exactly one Decision comes back,
// never an error, never a panic. The algorithm:
//
// 1. Walk the frozen policy list in registry (load) order.
// 2. The FIRST matching deny short-circuits and wins — deny-overrides:
//    a deny beats any allow no matter where the allow sits.
// 3. Otherwise the first matching allow wins.
// 4. Otherwise a default allow ("no policy matched", AW-DEFAULT-ALLOW).
// 5. Any evaluation error stops the walk and becomes a hard deny tagged
//    AW-FAIL-CLOSE. An exception must never leak to the caller — that
//    would leave an ambiguous "maybe allowed" state.
//
// Every decision is handed to the registered sinks before being returned.
// Sink failures are surfaced through tracing but never block the return:
// audit is advisory, adjudication is not.

use std::sync::Arc;

use crate::action::Action;
use crate::decision::Decision;
use crate::error::{FailCloseError, RegistryError};
use crate::evaluator::PolicyEvaluator;
use crate::hints;
use crate::policy::FAIL_CLOSE_POLICY_ID;
use crate::registry::PolicyRegistry;

/// Boxed error for sink implementations.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// A consumer of finalized decisions (audit trail, decision log).
///
/// Implementations take `&self` so one sink can be shared between the
/// engine and a querying caller via `Arc`. They must never block
/// adjudication for long — `record` runs on the evaluation path.
pub trait DecisionSink: Send + Sync {
    fn record(&self, decision: &Decision, action: &Action) -> Result<(), SinkError>;
}

/// The policy engine — adjudicates every proposed action against the
/// frozen rule set.
pub struct PolicyEngine {
    registry: PolicyRegistry,
    evaluator: PolicyEvaluator,
    sinks: Vec<Arc<dyn DecisionSink>>,
}

impl PolicyEngine {
    /// Build an engine around an explicitly-owned registry.
    ///
    /// Loads the registry eagerly: an engine must never start without a
    /// complete, validated rule set, so a load failure is a construction
    /// failure — not something to discover per action.
    pub fn new(registry: PolicyRegistry) -> Result<Self, RegistryError> {
        registry.load()?;
        Ok(Self {
            registry,
            evaluator: PolicyEvaluator::new(),
            sinks: Vec::new(),
        })
    }

    /// Attach a decision sink (builder pattern). Sinks are notified in
    /// attachment order for every decision the engine returns.
    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// The registry this engine adjudicates against.
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Adjudicate one action. Total: always exactly one Decision.
    pub fn evaluate(&self, action: &Action) -> Decision {
        let policies = match self.registry.policies() {
            Some(policies) => policies,
            // Unreachable given the eager load in new(), but an impossible
            // state still resolves toward deny, never allow.
            None => return self.finish(action, Decision::fail_close_unloaded(action)),
        };

        let mut first_allow: Option<Decision> = None;

        for policy in policies {
            match self.evaluator.evaluate(action, policy) {
                Ok(Some(decision)) if decision.is_denied() => {
                    tracing::info!(
                        policy_id = %policy.id,
                        action_id = %action.action_id,
                        action_type = %action.action_type,
                        "action denied"
                    );
                    return self.finish(action, decision);
                }
                Ok(Some(decision)) => {
                    if first_allow.is_none() {
                        first_allow = Some(decision);
                    }
                    // Keep scanning: a later deny still overrides.
                }
                Ok(None) => {}
                Err(source) => {
                    let failure = FailCloseError {
                        policy_id: policy.id.clone(),
                        source,
                    };
                    tracing::error!(
                        policy_id = %policy.id,
                        action_id = %action.action_id,
                        "evaluation failed, failing closed: {}",
                        failure
                    );
                    let decision = Decision::fail_close(
                        action,
                        &failure,
                        hints::replan_hint(FAIL_CLOSE_POLICY_ID),
                    );
                    return self.finish(action, decision);
                }
            }
        }

        let decision = first_allow.unwrap_or_else(|| Decision::default_allow(action));
        tracing::debug!(
            policy_id = %decision.policy_id,
            action_id = %action.action_id,
            "action allowed"
        );
        self.finish(action, decision)
    }

    /// Hand the decision to every sink, then return it. A sink failure is
    /// surfaced but must not block the decision.
    fn finish(&self, action: &Action, decision: Decision) -> Decision {
        for sink in &self.sinks {
            if let Err(e) = sink.record(&decision, action) {
                tracing::error!(
                    decision_id = %decision.decision_id,
                    "decision sink error: {}",
                    e
                );
            }
        }
        decision
    }
}
