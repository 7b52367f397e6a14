//! # aw-policy
//!
//! Fail-closed action adjudication for ActionWarden.
//!
//! Every operation an agent proposes — file writes, version-control
//! pushes, tool invocations — is described as an [`Action`] and must pass
//! through [`PolicyEngine::evaluate`] before execution. The engine checks
//! the action against an immutable, load-once rule set and returns
//! exactly one [`Decision`].
//!
//! ## Key invariants
//!
//! - **Deny-overrides**: the first matching deny policy wins outright,
//!   no matter how many allow policies also match.
//! - **Fail-closed**: any failure inside evaluation becomes a hard deny
//!   tagged `AW-FAIL-CLOSE` — never an exception, never a silent allow.
//! - **Deterministic**: the same action against the same rule set yields
//!   the same decision content (only `decision_id`/`timestamp` differ).
//! - **Actionable denial**: every deny carries a non-empty reason, and
//!   denials from the built-in rules carry a replan suggestion.
//!
//! ## Quick example
//!
//! ```rust
//! use aw_policy::{Action, ActionMetadata, PolicyEngine, PolicyRegistry};
//!
//! let engine = PolicyEngine::new(PolicyRegistry::builtin()).unwrap();
//! let action = Action::create(
//!     "file.write",
//!     ".github/workflows/ci.yml",
//!     ActionMetadata::new(),
//! );
//! let decision = engine.evaluate(&action);
//! assert!(decision.is_denied());
//! assert!(decision.suggestion.is_some());
//! ```

pub mod action;
pub mod condition;
pub mod decision;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod hints;
pub mod policy;
pub mod registry;

// Re-export the main types at the crate root for convenience.
pub use action::{Action, ActionMetadata};
pub use condition::Condition;
pub use decision::{ActionSnapshot, Decision, DecisionContract, DecisionSeverity, Verdict};
pub use engine::{DecisionSink, PolicyEngine, SinkError};
pub use error::{
    EvaluationError, FailCloseError, PolicyError, RegistryError, ValidationError,
};
pub use evaluator::PolicyEvaluator;
pub use hints::{replan_hint, ReplanHint};
pub use policy::{
    Policy, Severity, DEFAULT_ALLOW_POLICY_ID, FAIL_CLOSE_POLICY_ID, POLICY_ID_PREFIX,
};
pub use registry::{PolicyRegistry, RuleSource};
