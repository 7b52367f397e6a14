//! # aw-audit
//!
//! Decision logging and audit trail for ActionWarden.
//!
//! Every decision the policy engine returns can be recorded as a
//! [`DecisionRecord`]: the full decision contract plus the originating
//! action's identifying fields. Two sinks are provided — the append-only
//! JSONL [`DecisionLog`] with SHA-256 hash chaining for tamper evidence,
//! and the bounded in-memory [`AuditTrail`] for recent-history queries.
//! Both implement `aw_policy::DecisionSink`, so they attach directly to
//! the engine and stay off the adjudication critical path: a recording
//! failure is surfaced, never fatal.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aw_audit::AuditTrail;
//! use aw_policy::{Action, ActionMetadata, PolicyEngine, PolicyRegistry};
//!
//! let trail = Arc::new(AuditTrail::new(256));
//! let engine = PolicyEngine::new(PolicyRegistry::builtin())
//!     .unwrap()
//!     .with_sink(trail.clone());
//!
//! engine.evaluate(&Action::create("git.push", "refs/heads/main", ActionMetadata::new()));
//! assert_eq!(trail.get_denied().len(), 1);
//! ```

pub mod error;
pub mod hasher;
pub mod log;
pub mod record;
pub mod trail;

// Re-export the main types at the crate root for convenience.
pub use error::AuditError;
pub use log::DecisionLog;
pub use record::DecisionRecord;
pub use trail::AuditTrail;
