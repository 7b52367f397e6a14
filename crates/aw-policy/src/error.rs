// error.rs — Error taxonomy for the adjudication pipeline.
//
// Every failure path in the engine has an explicit name and an explicit
// effect, and every effect leans toward deny:
//
// - PolicyError::Denied     → expected outcome, a deny rule matched
// - EvaluationError         → unexpected failure matching ONE policy;
//                             the engine converts it to a fail-close deny
// - RegistryError           → fatal at load time; the engine refuses to start
// - ValidationError         → one malformed rule definition, surfaced
//                             through RegistryError during load
// - FailCloseError          → engine-internal wrapper around the original
//                             evaluation failure, rendered into the
//                             sentinel deny's reason
//
// No code path may resolve to allow by falling through an unhandled branch.

use std::path::PathBuf;
use thiserror::Error;

/// A single rule definition failed validation during registry load.
///
/// One bad definition fails the entire load (all-or-nothing): a partially
/// loaded policy set is worse than refusing to run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The definition could not be decoded into the expected shape at all.
    #[error("definition #{index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },

    /// A required field is absent or empty.
    #[error("definition #{index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// Severity must be exactly "allow" or "deny".
    #[error("policy '{id}': severity must be \"allow\" or \"deny\", got '{value}'")]
    InvalidSeverity { id: String, value: String },

    /// Policy ids carry a fixed reserved prefix (see [`crate::policy::POLICY_ID_PREFIX`]).
    #[error("policy id '{id}' does not match the required '{prefix}' id format")]
    InvalidId { id: String, prefix: &'static str },

    /// The id collides with an engine-owned sentinel id.
    #[error("policy id '{id}' is reserved for engine use and cannot be declared")]
    ReservedId { id: String },

    /// An accidentally empty conditions block must not become a match-all.
    #[error("policy '{id}' declares no conditions; use 'always: true' for an unconditional rule")]
    EmptyConditions { id: String },

    /// A condition key was recognized but its value has the wrong shape.
    #[error("policy '{id}': condition '{key}' is malformed: {reason}")]
    InvalidCondition {
        id: String,
        key: String,
        reason: String,
    },
}

/// Fatal load-time failure — the registry cannot be constructed, and the
/// engine must never start without one.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The configured rule source does not exist.
    #[error("rule source not found at {path}")]
    SourceMissing { path: PathBuf },

    /// The rule source exists but could not be read.
    #[error("failed to read rule source at {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The source parsed but yielded zero rule definitions.
    #[error("rule source contains no rule definitions")]
    EmptySource,

    /// The source is not a valid YAML sequence of rule definitions.
    #[error("rule source is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One definition failed validation (fails the whole load).
    #[error("invalid rule definition: {0}")]
    Definition(#[from] ValidationError),

    /// Two definitions share an id. Rule precedence is positional, so a
    /// duplicate id would make decisions ambiguous on replay.
    #[error("duplicate policy id '{id}'")]
    DuplicateId { id: String },

    /// `get_by_id` lookup miss.
    #[error("no policy with id '{id}'")]
    PolicyNotFound { id: String },
}

/// Unexpected failure while matching one policy against one action.
///
/// These must always propagate to the engine — never be swallowed — so the
/// engine can convert them into a fail-close deny.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A `target_regex` pattern failed to compile.
    #[error("invalid target pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// A `metadata_gt` condition hit a value that is not a number.
    /// Silent coercion here would be a silent-allow bug, so it is an error.
    #[error("metadata key '{key}' holds non-numeric value '{value}'")]
    MetadataNotNumeric { key: String, value: String },
}

/// The engine-internal catch-all: an evaluation failure wrapped with the
/// policy that was being evaluated when it happened. The engine converts
/// this into a hard deny tagged with the fail-close sentinel id; it never
/// leaks to the caller as an error.
#[derive(Debug, Error)]
#[error("fail-closed while evaluating policy '{policy_id}': {source}")]
pub struct FailCloseError {
    pub policy_id: String,
    #[source]
    pub source: EvaluationError,
}

/// Top-level error for callers that consume decisions through `Result`
/// flow (see [`crate::decision::Decision::authorize`]).
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A deny policy matched as designed. Not necessarily a defect —
    /// this is the adjudication layer doing its job.
    #[error("action denied by policy '{policy_id}': {reason}")]
    Denied {
        policy_id: String,
        reason: String,
        suggestion: Option<String>,
    },

    /// Evaluation of one policy failed unexpectedly.
    #[error("policy evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// The registry could not be loaded.
    #[error("policy registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An evaluation failure already converted to a fail-close denial.
    #[error(transparent)]
    FailClose(#[from] FailCloseError),
}
