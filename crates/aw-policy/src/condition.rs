// condition.rs — The condition predicate language.
//
// Conditions are a CLOSED operator set, dispatched explicitly through this
// enum. Rule text is never executed as an expression — that is a security
// boundary, not a style choice. Within one policy all conditions are
// conjunctive: every listed condition must hold for the policy to match.
//
// Closed-world rule: a condition key this enum does not recognize parses
// into `Unrecognized`, which never matches. Combined with conjunction,
// an unknown key makes the whole policy inert instead of accidentally
// allowing (or accidentally blocking) unrelated actions.

use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;

use crate::action::Action;
use crate::error::EvaluationError;

/// One condition clause, parsed from a `condition-key: value` entry in a
/// rule definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// `action_type` — exact action-type match.
    ActionType { value: String },
    /// `action_type_prefix` — action-type starts with the value.
    ActionTypePrefix { value: String },
    /// `target` — exact target match.
    Target { value: String },
    /// `target_contains` — substring-in-target match.
    TargetContains { value: String },
    /// `target_regex` — regex match on the target. The pattern is kept as
    /// text and compiled at evaluation time; a malformed pattern is an
    /// evaluation error, which the engine fails closed on.
    TargetRegex { pattern: String },
    /// `metadata_present` — the metadata key exists.
    MetadataPresent { key: String },
    /// `metadata_equals` — the metadata key holds exactly this value.
    MetadataEquals { key: String, value: String },
    /// `metadata_gt` — the metadata key, read as a number, exceeds the
    /// threshold. A missing key reads as 0.
    MetadataGt { key: String, threshold: f64 },
    /// `metadata_in` — the metadata value is one of the listed values.
    MetadataIn { key: String, values: Vec<String> },
    /// `metadata_not_in` — the metadata value is none of the listed values.
    /// A missing key counts as "not in".
    MetadataNotIn { key: String, values: Vec<String> },
    /// `always` — unconditional match.
    Always,
    /// Any key outside the closed set. Never matches.
    Unrecognized { key: String },
}

impl Condition {
    /// Parse one `condition-key: value` entry.
    ///
    /// Recognized keys with a malformed value are an error (the registry
    /// fails the load); unrecognized keys parse into [`Condition::Unrecognized`]
    /// so that a rule authored against a future operator set degrades to
    /// "never matches" instead of failing closed-world safety.
    pub(crate) fn parse(key: &str, value: &Value) -> Result<Condition, String> {
        match key {
            "action_type" => Ok(Condition::ActionType {
                value: expect_string(value)?,
            }),
            "action_type_prefix" => Ok(Condition::ActionTypePrefix {
                value: expect_string(value)?,
            }),
            "target" => Ok(Condition::Target {
                value: expect_string(value)?,
            }),
            "target_contains" => Ok(Condition::TargetContains {
                value: expect_string(value)?,
            }),
            "target_regex" => Ok(Condition::TargetRegex {
                pattern: expect_string(value)?,
            }),
            "metadata_present" => Ok(Condition::MetadataPresent {
                key: expect_string(value)?,
            }),
            "metadata_equals" => {
                let key = expect_field_string(value, "key")?;
                let value = expect_field_string(value, "value")?;
                Ok(Condition::MetadataEquals { key, value })
            }
            "metadata_gt" => {
                let key = expect_field_string(value, "key")?;
                let threshold = expect_field_number(value, "threshold")?;
                Ok(Condition::MetadataGt { key, threshold })
            }
            "metadata_in" => {
                let key = expect_field_string(value, "key")?;
                let values = expect_field_string_list(value, "values")?;
                Ok(Condition::MetadataIn { key, values })
            }
            "metadata_not_in" => {
                let key = expect_field_string(value, "key")?;
                let values = expect_field_string_list(value, "values")?;
                Ok(Condition::MetadataNotIn { key, values })
            }
            "always" => match value.as_bool() {
                Some(true) => Ok(Condition::Always),
                Some(false) => Err("'always: false' is meaningless; remove the rule \
                                    or give it real conditions"
                    .to_string()),
                None => Err("expected a boolean".to_string()),
            },
            other => Ok(Condition::Unrecognized {
                key: other.to_string(),
            }),
        }
    }

    /// The rule-source key this condition was parsed from (for logging).
    pub fn key(&self) -> &str {
        match self {
            Condition::ActionType { .. } => "action_type",
            Condition::ActionTypePrefix { .. } => "action_type_prefix",
            Condition::Target { .. } => "target",
            Condition::TargetContains { .. } => "target_contains",
            Condition::TargetRegex { .. } => "target_regex",
            Condition::MetadataPresent { .. } => "metadata_present",
            Condition::MetadataEquals { .. } => "metadata_equals",
            Condition::MetadataGt { .. } => "metadata_gt",
            Condition::MetadataIn { .. } => "metadata_in",
            Condition::MetadataNotIn { .. } => "metadata_not_in",
            Condition::Always => "always",
            Condition::Unrecognized { key } => key,
        }
    }

    /// Check this condition against an action.
    ///
    /// Pure and deterministic. Errors must propagate — the engine turns
    /// them into a fail-close deny.
    pub fn matches(&self, action: &Action) -> Result<bool, EvaluationError> {
        match self {
            Condition::ActionType { value } => Ok(action.action_type == *value),
            Condition::ActionTypePrefix { value } => Ok(action.action_type.starts_with(value)),
            Condition::Target { value } => Ok(action.target == *value),
            Condition::TargetContains { value } => Ok(action.target.contains(value)),
            Condition::TargetRegex { pattern } => {
                let re = Regex::new(pattern).map_err(|source| EvaluationError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                Ok(re.is_match(&action.target))
            }
            Condition::MetadataPresent { key } => Ok(action.metadata.contains(key)),
            Condition::MetadataEquals { key, value } => {
                Ok(action.metadata.get(key) == Some(value.as_str()))
            }
            Condition::MetadataGt { key, threshold } => {
                Ok(action.metadata.numeric(key)? > *threshold)
            }
            Condition::MetadataIn { key, values } => Ok(action
                .metadata
                .get(key)
                .is_some_and(|v| values.iter().any(|allowed| allowed.as_str() == v))),
            Condition::MetadataNotIn { key, values } => Ok(action
                .metadata
                .get(key)
                .map_or(true, |v| !values.iter().any(|blocked| blocked.as_str() == v))),
            Condition::Always => Ok(true),
            Condition::Unrecognized { .. } => Ok(false),
        }
    }
}

fn expect_string(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "expected a non-empty string".to_string())
}

fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value, String> {
    let key = Value::String(name.to_string());
    value
        .as_mapping()
        .and_then(|m| m.get(&key))
        .ok_or_else(|| format!("expected a mapping with a '{}' field", name))
}

fn expect_field_string(value: &Value, name: &str) -> Result<String, String> {
    field(value, name)?
        .as_str()
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("field '{}' must be a non-empty string", name))
}

fn expect_field_number(value: &Value, name: &str) -> Result<f64, String> {
    field(value, name)?
        .as_f64()
        .ok_or_else(|| format!("field '{}' must be a number", name))
}

fn expect_field_string_list(value: &Value, name: &str) -> Result<Vec<String>, String> {
    let list = field(value, name)?
        .as_sequence()
        .ok_or_else(|| format!("field '{}' must be a list of strings", name))?;
    let mut values = Vec::with_capacity(list.len());
    for entry in list {
        values.push(
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("field '{}' must contain only strings", name))?,
        );
    }
    if values.is_empty() {
        return Err(format!("field '{}' must not be empty", name));
    }
    Ok(values)
}
