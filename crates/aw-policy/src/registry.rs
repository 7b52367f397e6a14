// registry.rs — The immutable policy registry and its loader.
//
// The registry is the only component that performs I/O, and it does so
// exactly once: `load()` parses and validates the whole rule source, and
// either the complete validated set becomes visible or none of it does.
// After the first successful load the set is frozen for the process
// lifetime; later `load()` calls return the cached set, so it is safe to
// call from multiple sites and from concurrent callers.
//
// There is deliberately no global registry cache — callers construct a
// registry and hand it to the engine at construction time.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::condition::Condition;
use crate::error::{RegistryError, ValidationError};
use crate::policy::{
    is_valid_policy_id, Policy, Severity, POLICY_ID_PREFIX, RESERVED_POLICY_IDS,
};

/// The default rule set shipped with the crate, compiled into the binary
/// so `RuleSource::Builtin` needs no filesystem at all.
const BUILTIN_RULES: &str = include_str!("../rules/builtin.yaml");

/// Where rule definitions come from.
#[derive(Debug, Clone)]
pub enum RuleSource {
    /// The compiled-in default rule set.
    Builtin,
    /// A YAML file on disk.
    Path(PathBuf),
    /// Inline YAML text (configs, tests).
    Yaml(String),
}

/// Raw shape of one rule definition before validation. Fields are
/// optional here so missing ones surface as precise validation errors
/// rather than opaque decode failures.
#[derive(Debug, Deserialize)]
struct RuleDefinition {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    #[serde(default)]
    conditions: BTreeMap<String, serde_yaml::Value>,
}

/// Loads the full rule set once, validates shape and uniqueness, and
/// exposes a read-only ordered view. Load order is decision order.
#[derive(Debug)]
pub struct PolicyRegistry {
    source: RuleSource,
    policies: OnceLock<Vec<Policy>>,
}

impl PolicyRegistry {
    /// Create a registry over the given source. No I/O happens here;
    /// call [`PolicyRegistry::load`] (the engine constructor does).
    pub fn new(source: RuleSource) -> Self {
        Self {
            source,
            policies: OnceLock::new(),
        }
    }

    /// Registry over the compiled-in default rule set.
    pub fn builtin() -> Self {
        Self::new(RuleSource::Builtin)
    }

    /// Load, validate, and freeze the rule set.
    ///
    /// Load-once semantics: the first successful call freezes the set and
    /// every later call returns it unchanged. A failed load freezes
    /// nothing, so it can be retried (e.g. after fixing the source file).
    pub fn load(&self) -> Result<&[Policy], RegistryError> {
        if let Some(policies) = self.policies.get() {
            return Ok(policies);
        }
        let parsed = self.parse_source()?;
        // Two concurrent first loads may both parse; get_or_init keeps
        // whichever published first and drops the other, so callers can
        // never observe a partially loaded or mixed set.
        Ok(self.policies.get_or_init(|| parsed))
    }

    /// The frozen view, if a load has succeeded.
    pub fn policies(&self) -> Option<&[Policy]> {
        self.policies.get().map(Vec::as_slice)
    }

    /// Defensive copy of the full rule set (loading first if needed).
    pub fn get_all(&self) -> Result<Vec<Policy>, RegistryError> {
        Ok(self.load()?.to_vec())
    }

    /// Look up one policy by id (loading first if needed).
    pub fn get_by_id(&self, id: &str) -> Result<Policy, RegistryError> {
        self.load()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RegistryError::PolicyNotFound { id: id.to_string() })
    }

    fn parse_source(&self) -> Result<Vec<Policy>, RegistryError> {
        let text = match &self.source {
            RuleSource::Builtin => BUILTIN_RULES.to_string(),
            RuleSource::Yaml(text) => text.clone(),
            RuleSource::Path(path) => {
                if !path.exists() {
                    return Err(RegistryError::SourceMissing { path: path.clone() });
                }
                fs::read_to_string(path).map_err(|source| RegistryError::SourceUnreadable {
                    path: path.clone(),
                    source,
                })?
            }
        };

        if text.trim().is_empty() {
            return Err(RegistryError::EmptySource);
        }

        let raw: Vec<serde_yaml::Value> = serde_yaml::from_str(&text)?;
        if raw.is_empty() {
            return Err(RegistryError::EmptySource);
        }

        let mut policies = Vec::with_capacity(raw.len());
        let mut seen_ids: HashSet<String> = HashSet::with_capacity(raw.len());

        for (index, value) in raw.into_iter().enumerate() {
            let definition: RuleDefinition =
                serde_yaml::from_value(value).map_err(|e| ValidationError::Malformed {
                    index,
                    reason: e.to_string(),
                })?;
            let policy = validate_definition(index, definition)?;
            if !seen_ids.insert(policy.id.clone()) {
                return Err(RegistryError::DuplicateId { id: policy.id });
            }
            policies.push(policy);
        }

        Ok(policies)
    }
}

/// Validate one decoded definition into a Policy.
fn validate_definition(
    index: usize,
    definition: RuleDefinition,
) -> Result<Policy, RegistryError> {
    let id = required(index, "id", definition.id)?;
    if !is_valid_policy_id(&id) {
        return Err(ValidationError::InvalidId {
            id,
            prefix: POLICY_ID_PREFIX,
        }
        .into());
    }
    if RESERVED_POLICY_IDS.contains(&id.as_str()) {
        return Err(ValidationError::ReservedId { id }.into());
    }

    let name = required(index, "name", definition.name)?;
    let description = required(index, "description", definition.description)?;

    let severity = match required(index, "severity", definition.severity)?.as_str() {
        "allow" => Severity::Allow,
        "deny" => Severity::Deny,
        other => {
            return Err(ValidationError::InvalidSeverity {
                id,
                value: other.to_string(),
            }
            .into())
        }
    };

    if definition.conditions.is_empty() {
        return Err(ValidationError::EmptyConditions { id }.into());
    }

    let mut conditions = Vec::with_capacity(definition.conditions.len());
    for (key, value) in &definition.conditions {
        let condition =
            Condition::parse(key, value).map_err(|reason| ValidationError::InvalidCondition {
                id: id.clone(),
                key: key.clone(),
                reason,
            })?;
        if let Condition::Unrecognized { key } = &condition {
            tracing::warn!(
                policy_id = %id,
                condition_key = %key,
                "unrecognized condition key; this policy can never match"
            );
        }
        conditions.push(condition);
    }

    Ok(Policy {
        id,
        name,
        description,
        severity,
        conditions,
    })
}

fn required(
    index: usize,
    field: &'static str,
    value: Option<String>,
) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField { index, field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_RULES: &str = r#"
- id: AW-TEST-001
  name: test-deny
  description: test writes are forbidden
  severity: deny
  conditions:
    action_type: file.write
- id: AW-TEST-002
  name: test-allow
  description: test reads are fine
  severity: allow
  conditions:
    action_type: file.read
"#;

    #[test]
    fn load_parses_valid_rules_in_order() {
        let registry = PolicyRegistry::new(RuleSource::Yaml(VALID_RULES.to_string()));
        let policies = registry.load().unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0].id, "AW-TEST-001");
        assert_eq!(policies[0].severity, Severity::Deny);
        assert_eq!(policies[1].id, "AW-TEST-002");
        assert_eq!(policies[1].severity, Severity::Allow);
    }

    #[test]
    fn load_is_idempotent() {
        let registry = PolicyRegistry::new(RuleSource::Yaml(VALID_RULES.to_string()));
        let first: Vec<Policy> = registry.load().unwrap().to_vec();
        let second: Vec<Policy> = registry.load().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn builtin_rule_set_loads() {
        let registry = PolicyRegistry::builtin();
        let policies = registry.load().unwrap();
        assert!(!policies.is_empty());
        // Deny rules precede the baseline allows.
        assert!(policies[0].is_deny());
        assert!(policies.iter().any(|p| p.id == "AW-GOV-001"));
        assert!(policies.iter().any(|p| !p.is_deny()));
    }

    #[test]
    fn get_by_id_finds_and_misses() {
        let registry = PolicyRegistry::new(RuleSource::Yaml(VALID_RULES.to_string()));
        assert_eq!(registry.get_by_id("AW-TEST-001").unwrap().name, "test-deny");
        assert!(matches!(
            registry.get_by_id("AW-NOPE-001"),
            Err(RegistryError::PolicyNotFound { .. })
        ));
    }

    #[test]
    fn get_all_returns_a_defensive_copy() {
        let registry = PolicyRegistry::new(RuleSource::Yaml(VALID_RULES.to_string()));
        let mut copy = registry.get_all().unwrap();
        copy.clear();
        // Mutating the copy must not touch the frozen set.
        assert_eq!(registry.load().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_id_fails_the_whole_load() {
        let yaml = r#"
- id: AW-DUP-001
  name: first
  description: first rule
  severity: deny
  conditions:
    always: true
- id: AW-DUP-001
  name: second
  description: second rule
  severity: allow
  conditions:
    always: true
"#;
        let registry = PolicyRegistry::new(RuleSource::Yaml(yaml.to_string()));
        assert!(matches!(
            registry.load(),
            Err(RegistryError::DuplicateId { ref id }) if id == "AW-DUP-001"
        ));
        // Atomicity: nothing became visible.
        assert!(registry.policies().is_none());
    }

    #[test]
    fn one_malformed_definition_leaves_zero_policies_visible() {
        let yaml = r#"
- id: AW-OK-001
  name: fine
  description: a fine rule
  severity: deny
  conditions:
    always: true
- id: AW-BAD-001
  name: broken
  description: missing severity
  conditions:
    always: true
"#;
        let registry = PolicyRegistry::new(RuleSource::Yaml(yaml.to_string()));
        assert!(matches!(
            registry.load(),
            Err(RegistryError::Definition(ValidationError::MissingField {
                field: "severity",
                ..
            }))
        ));
        assert!(registry.policies().is_none());
        assert!(registry.get_all().is_err());
    }

    #[test]
    fn invalid_severity_fails_load() {
        let yaml = r#"
- id: AW-SEV-001
  name: maybe
  description: severity must be allow or deny
  severity: audit
  conditions:
    always: true
"#;
        let registry = PolicyRegistry::new(RuleSource::Yaml(yaml.to_string()));
        assert!(matches!(
            registry.load(),
            Err(RegistryError::Definition(
                ValidationError::InvalidSeverity { ref value, .. }
            )) if value == "audit"
        ));
    }

    #[test]
    fn id_without_reserved_prefix_fails_load() {
        let yaml = r#"
- id: GOV-001
  name: unprefixed
  description: bad id
  severity: deny
  conditions:
    always: true
"#;
        let registry = PolicyRegistry::new(RuleSource::Yaml(yaml.to_string()));
        assert!(matches!(
            registry.load(),
            Err(RegistryError::Definition(ValidationError::InvalidId { .. }))
        ));
    }

    #[test]
    fn reserved_sentinel_ids_cannot_be_declared() {
        let yaml = r#"
- id: AW-FAIL-CLOSE
  name: impostor
  description: tries to claim the sentinel
  severity: allow
  conditions:
    always: true
"#;
        let registry = PolicyRegistry::new(RuleSource::Yaml(yaml.to_string()));
        assert!(matches!(
            registry.load(),
            Err(RegistryError::Definition(ValidationError::ReservedId { .. }))
        ));
    }

    #[test]
    fn empty_conditions_fail_load() {
        let yaml = r#"
- id: AW-EMPTY-001
  name: vacuous
  description: no conditions declared
  severity: deny
  conditions: {}
"#;
        let registry = PolicyRegistry::new(RuleSource::Yaml(yaml.to_string()));
        assert!(matches!(
            registry.load(),
            Err(RegistryError::Definition(
                ValidationError::EmptyConditions { .. }
            ))
        ));
    }

    #[test]
    fn empty_source_fails_load() {
        let registry = PolicyRegistry::new(RuleSource::Yaml("".to_string()));
        assert!(matches!(registry.load(), Err(RegistryError::EmptySource)));

        let registry = PolicyRegistry::new(RuleSource::Yaml("[]".to_string()));
        assert!(matches!(registry.load(), Err(RegistryError::EmptySource)));
    }

    #[test]
    fn missing_file_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let registry =
            PolicyRegistry::new(RuleSource::Path(dir.path().join("does-not-exist.yaml")));
        assert!(matches!(
            registry.load(),
            Err(RegistryError::SourceMissing { .. })
        ));
    }

    #[test]
    fn loads_rules_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(VALID_RULES.as_bytes()).unwrap();

        let registry = PolicyRegistry::new(RuleSource::Path(path));
        assert_eq!(registry.load().unwrap().len(), 2);
    }

    #[test]
    fn unrecognized_condition_key_loads_but_never_matches() {
        let yaml = r#"
- id: AW-FUT-001
  name: future-operator
  description: uses an operator this engine does not know
  severity: deny
  conditions:
    target_glob: "src/**"
"#;
        let registry = PolicyRegistry::new(RuleSource::Yaml(yaml.to_string()));
        let policies = registry.load().unwrap();
        assert_eq!(policies.len(), 1);
        assert!(matches!(
            policies[0].conditions[0],
            Condition::Unrecognized { .. }
        ));
    }
}
