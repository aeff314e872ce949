//! ABAC policy definitions.
//!
//! A policy bundles a [`Target`] filter, a [`Rule`] over request attributes,
//! an [`Effect`], and a priority. Policies are immutable; an update replaces
//! the whole policy.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::request::AccessRequest;
use crate::rule::{self, Rule};
use crate::target::{self, Target};
use crate::validation::{InputKind, ValidationError, Violations};

// ============================================================================
// Effect
// ============================================================================

/// The effect of a policy: allow or deny access.
///
/// Defaults to `Deny` (deny unless explicitly allowed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Deny access.
    #[default]
    Deny,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Policy
// ============================================================================

/// An Attribute-Based Access Control policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Policy {
    uid: String,
    description: String,
    rules: Rule,
    targets: Target,
    effect: Effect,
    priority: u64,
}

impl Policy {
    /// Creates a policy that applies to every request, with priority 0.
    pub fn new(uid: impl Into<String>, effect: Effect) -> Result<Self, ValidationError> {
        let uid = uid.into();
        let mut violations = Violations::new();
        violations.check_id("uid", Some(&uid));
        violations.finish(
            InputKind::Policy,
            Some(Self {
                uid,
                description: String::new(),
                rules: Rule::any(),
                targets: Target::any(),
                effect,
                priority: 0,
            }),
        )
    }

    /// Sets the attribute rule (builder pattern).
    pub fn with_rules(mut self, rules: Rule) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the target filter (builder pattern).
    pub fn with_targets(mut self, targets: Target) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_priority(mut self, priority: u64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parses and validates a policy from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let draft: PolicyDraft =
            serde_json::from_str(json).map_err(|source| ValidationError::Malformed {
                kind: InputKind::Policy,
                source,
            })?;
        draft.validate()
    }

    /// Parses and validates a policy from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let draft: PolicyDraft =
            serde_json::from_value(value).map_err(|source| ValidationError::Malformed {
                kind: InputKind::Policy,
                source,
            })?;
        draft.validate()
    }

    /// Serializes the policy to JSON text that [`Policy::from_json`] accepts.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Serializes the policy to a JSON value.
    pub fn to_value(&self) -> Value {
        // A policy is plain data with string keys; serializing it cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rules(&self) -> &Rule {
        &self.rules
    }

    pub fn targets(&self) -> &Target {
        &self.targets
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn priority(&self) -> u64 {
        self.priority
    }

    /// Returns `true` if the policy applies to the request: the targets match
    /// its identifiers and the rule holds over its attributes.
    pub fn fits(&self, request: &AccessRequest) -> bool {
        let fits = self.targets.matches(
            request.subject_id(),
            request.resource_id(),
            request.action_id(),
        ) && self.rules.is_satisfied(request.attributes());
        tracing::trace!(uid = %self.uid, fits, "policy applicability");
        fits
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }
}

impl<'de> Deserialize<'de> for Policy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Draft
// ============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDraft {
    uid: Option<String>,
    #[serde(default)]
    description: String,
    rules: Option<Value>,
    targets: Option<Value>,
    effect: Option<String>,
    priority: Option<Number>,
}

impl PolicyDraft {
    fn validate(self) -> Result<Policy, ValidationError> {
        let mut violations = Violations::new();

        violations.check_id("uid", self.uid.as_deref());

        let rules = match &self.rules {
            Some(value) => rule::parse_rule(value, "rules", &mut violations),
            None => {
                violations.push("rules", "is required");
                None
            }
        };

        let targets = match &self.targets {
            Some(value) => target::parse_target(value, "targets", &mut violations),
            None => {
                violations.push("targets", "is required");
                None
            }
        };

        let effect = match self.effect.as_deref() {
            Some(effect) => Effect::parse(effect).or_else(|| {
                violations.push("effect", "must be one of: allow, deny");
                None
            }),
            None => {
                violations.push("effect", "is required");
                None
            }
        };

        let priority = match &self.priority {
            None => Some(0),
            Some(n) => n.as_u64().or_else(|| {
                let message = format!("must be a non-negative integer, got {n}");
                violations.push("priority", message);
                None
            }),
        };

        let policy = match (self.uid, rules, targets, effect, priority) {
            (Some(uid), Some(rules), Some(targets), Some(effect), Some(priority)) => {
                Some(Policy {
                    uid,
                    description: self.description,
                    rules,
                    targets,
                    effect,
                    priority,
                })
            }
            _ => None,
        };
        violations.finish(InputKind::Policy, policy)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Namespace;
    use crate::condition::Condition;
    use serde_json::{Map, json};

    fn admin_policy() -> Value {
        json!({
            "uid": "admin-read",
            "description": "Admins can read documents",
            "rules": {
                "subject": {"$.roles": {"condition": "AnyIn", "values": ["admin"]}},
                "context": {"$.ip": {"condition": "CIDR", "value": "10.0.0.0/8"}},
            },
            "targets": {"resource_id": "/docs/*", "action_id": ["read", "list"]},
            "effect": "allow",
            "priority": 5,
        })
    }

    fn request(subject: Value, context: Value) -> AccessRequest {
        let object = |v: Value| match v {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        };
        AccessRequest::new("alice", "/docs/1", "read")
            .unwrap()
            .with_attributes(Namespace::Subject, object(subject))
            .with_attributes(Namespace::Context, object(context))
    }

    #[test]
    fn test_default_effect_is_deny() {
        assert_eq!(Effect::default(), Effect::Deny);
    }

    #[test]
    fn test_parse_policy() {
        let policy = Policy::from_value(admin_policy()).unwrap();
        assert_eq!(policy.uid(), "admin-read");
        assert_eq!(policy.description(), "Admins can read documents");
        assert_eq!(policy.effect(), Effect::Allow);
        assert_eq!(policy.priority(), 5);
        assert!(policy.is_allowed());
        assert_eq!(policy.targets().subject_id.as_slice(), ["*"]);
    }

    #[test]
    fn test_defaults() {
        let policy = Policy::from_json(
            r#"{"uid": "p", "rules": {}, "targets": {}, "effect": "deny"}"#,
        )
        .unwrap();
        assert_eq!(policy.description(), "");
        assert_eq!(policy.priority(), 0);
        assert_eq!(policy.rules(), &Rule::any());
        assert_eq!(policy.targets(), &Target::any());
        assert!(!policy.is_allowed());
    }

    #[test]
    fn test_fits() {
        let policy = Policy::from_value(admin_policy()).unwrap();

        let admin_inside = request(json!({"roles": ["admin"]}), json!({"ip": "10.1.2.3"}));
        let admin_outside = request(json!({"roles": ["admin"]}), json!({"ip": "8.8.8.8"}));
        let dev_inside = request(json!({"roles": ["dev"]}), json!({"ip": "10.1.2.3"}));
        assert!(policy.fits(&admin_inside));
        assert!(!policy.fits(&admin_outside));
        assert!(!policy.fits(&dev_inside));

        let wrong_action = AccessRequest::new("alice", "/docs/1", "delete").unwrap();
        assert!(!policy.fits(&wrong_action));
    }

    #[test]
    fn test_fits_is_idempotent() {
        let policy = Policy::from_value(admin_policy()).unwrap();
        let req = request(json!({"roles": ["admin"]}), json!({"ip": "10.1.2.3"}));
        let before = policy.clone();
        assert_eq!(policy.fits(&req), policy.fits(&req));
        assert_eq!(policy, before);
    }

    #[test]
    fn test_every_violation_is_reported() {
        let err = Policy::from_value(json!({
            "uid": "u".repeat(401),
            "rules": {"subject": {"condition": "AllOf", "values": []}},
            "targets": {"subject_id": []},
            "effect": "maybe",
            "priority": -1,
        }))
        .unwrap_err();

        assert_eq!(err.kind(), InputKind::Policy);
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "uid",
                "rules.subject.values",
                "targets.subject_id",
                "effect",
                "priority",
            ]
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let err = Policy::from_value(json!({})).unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["uid", "rules", "targets", "effect"]);
    }

    #[test]
    fn test_unknown_field_is_malformed() {
        let mut value = admin_policy();
        value["owner"] = json!("x");
        let err = Policy::from_value(value).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { .. }));
    }

    #[test]
    fn test_builder_validates_uid() {
        assert!(Policy::new("", Effect::Allow).is_ok());
        assert!(Policy::new("x".repeat(401), Effect::Allow).is_err());

        let policy = Policy::new("p1", Effect::Deny)
            .unwrap()
            .with_priority(3)
            .with_description("block")
            .with_targets(Target::new("*", "/secret/*", "*"))
            .with_rules(Rule::any().with(Namespace::Subject, Condition::Exists));
        assert_eq!(policy.priority(), 3);
        assert_eq!(policy.effect(), Effect::Deny);
    }

    #[test]
    fn test_empty_uid_and_ids_evaluate() {
        let policy = Policy::from_value(json!({
            "uid": "",
            "rules": {"subject": {"$.name": {"condition": "Equals", "value": "alice"}}},
            "targets": {},
            "effect": "allow",
        }))
        .unwrap();
        assert_eq!(policy.uid(), "");

        let req = AccessRequest::from_value(json!({
            "subject": {"id": "", "attributes": {"name": "alice"}},
            "resource": {"id": ""},
            "action": {"id": ""},
        }))
        .unwrap();
        assert!(policy.fits(&req));
    }

    #[test]
    fn test_json_roundtrip_preserves_behavior() {
        let policy = Policy::from_value(admin_policy()).unwrap();
        let parsed = Policy::from_json(&policy.to_json()).unwrap();
        assert_eq!(parsed, policy);

        let via_serde: Policy = serde_json::from_value(policy.to_value()).unwrap();
        assert_eq!(via_serde, policy);

        let req = request(json!({"roles": ["admin"]}), json!({"ip": "10.9.9.9"}));
        assert_eq!(parsed.fits(&req), policy.fits(&req));
        let empty = AccessRequest::new("a", "b", "c")
            .unwrap()
            .with_attributes(Namespace::Subject, Map::new());
        assert_eq!(parsed.fits(&empty), policy.fits(&empty));
    }
}
