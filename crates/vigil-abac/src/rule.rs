//! Rules bind condition trees to attribute namespaces.
//!
//! Each of the four namespaces carries a [`NamespaceRule`]; a [`Rule`] holds
//! when all four do. An omitted namespace is unrestricted.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::attributes::{AttributeContext, AttributePath, Namespace};
use crate::condition::{self, Condition};
use crate::validation::{self, Violations};

// ============================================================================
// Attribute Map
// ============================================================================

/// A conjunction of per-attribute conditions, e.g.
/// `{"$.roles": {"condition": "AnyIn", "values": ["admin"]}}`.
///
/// Entries are evaluated in attribute path order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeMap {
    entries: Vec<(AttributePath, Condition)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition on the attribute at `path`.
    pub fn with(mut self, path: AttributePath, condition: Condition) -> Self {
        self.entries.push((path, condition));
        self
    }

    pub fn entries(&self) -> &[(AttributePath, Condition)] {
        &self.entries
    }

    /// Every entry holds against the value found at its path. An empty map
    /// holds vacuously.
    pub fn is_satisfied(&self, attributes: &Value) -> bool {
        self.entries
            .iter()
            .all(|(path, condition)| condition.is_satisfied(path.lookup(attributes)))
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, condition) in &self.entries {
            map.serialize_entry(path.as_str(), condition)?;
        }
        map.end()
    }
}

// ============================================================================
// Namespace Rule
// ============================================================================

/// The rule applied to one attribute namespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NamespaceRule {
    /// A condition evaluated against the whole namespace mapping.
    Condition(Condition),
    /// Per-attribute conditions, all of which must hold.
    Attributes(AttributeMap),
    /// Alternative attribute maps, at least one of which must hold.
    AnyOf(Vec<AttributeMap>),
}

impl Default for NamespaceRule {
    fn default() -> Self {
        Self::Condition(Condition::Any)
    }
}

impl From<Condition> for NamespaceRule {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

impl From<AttributeMap> for NamespaceRule {
    fn from(map: AttributeMap) -> Self {
        Self::Attributes(map)
    }
}

impl NamespaceRule {
    /// Evaluates the rule against one namespace mapping.
    pub fn is_satisfied(&self, attributes: &Value) -> bool {
        match self {
            Self::Condition(condition) => condition.is_satisfied(Some(attributes)),
            Self::Attributes(map) => map.is_satisfied(attributes),
            Self::AnyOf(maps) => maps.iter().any(|map| map.is_satisfied(attributes)),
        }
    }
}

// ============================================================================
// Rule
// ============================================================================

/// Namespace rules of a policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Rule {
    pub subject: NamespaceRule,
    pub resource: NamespaceRule,
    pub action: NamespaceRule,
    pub context: NamespaceRule,
}

impl Rule {
    /// A rule that holds for every request.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with(mut self, namespace: Namespace, rule: impl Into<NamespaceRule>) -> Self {
        *self.namespace_mut(namespace) = rule.into();
        self
    }

    pub fn namespace(&self, namespace: Namespace) -> &NamespaceRule {
        match namespace {
            Namespace::Subject => &self.subject,
            Namespace::Resource => &self.resource,
            Namespace::Action => &self.action,
            Namespace::Context => &self.context,
        }
    }

    fn namespace_mut(&mut self, namespace: Namespace) -> &mut NamespaceRule {
        match namespace {
            Namespace::Subject => &mut self.subject,
            Namespace::Resource => &mut self.resource,
            Namespace::Action => &mut self.action,
            Namespace::Context => &mut self.context,
        }
    }

    /// AND over the four namespaces, each against its own mapping.
    pub fn is_satisfied(&self, attributes: &AttributeContext) -> bool {
        Namespace::ALL
            .iter()
            .all(|&ns| self.namespace(ns).is_satisfied(attributes.namespace(ns)))
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses the `rules` object of a policy.
pub(crate) fn parse_rule(value: &Value, path: &str, violations: &mut Violations) -> Option<Rule> {
    let Some(object) = value.as_object() else {
        violations.push(path, "must be an object");
        return None;
    };

    let mut rule = Rule::default();
    let mut ok = true;
    for (key, raw) in object {
        let field = validation::field(path, key);
        let Some(namespace) = Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == key.as_str())
        else {
            violations.push(
                field,
                "unknown namespace, expected one of: subject, resource, action, context",
            );
            ok = false;
            continue;
        };
        match parse_namespace_rule(raw, &field, violations) {
            Some(parsed) => *rule.namespace_mut(namespace) = parsed,
            None => ok = false,
        }
    }

    ok.then_some(rule)
}

fn parse_namespace_rule(
    value: &Value,
    path: &str,
    violations: &mut Violations,
) -> Option<NamespaceRule> {
    match value {
        Value::Object(object) if object.contains_key("condition") => {
            condition::parse(value, path, violations).map(NamespaceRule::Condition)
        }
        Value::Object(_) => {
            parse_attribute_map(value, path, violations).map(NamespaceRule::Attributes)
        }
        Value::Array(items) => {
            if items.is_empty() {
                violations.push(path, "must contain at least one attribute map");
                return None;
            }
            let before = violations.len();
            let maps: Vec<AttributeMap> = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    parse_attribute_map(item, &validation::index(path, i), violations)
                })
                .collect();
            (maps.len() == items.len() && violations.len() == before)
                .then_some(NamespaceRule::AnyOf(maps))
        }
        Value::Null => {
            violations.push(path, "must be a condition or attribute map, not null");
            None
        }
        _ => {
            violations.push(path, "must be a condition or a list of attribute maps");
            None
        }
    }
}

fn parse_attribute_map(
    value: &Value,
    path: &str,
    violations: &mut Violations,
) -> Option<AttributeMap> {
    let Some(object) = value.as_object() else {
        violations.push(path, "must be an attribute map");
        return None;
    };

    let mut map = AttributeMap::new();
    let mut ok = true;
    for (key, raw) in object {
        let field = validation::field(path, key);
        let attribute = match AttributePath::parse(key) {
            Ok(attribute) => Some(attribute),
            Err(e) => {
                violations.push(field.clone(), e.reason);
                None
            }
        };
        let condition = condition::parse(raw, &field, violations);
        match (attribute, condition) {
            (Some(attribute), Some(condition)) => map.entries.push((attribute, condition)),
            _ => ok = false,
        }
    }

    ok.then_some(map)
}

// ============================================================================
// Tests
// ============================================================================
