//! Target filters over request identifiers.
//!
//! A [`Target`] narrows a policy to the subjects, resources, and actions it
//! can apply to, before any attribute condition is evaluated. Stores use the
//! same patterns to pre-select candidate policies.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::glob;
use crate::validation::{self, Violations};

/// One pattern or an ordered list of alternatives for a single identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Patterns {
    One(String),
    AnyOf(Vec<String>),
}

impl Default for Patterns {
    fn default() -> Self {
        Self::One(glob::WILDCARD.to_string())
    }
}

impl From<&str> for Patterns {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

impl From<Vec<&str>> for Patterns {
    fn from(patterns: Vec<&str>) -> Self {
        Self::AnyOf(patterns.into_iter().map(str::to_string).collect())
    }
}

impl Patterns {
    /// All patterns, in declaration order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(pattern) => std::slice::from_ref(pattern),
            Self::AnyOf(patterns) => patterns,
        }
    }

    /// OR across the patterns.
    pub fn matches(&self, id: &str) -> bool {
        self.as_slice().iter().any(|p| glob::matches(p, id))
    }
}

impl Serialize for Patterns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::One(pattern) => serializer.serialize_str(pattern),
            Self::AnyOf(patterns) => patterns.serialize(serializer),
        }
    }
}

/// Identifier filters of a policy. Omitted fields match every identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Target {
    pub subject_id: Patterns,
    pub resource_id: Patterns,
    pub action_id: Patterns,
}

impl Target {
    /// A target that matches every request.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new(
        subject_id: impl Into<Patterns>,
        resource_id: impl Into<Patterns>,
        action_id: impl Into<Patterns>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            resource_id: resource_id.into(),
            action_id: action_id.into(),
        }
    }

    /// AND across the three identifier fields.
    pub fn matches(&self, subject_id: &str, resource_id: &str, action_id: &str) -> bool {
        self.subject_id.matches(subject_id)
            && self.resource_id.matches(resource_id)
            && self.action_id.matches(action_id)
    }
}

const FIELDS: [&str; 3] = ["subject_id", "resource_id", "action_id"];

/// Parses the `targets` object of a policy.
pub(crate) fn parse_target(
    value: &Value,
    path: &str,
    violations: &mut Violations,
) -> Option<Target> {
    let Some(object) = value.as_object() else {
        violations.push(path, "must be an object");
        return None;
    };

    let mut ok = true;
    for key in object.keys().filter(|k| !FIELDS.contains(&k.as_str())) {
        violations.push(
            validation::field(path, key),
            "unknown target field, expected one of: subject_id, resource_id, action_id",
        );
        ok = false;
    }

    let [subject_id, resource_id, action_id] = FIELDS.map(|name| match object.get(name) {
        None => Some(Patterns::default()),
        Some(raw) => parse_patterns(raw, &validation::field(path, name), violations),
    });
    if !ok {
        return None;
    }

    Some(Target {
        subject_id: subject_id?,
        resource_id: resource_id?,
        action_id: action_id?,
    })
}

fn parse_patterns(value: &Value, path: &str, violations: &mut Violations) -> Option<Patterns> {
    match value {
        Value::String(pattern) => Some(Patterns::One(pattern.clone())),
        Value::Array(items) if items.is_empty() => {
            violations.push(path, "must contain at least one pattern");
            None
        }
        Value::Array(items) => {
            let mut patterns = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(pattern) => patterns.push(pattern.to_string()),
                    None => violations.push(validation::index(path, i), "must be a string"),
                }
            }
            (patterns.len() == items.len()).then_some(Patterns::AnyOf(patterns))
        }
        _ => {
            violations.push(path, "must be a pattern or a list of patterns");
            None
        }
    }
}
