//! Attribute types for ABAC evaluation.
//!
//! Four independent namespaces drive access decisions:
//! - **Subject**: who is asking (name, roles, clearance, ...)
//! - **Resource**: what is being accessed (owner, classification, path, ...)
//! - **Action**: what is being done (method, scope, ...)
//! - **Context**: free-form request environment (client IP, time, ...)
//!
//! Attribute values are arbitrary JSON. Rules address nested values with an
//! [`AttributePath`].

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

// ============================================================================
// Namespace
// ============================================================================

/// One of the four attribute namespaces of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Subject,
    Resource,
    Action,
    Context,
}

impl Namespace {
    /// All namespaces, in evaluation order.
    pub const ALL: [Namespace; 4] = [
        Namespace::Subject,
        Namespace::Resource,
        Namespace::Action,
        Namespace::Context,
    ];

    /// Field name used in the policy JSON `rules` object.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Resource => "resource",
            Self::Action => "action",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Attribute Context
// ============================================================================

/// The attribute mappings of one access request.
///
/// Each namespace is held as a JSON object so that a bare condition can be
/// evaluated against the namespace as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeContext {
    subject: Value,
    resource: Value,
    action: Value,
    context: Value,
}

impl Default for AttributeContext {
    fn default() -> Self {
        Self::new(Map::new(), Map::new(), Map::new(), Map::new())
    }
}

impl AttributeContext {
    /// Creates a context from the four namespace mappings.
    pub fn new(
        subject: Map<String, Value>,
        resource: Map<String, Value>,
        action: Map<String, Value>,
        context: Map<String, Value>,
    ) -> Self {
        Self {
            subject: Value::Object(subject),
            resource: Value::Object(resource),
            action: Value::Object(action),
            context: Value::Object(context),
        }
    }

    /// Returns the mapping of a namespace, as a JSON object.
    pub fn namespace(&self, namespace: Namespace) -> &Value {
        match namespace {
            Namespace::Subject => &self.subject,
            Namespace::Resource => &self.resource,
            Namespace::Action => &self.action,
            Namespace::Context => &self.context,
        }
    }

    pub(crate) fn set_namespace(&mut self, namespace: Namespace, attributes: Map<String, Value>) {
        let slot = match namespace {
            Namespace::Subject => &mut self.subject,
            Namespace::Resource => &mut self.resource,
            Namespace::Action => &mut self.action,
            Namespace::Context => &mut self.context,
        };
        *slot = Value::Object(attributes);
    }

    /// Looks up an attribute by path within a namespace.
    pub fn get(&self, namespace: Namespace, path: &AttributePath) -> Option<&Value> {
        path.lookup(self.namespace(namespace))
    }
}

// ============================================================================
// Attribute Path
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A location inside a namespace mapping.
///
/// Written as `$.user.roles[0]` or, equivalently, `user.roles[0]`. Keys are
/// separated by `.`, array positions are written `[n]`. The bare root `$`
/// addresses the whole namespace mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    source: String,
    segments: Vec<Segment>,
}

/// Error returned when an attribute path cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid attribute path '{path}': {reason}")]
pub struct AttributePathError {
    pub path: String,
    pub reason: &'static str,
}

impl AttributePath {
    /// Parses an attribute path.
    pub fn parse(source: &str) -> Result<Self, AttributePathError> {
        let fail = |reason| AttributePathError {
            path: source.to_string(),
            reason,
        };

        let body = match source {
            "$" => "",
            s => s.strip_prefix("$.").unwrap_or(s),
        };
        if body.is_empty() && source != "$" {
            return Err(fail("path is empty"));
        }

        let mut segments = Vec::new();
        for part in body.split('.').filter(|_| !body.is_empty()) {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if key.is_empty() && rest.is_empty() {
                return Err(fail("empty key"));
            }
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            while !rest.is_empty() {
                let inner = rest.strip_prefix('[').ok_or_else(|| fail("expected '['"))?;
                let close = inner.find(']').ok_or_else(|| fail("unclosed '['"))?;
                let idx = inner[..close]
                    .parse::<usize>()
                    .map_err(|_| fail("array index must be a non-negative integer"))?;
                segments.push(Segment::Index(idx));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The path as written by the policy author.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolves the path against a JSON value. Returns `None` if any
    /// segment is missing or has the wrong container type.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |value, segment| match segment {
                Segment::Key(key) => value.as_object()?.get(key),
                Segment::Index(i) => value.as_array()?.get(*i),
            })
    }
}

impl FromStr for AttributePath {
    type Err = AttributePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for AttributePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

// ============================================================================
// Tests
// ============================================================================
