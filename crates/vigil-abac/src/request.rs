//! Access requests.
//!
//! An [`AccessRequest`] names the subject, resource, and action being
//! checked and carries their attributes plus a free-form context mapping.
//!
//! ```json
//! {
//!   "subject":  {"id": "alice", "attributes": {"roles": ["admin"]}},
//!   "resource": {"id": "/docs/42", "attributes": {"owner": "bob"}},
//!   "action":   {"id": "read"},
//!   "context":  {"ip": "10.0.0.7"}
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attributes::{AttributeContext, Namespace};
use crate::validation::{InputKind, ValidationError, Violations};

/// A validated access request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRequest {
    subject_id: String,
    resource_id: String,
    action_id: String,
    attributes: AttributeContext,
}

impl AccessRequest {
    /// Creates a request with empty attribute mappings.
    pub fn new(
        subject_id: impl Into<String>,
        resource_id: impl Into<String>,
        action_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let (subject_id, resource_id, action_id) =
            (subject_id.into(), resource_id.into(), action_id.into());

        let mut violations = Violations::new();
        violations.check_id("subject.id", Some(&subject_id));
        violations.check_id("resource.id", Some(&resource_id));
        violations.check_id("action.id", Some(&action_id));
        violations.finish(
            InputKind::Request,
            Some(Self {
                subject_id,
                resource_id,
                action_id,
                attributes: AttributeContext::default(),
            }),
        )
    }

    /// Replaces the attribute mapping of one namespace.
    pub fn with_attributes(
        mut self,
        namespace: Namespace,
        attributes: Map<String, Value>,
    ) -> Self {
        self.attributes.set_namespace(namespace, attributes);
        self
    }

    /// Parses and validates a request from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let draft: RequestDraft = serde_json::from_str(json).map_err(|source| {
            ValidationError::Malformed {
                kind: InputKind::Request,
                source,
            }
        })?;
        draft.validate()
    }

    /// Parses and validates a request from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let draft: RequestDraft =
            serde_json::from_value(value).map_err(|source| ValidationError::Malformed {
                kind: InputKind::Request,
                source,
            })?;
        draft.validate()
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    pub fn attributes(&self) -> &AttributeContext {
        &self.attributes
    }
}

// ============================================================================
// Wire shape
// ============================================================================

#[derive(Serialize)]
struct EntityView<'a> {
    id: &'a str,
    attributes: &'a Value,
}

#[derive(Serialize)]
struct RequestView<'a> {
    subject: EntityView<'a>,
    resource: EntityView<'a>,
    action: EntityView<'a>,
    context: &'a Value,
}

impl AccessRequest {
    fn entity_view<'a>(&'a self, id: &'a str, namespace: Namespace) -> EntityView<'a> {
        EntityView {
            id,
            attributes: self.attributes.namespace(namespace),
        }
    }
}

impl Serialize for AccessRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RequestView {
            subject: self.entity_view(&self.subject_id, Namespace::Subject),
            resource: self.entity_view(&self.resource_id, Namespace::Resource),
            action: self.entity_view(&self.action_id, Namespace::Action),
            context: self.attributes.namespace(Namespace::Context),
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityDraft {
    id: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestDraft {
    subject: Option<EntityDraft>,
    resource: Option<EntityDraft>,
    action: Option<EntityDraft>,
    /// `null` is read as an empty context.
    #[serde(default)]
    context: Option<Map<String, Value>>,
}

impl RequestDraft {
    fn validate(self) -> Result<AccessRequest, ValidationError> {
        let mut violations = Violations::new();
        let mut attributes = AttributeContext::default();

        let mut take = |namespace: Namespace, entity: Option<EntityDraft>| -> String {
            let Some(entity) = entity else {
                violations.push(namespace.as_str(), "is required");
                return String::new();
            };
            violations.check_id(&format!("{namespace}.id"), entity.id.as_deref());
            attributes.set_namespace(namespace, entity.attributes);
            entity.id.unwrap_or_default()
        };
        let subject_id = take(Namespace::Subject, self.subject);
        let resource_id = take(Namespace::Resource, self.resource);
        let action_id = take(Namespace::Action, self.action);
        attributes.set_namespace(Namespace::Context, self.context.unwrap_or_default());

        violations.finish(
            InputKind::Request,
            Some(AccessRequest {
                subject_id,
                resource_id,
                action_id,
                attributes,
            }),
        )
    }
}
