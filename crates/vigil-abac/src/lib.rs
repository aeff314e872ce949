//! # vigil-abac: Attribute-Based Access Control
//!
//! Decides whether a subject may perform an action on a resource by
//! evaluating stored policies against the attributes of the request.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  AccessRequest                               │
//! │  (subject / resource / action ids,           │
//! │   attributes + context)                      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Pdp                                         │
//! │  ├─ PolicyStore::find_candidates (targets)   │
//! │  ├─ Policy::fits (targets + rules)           │
//! │  └─ resolve: priority, then deny-overrides   │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision                                    │
//! │  - Effect (Allow/Deny, default Deny)         │
//! │  - Deciding policy uid                       │
//! │  - Human-readable reason                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Policies
//!
//! A policy is a JSON document with a `uid`, [`Target`] patterns over the
//! request identifiers (`*` is the only wildcard), a [`Rule`] that binds
//! [`Condition`] trees to the subject, resource, action, and context
//! attributes, an `effect`, and a `priority`.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use vigil_abac::{AccessRequest, Effect, MemoryPolicyStore, Pdp, Policy, PolicyStore};
//!
//! let store = Arc::new(MemoryPolicyStore::new());
//! store.create(Policy::from_json(r#"{
//!     "uid": "read-docs",
//!     "rules": {},
//!     "targets": {"resource_id": "/docs/*", "action_id": "read"},
//!     "effect": "allow"
//! }"#)?)?;
//! store.create(Policy::from_json(r#"{
//!     "uid": "no-drafts",
//!     "rules": {"resource": {"$.status": {"condition": "Equals", "value": "draft"}}},
//!     "targets": {"resource_id": "/docs/*"},
//!     "effect": "deny",
//!     "priority": 10
//! }"#)?)?;
//!
//! let pdp = Pdp::new(store);
//!
//! let request = AccessRequest::from_json(r#"{
//!     "subject":  {"id": "alice"},
//!     "resource": {"id": "/docs/readme", "attributes": {"status": "published"}},
//!     "action":   {"id": "read"}
//! }"#)?;
//! let decision = pdp.evaluate(&request)?;
//! assert_eq!(decision.effect, Effect::Allow);
//! assert_eq!(decision.policy.as_deref(), Some("read-docs"));
//!
//! let draft = AccessRequest::from_json(r#"{
//!     "subject":  {"id": "alice"},
//!     "resource": {"id": "/docs/plan", "attributes": {"status": "draft"}},
//!     "action":   {"id": "read"}
//! }"#)?;
//! assert!(!pdp.is_allowed(&draft));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attributes;
pub mod condition;
pub mod evaluator;
pub mod glob;
pub mod policy;
pub mod request;
pub mod rule;
pub mod store;
pub mod target;
pub mod validation;

// Kani proofs for bounded model checking
#[cfg(any(test, kani))]
mod kani_proofs;

pub use attributes::{AttributeContext, AttributePath, Namespace};
pub use condition::Condition;
pub use evaluator::{Decision, Pdp, PdpConfig, evaluate, resolve};
pub use policy::{Effect, Policy};
pub use request::AccessRequest;
pub use rule::{AttributeMap, NamespaceRule, Rule};
pub use store::{MemoryPolicyStore, PolicyStore, StoreError, StoreResult};
pub use target::{Patterns, Target};
pub use validation::{InputKind, ValidationError, Violation};
