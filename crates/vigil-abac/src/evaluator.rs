//! Policy Decision Point.
//!
//! Evaluates an access request against the policies of a [`PolicyStore`]:
//!
//! 1. Ask the store for candidates matching the request identifiers.
//! 2. Keep the candidates that [`fit`](Policy::fits) the request.
//! 3. No applicable policy means Deny.
//! 4. Otherwise the highest priority decides. On equal priority Deny wins
//!    over Allow, and the reported policy is the smallest uid among those
//!    sharing the winning priority and effect.
//!
//! Step 4 is a maximum over a total order, so the decision does not depend
//! on the order in which the store returns policies, nor on whether the
//! applicability filter ran in parallel.

use std::cmp::Reverse;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, error};

use crate::policy::{Effect, Policy};
use crate::request::AccessRequest;
use crate::store::{PolicyStore, StoreResult};

/// Candidate count at which applicability checks move to the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

// ============================================================================
// Decision
// ============================================================================

/// The result of evaluating an access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether access is allowed or denied.
    pub effect: Effect,
    /// The uid of the deciding policy, or `None` if no policy applied.
    pub policy: Option<String>,
    /// Human-readable explanation of why this decision was made.
    pub reason: String,
}

impl Default for Decision {
    fn default() -> Self {
        Self::no_applicable_policy()
    }
}

impl Decision {
    fn no_applicable_policy() -> Self {
        Self {
            effect: Effect::Deny,
            policy: None,
            reason: "No applicable policy; denying by default".to_string(),
        }
    }

    fn decided_by(policy: &Policy) -> Self {
        Self {
            effect: policy.effect(),
            policy: Some(policy.uid().to_string()),
            reason: format!(
                "Policy '{}' ({}, priority {})",
                policy.uid(),
                policy.effect(),
                policy.priority()
            ),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }
}

// ============================================================================
// Conflict resolution
// ============================================================================

/// Ordering key: higher priority first, then Deny over Allow, then the
/// smaller uid.
fn precedence(policy: &Policy) -> (u64, bool, Reverse<&str>) {
    (
        policy.priority(),
        policy.effect() == Effect::Deny,
        Reverse(policy.uid()),
    )
}

/// Picks the deciding policy among applicable ones. Returns `None` for an
/// empty input.
pub fn resolve<'a>(applicable: impl IntoIterator<Item = &'a Policy>) -> Option<&'a Policy> {
    applicable
        .into_iter()
        .max_by(|a, b| precedence(a).cmp(&precedence(b)))
}

/// Evaluates a request against an explicit set of policies, without a store.
pub fn evaluate<'a>(
    policies: impl IntoIterator<Item = &'a Policy>,
    request: &AccessRequest,
) -> Decision {
    resolve(policies.into_iter().filter(|p| p.fits(request)))
        .map_or_else(Decision::no_applicable_policy, Decision::decided_by)
}

// ============================================================================
// PDP
// ============================================================================

/// Tuning knobs of the decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdpConfig {
    /// Candidate count at which applicability checks run in parallel.
    pub parallel_threshold: usize,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Policy Decision Point. Holds only a store handle and its configuration.
#[derive(Clone)]
pub struct Pdp {
    store: Arc<dyn PolicyStore>,
    config: PdpConfig,
}

impl std::fmt::Debug for Pdp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pdp").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Pdp {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self::with_config(store, PdpConfig::default())
    }

    pub fn with_config(store: Arc<dyn PolicyStore>, config: PdpConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    pub fn config(&self) -> PdpConfig {
        self.config
    }

    /// Decides a request. Store failures are returned unchanged.
    pub fn evaluate(&self, request: &AccessRequest) -> StoreResult<Decision> {
        let candidates = self.store.find_candidates(
            request.subject_id(),
            request.resource_id(),
            request.action_id(),
        )?;

        let applicable: Vec<&Policy> = if candidates.len() >= self.config.parallel_threshold {
            candidates
                .par_iter()
                .map(Arc::as_ref)
                .filter(|p| p.fits(request))
                .collect()
        } else {
            candidates
                .iter()
                .map(Arc::as_ref)
                .filter(|p| p.fits(request))
                .collect()
        };

        let decision = resolve(applicable.iter().copied())
            .map_or_else(Decision::no_applicable_policy, Decision::decided_by);

        debug!(
            subject_id = request.subject_id(),
            resource_id = request.resource_id(),
            action_id = request.action_id(),
            candidates = candidates.len(),
            applicable = applicable.len(),
            effect = %decision.effect,
            policy = decision.policy.as_deref().unwrap_or("-"),
            "access decision"
        );
        Ok(decision)
    }

    /// Fail-closed check: any store error denies.
    pub fn is_allowed(&self, request: &AccessRequest) -> bool {
        match self.evaluate(request) {
            Ok(decision) => decision.is_allowed(),
            Err(e) => {
                error!(
                    subject_id = request.subject_id(),
                    resource_id = request.resource_id(),
                    action_id = request.action_id(),
                    error = %e,
                    "policy store failure, denying access"
                );
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
