//! Kani proofs for policy evaluation
//!
//! Bounded model checking of the decision rules that do not depend on
//! attribute parsing.
//!
//! **Proof Count**: 4 proofs
//!
//! Run with: `cargo kani --tests --harness verify_*`

#[cfg(kani)]
use crate::evaluator;
#[cfg(kani)]
use crate::glob;
#[cfg(kani)]
use crate::policy::{Effect, Policy};
#[cfg(kani)]
use crate::request::AccessRequest;
#[cfg(kani)]
use crate::target::Target;

#[cfg(kani)]
fn effect(deny: bool) -> Effect {
    if deny { Effect::Deny } else { Effect::Allow }
}

/// Proof: Equal-priority deny overrides
///
/// **Property**: For two applicable policies of equal priority, any Deny wins,
/// whatever the evaluation order
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_equal_priority_deny_overrides() {
    let priority: u8 = kani::any();
    let a_deny: bool = kani::any();
    let b_deny: bool = kani::any();

    let priority = u64::from(priority);
    let a = Policy::new("a", effect(a_deny)).unwrap().with_priority(priority);
    let b = Policy::new("b", effect(b_deny)).unwrap().with_priority(priority);
    let request = AccessRequest::new("s", "r", "x").unwrap();

    let forward = evaluator::evaluate([&a, &b], &request);
    let backward = evaluator::evaluate([&b, &a], &request);

    assert_eq!(forward, backward);
    assert_eq!(forward.effect == Effect::Deny, a_deny || b_deny);
}

/// Proof: Strict priority
///
/// **Property**: The strictly higher priority policy decides
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_priority_conflict_resolution() {
    let low: u8 = kani::any();
    let gap: u8 = kani::any();
    kani::assume(gap > 0);

    let high_deny: bool = kani::any();
    let low_policy = Policy::new("low", effect(!high_deny))
        .unwrap()
        .with_priority(u64::from(low));
    let high_policy = Policy::new("high", effect(high_deny))
        .unwrap()
        .with_priority(u64::from(low) + u64::from(gap));
    let request = AccessRequest::new("s", "r", "x").unwrap();

    let decision = evaluator::evaluate([&low_policy, &high_policy], &request);
    assert_eq!(decision.effect, effect(high_deny));
    assert_eq!(decision.policy.as_deref(), Some("high"));
}

/// Proof: Default deny
///
/// **Property**: When no target matches, the decision is Deny with no policy
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_default_deny_safety() {
    let policy = Policy::new("admins", Effect::Allow)
        .unwrap()
        .with_targets(Target::new("admin", "*", "*"));
    let request = AccessRequest::new("guest", "r", "x").unwrap();

    let decision = evaluator::evaluate([&policy], &request);
    assert_eq!(decision.effect, Effect::Deny);
    assert!(decision.policy.is_none());
}

/// Proof: Trailing wildcard superset
///
/// **Property**: If a literal pattern matches, the same pattern with a
/// trailing `*` matches too
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(8)]
fn verify_trailing_wildcard_superset() {
    let bytes: [u8; 3] = kani::any();
    kani::assume(bytes.iter().all(|b| b.is_ascii_lowercase()));
    let Ok(literal) = std::str::from_utf8(&bytes) else {
        return;
    };

    assert!(glob::matches(literal, literal));
    let widened = format!("{literal}*");
    assert!(glob::matches(&widened, literal));
}
