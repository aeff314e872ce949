//! Decide a single access request.

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use vigil_abac::{AccessRequest, Effect, Pdp, PdpConfig};
use vigil_config::VigilConfig;

use crate::style::{colors::SemanticStyle, print_labeled};

/// Exit code reported for a deny decision. Errors exit with 1.
pub const DENY_EXIT_CODE: u8 = 2;

pub fn run(config: &VigilConfig, request_path: &Path, policies: Option<&Path>) -> Result<ExitCode> {
    let text = fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read {}", request_path.display()))?;
    let request = AccessRequest::from_json(&text)
        .with_context(|| format!("Invalid request in {}", request_path.display()))?;

    let store = super::open_store(config, policies)?;
    let pdp = Pdp::with_config(
        Arc::new(store),
        PdpConfig {
            parallel_threshold: config.pdp.parallel_threshold,
        },
    );

    debug!(
        subject = request.subject_id(),
        resource = request.resource_id(),
        action = request.action_id(),
        "checking request"
    );
    let decision = pdp.evaluate(&request).context("Policy evaluation failed")?;

    match decision.effect {
        Effect::Allow => println!("{}", "allow".success()),
        Effect::Deny => println!("{}", "deny".error()),
    }
    print_labeled("policy", decision.policy.as_deref().unwrap_or("none"));
    print_labeled("reason", &decision.reason);

    Ok(if decision.is_allowed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(DENY_EXIT_CODE)
    })
}
