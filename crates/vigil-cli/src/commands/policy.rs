//! Policy file commands.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use vigil_abac::{Policy, PolicyStore};
use vigil_config::VigilConfig;

use crate::style::{eprint_labeled, print_error, print_policy_table, print_success};

/// Validates a policy object or an array of policies, reporting every
/// violation of every policy before failing.
pub fn validate(file: &Path) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let documents = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let total = documents.len();
    let mut invalid = 0;
    let mut seen = BTreeSet::new();

    for (index, document) in documents.into_iter().enumerate() {
        match Policy::from_value(document) {
            Ok(policy) if !seen.insert(policy.uid().to_string()) => {
                invalid += 1;
                print_error(&format!("[{index}] duplicate uid '{}'", policy.uid()));
            }
            Ok(policy) => print_success(&format!("[{index}] {}", policy.uid())),
            Err(err) if err.violations().is_empty() => {
                invalid += 1;
                print_error(&format!("[{index}] {err}"));
            }
            Err(err) => {
                invalid += 1;
                print_error(&format!("[{index}] invalid {}", err.kind()));
                for violation in err.violations() {
                    eprint_labeled(&violation.field, &violation.message);
                }
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} of {total} policies in {} are invalid", file.display());
    }
    print_success(&format!("{total} valid in {}", file.display()));
    Ok(())
}

/// Prints one page of the policy snapshot, ordered by uid.
pub fn list(
    config: &VigilConfig,
    policies: Option<&Path>,
    page: usize,
    page_size: Option<usize>,
) -> Result<()> {
    let store = super::open_store(config, policies)?;
    let page_size = page_size.unwrap_or(config.store.page_size);

    let entries = store.get_all(page, page_size)?;
    let total = store.len()?;
    print_policy_table(&entries, page, total);
    Ok(())
}
