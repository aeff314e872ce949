//! Table formatting using comfy-table.

use std::sync::Arc;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use vigil_abac::{Effect, Policy};

use super::colors::SemanticStyle;

const COLUMNS: [&str; 4] = ["uid", "effect", "priority", "description"];

/// Creates a styled table with one row per policy.
pub fn policy_table(policies: &[Arc<Policy>]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = COLUMNS
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    for policy in policies {
        let effect = Cell::new(policy.effect());
        let effect = match (super::no_color(), policy.effect()) {
            (true, _) => effect,
            (false, Effect::Allow) => effect.fg(Color::Green),
            (false, Effect::Deny) => effect.fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(policy.uid()),
            effect,
            Cell::new(policy.priority()),
            Cell::new(policy.description()),
        ]);
    }

    table
}

/// Prints one page of policies followed by a position footer.
pub fn print_policy_table(policies: &[Arc<Policy>], page: usize, total: usize) {
    if policies.is_empty() {
        println!("{}", format!("No policies on page {page} ({total} total).").muted());
        return;
    }

    println!("{}", policy_table(policies));

    let count = policies.len();
    let word = if total == 1 { "policy" } else { "policies" };
    println!("{}", format!("(page {page}: {count} of {total} {word})").muted());
}
