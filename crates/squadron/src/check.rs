// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `squadron check` command implementation.
//!
//! Prints the validated squad: tiers in evaluation order with their
//! thresholds and members, responder counts and the fallback.

use std::io::IsTerminal;

use squadron_config::{SquadSummary, ValidatedConfig};

/// Run the `squadron check` command.
///
/// Validation already happened while loading; this only reports.
pub fn run_check(config: &ValidatedConfig, json: bool, plain: bool) {
    let summary = config.squad.summary();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
        );
        return;
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print!("{}", format_summary(&summary, config.settings.engine.hierarchical, use_color));
}

fn format_summary(summary: &SquadSummary, hierarchical: bool, use_color: bool) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  squad {}\n", summary.name));
    out.push_str(&format!("  {}\n", "-".repeat(35)));

    let state = if use_color {
        use colored::Colorize;
        format!("{} {}", "✓".green(), "valid".green())
    } else {
        "[OK] valid".to_string()
    };
    out.push_str(&format!("    Config:      {state}\n"));
    out.push_str(&format!(
        "    Routing:     {}\n",
        if hierarchical { "hierarchical" } else { "flat" }
    ));
    out.push_str(&format!(
        "    Responders:  {} ({} specialist, {} coordinator)\n",
        summary.responder_count, summary.specialist_count, summary.coordinator_count
    ));
    out.push_str(&format!("    Fallback:    {}\n", summary.fallback_id));
    out.push('\n');

    for (i, tier) in summary.tiers.iter().enumerate() {
        out.push_str(&format!(
            "    {}. {} [{}] >= {:.2}\n",
            i + 1,
            tier.name,
            tier.kind,
            tier.confidence_threshold
        ));
        for member in &tier.members {
            out.push_str(&format!("         - {member}\n"));
        }
    }
    out.push('\n');
    out
}
