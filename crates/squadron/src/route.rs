// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `squadron route` command implementation.
//!
//! Routes each message on one session with the built-in tag classifier and
//! prints the decision with its tier trace. Responders are not invoked.

use std::io::IsTerminal;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use squadron_agent::SessionTracker;
use squadron_config::ValidatedConfig;
use squadron_core::{Request, RoutingDecision};
use squadron_router::{RouterSettings, TagClassifier, TierRouter};

/// One routed message for `--json` output.
#[derive(Debug, Serialize)]
struct RouteLine<'a> {
    session_id: &'a str,
    message: &'a str,
    decision: &'a RoutingDecision,
    handoff: Option<&'a str>,
}

/// Run the `squadron route` command.
pub async fn run_route(
    config: &ValidatedConfig,
    session_id: &str,
    messages: &[String],
    json: bool,
    plain: bool,
) {
    let squad = Arc::new(config.squad.clone());
    let classifier = Arc::new(TagClassifier::new(&squad));
    let router = TierRouter::new(
        squad,
        classifier,
        RouterSettings::from_config(&config.settings.engine),
    );
    let sessions = SessionTracker::new(config.settings.session.context_window);
    let use_color = !plain && std::io::stdout().is_terminal();

    for message in messages {
        let mut session = sessions.lock_session(session_id).await;
        let context = session.context();
        let decision = router.route(&Request::new(message.as_str()), &context).await;
        let handoff = session.record_decision(&decision);
        let previous = handoff.as_ref().map(|h| h.from.as_str());

        if json {
            let line = RouteLine {
                session_id,
                message,
                decision: &decision,
                handoff: previous,
            };
            println!(
                "{}",
                serde_json::to_string(&line).unwrap_or_else(|_| "{}".to_string())
            );
        } else {
            print!("{}", format_decision(message, &decision, previous, use_color));
        }
    }
}

fn format_decision(
    message: &str,
    decision: &RoutingDecision,
    handoff_from: Option<&str>,
    use_color: bool,
) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  > {message}\n"));

    let selected = if use_color {
        decision.selected_responder_id.as_str().bold().to_string()
    } else {
        decision.selected_responder_id.clone()
    };
    out.push_str(&format!(
        "    Routed to:  {selected} (tier {}, confidence {:.2}, {})\n",
        decision.tier_name, decision.confidence, decision.reason
    ));
    if let Some(from) = handoff_from {
        out.push_str(&format!("    Handoff:    {from} -> {}\n", decision.selected_responder_id));
    }

    for entry in &decision.trace {
        let (id, confidence) = match &entry.candidate {
            Some(c) => (c.responder_id.as_str(), format!("{:.2}", c.confidence)),
            None => ("-", "-".to_string()),
        };
        let mark = match (entry.threshold_met, use_color) {
            (true, true) => "✓".green().to_string(),
            (false, true) => "✗".red().to_string(),
            (true, false) => "[MET]".to_string(),
            (false, false) => "[--]".to_string(),
        };
        out.push_str(&format!(
            "      {mark} {} >= {:.2}: {id} {confidence}\n",
            entry.tier_name, entry.threshold
        ));
    }
    out
}
