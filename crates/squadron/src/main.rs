// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Squadron - confidence-based tier routing for squads of AI responders.
//!
//! This is the binary entry point. It validates squad configuration and
//! routes messages through the tier router with the built-in tag classifier.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod route;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use squadron_config::ValidatedConfig;

/// Squadron - confidence-based tier routing for squads of AI responders.
#[derive(Parser, Debug)]
#[command(name = "squadron", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the default lookup chain.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration and print the squad summary.
    Check {
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Route messages through the squad and print each decision.
    Route {
        /// Session the messages belong to.
        #[arg(long, short, default_value = "cli")]
        session: String,

        /// Print decisions as JSON lines.
        #[arg(long)]
        json: bool,

        /// Messages, routed in order on the same session.
        #[arg(required = true)]
        messages: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("squadron: use --help for available commands");
        return;
    };

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            squadron_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.settings.engine.log_level);

    match command {
        Commands::Check { json } => check::run_check(&config, json, cli.plain),
        Commands::Route {
            session,
            json,
            messages,
        } => route::run_route(&config, &session, &messages, json, cli.plain).await,
    }
}

fn load(
    path: Option<&std::path::Path>,
) -> Result<ValidatedConfig, Vec<squadron_config::ConfigError>> {
    match path {
        Some(path) => squadron_config::load_and_validate_path(path),
        None => squadron_config::load_and_validate(),
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("squadron={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
