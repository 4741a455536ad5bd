//! FinTrust - consent-gated private loan evaluation
//!
//! Main entry point for the FinTrust CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{accounts, audit, auth, config, evaluate, health, transactions};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// FinTrust - consent-gated private loan evaluation
#[derive(Parser)]
#[command(name = "fintrust")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding fintrust.toml, credentials, and logs
    #[arg(long, global = true, env = "FINTRUST_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication management
    Auth(auth::AuthArgs),

    /// Check that the backend is up and the session is accepted
    Health(health::HealthArgs),

    /// Show account balances (needs the accounts scope)
    Accounts(accounts::AccountsArgs),

    /// Show transaction history (needs the transactions scope)
    Transactions(transactions::TransactionsArgs),

    /// Run a private loan eligibility evaluation
    Evaluate(evaluate::EvaluateArgs),

    /// Record a manual audit event
    Audit(audit::AuditArgs),

    /// Configuration inspection
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli
        .config_dir
        .clone()
        .or_else(fintrust_config::xdg_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    // Console layer on stderr keeps --json output clean; everything goes to the JSON file
    let filter = if cli.verbose {
        "fintrust=debug,fintrust_domain=debug,fintrust_client=debug,fintrust_oauth=debug,fintrust_config=debug,audit=info,info"
    } else {
        "fintrust=info,fintrust_domain=info,fintrust_client=warn,fintrust_oauth=warn,audit=off,warn"
    };

    let log_dir = config_dir.join("logs");
    let file_appender = tracing_appender::rolling::daily(&log_dir, "fintrust.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "fintrust=trace,fintrust_domain=trace,fintrust_client=trace,fintrust_oauth=trace,fintrust_config=trace,audit=info,info",
                )),
        )
        .init();

    let loaded = fintrust_config::load_config_with_options(Some(&config_dir), |name| {
        std::env::var(name).ok()
    })?;
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    // Create context for commands
    let ctx = commands::Context {
        config: loaded,
        config_dir,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Health(args) => health::run(args, &ctx).await,
        Commands::Accounts(args) => accounts::run(args, &ctx).await,
        Commands::Transactions(args) => transactions::run(args, &ctx).await,
        Commands::Evaluate(args) => evaluate::run(args, &ctx).await,
        Commands::Audit(args) => audit::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
