//! Config command - configuration inspection.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = &ctx.config.config;
    let key_status = if config.crypto.evaluation_key.is_some() {
        "configured"
    } else {
        "not set (ephemeral)"
    };

    if ctx.json_output {
        let output = json!({
            "source": ctx.config.source.as_ref().map(|p| p.display().to_string()),
            "identity": config.identity,
            "backend": config.backend,
            "policy": config.policy,
            "evaluation_key": key_status,
            "warnings": ctx.config.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("# FinTrust Configuration\n");

    match &ctx.config.source {
        Some(source) => println!("Config file:\n  {}\n", source.display()),
        None => println!("No config file loaded (using defaults)\n"),
    }

    println!("Identity:");
    println!("  keycloak_url: {}", config.identity.keycloak_url);
    println!("  realm:        {}", config.identity.realm);
    println!("  client_id:    {}", config.identity.client_id);
    println!("  redirect_uri: {}", config.identity.redirect_uri);
    println!();

    println!("Backend:");
    println!("  base_url:  {}", config.backend.base_url);
    println!("  audit_url: {}", config.backend.audit_url);
    println!("  timeout:   {}s", config.backend.timeout_secs);
    println!();

    println!("Policy:");
    println!("  threshold:   {}", config.policy.threshold);
    println!("  sensitivity: {}", config.policy.sensitivity);
    println!("  epsilon:     {}", config.policy.epsilon);
    println!();

    println!("Evaluation key: {}\n", key_status);

    if !ctx.config.warnings.is_empty() {
        println!("Warnings:");
        for w in &ctx.config.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    println!("{}", ctx.config_dir.join("fintrust.toml").display());
    Ok(())
}
