//! CLI command handlers.

pub mod accounts;
pub mod audit;
pub mod auth;
pub mod config;
pub mod evaluate;
pub mod health;
pub mod transactions;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use console::Style;
use fintrust_config::LoadedConfig;
use fintrust_domain::{DomainError, FintrustServices, Scope};
use fintrust_oauth::FileCredentialStore;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved configuration.
    pub config: LoadedConfig,
    /// Holds fintrust.toml, credentials, and logs.
    pub config_dir: PathBuf,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Build the domain services over the on-disk credential store.
    pub fn services(&self) -> Result<FintrustServices> {
        let store = Arc::new(FileCredentialStore::new(&self.config_dir));
        Ok(FintrustServices::new(&self.config.config, store)?)
    }
}

/// Grant `scopes` and submit them, printing what was granted.
pub async fn grant(services: &FintrustServices, scopes: &[Scope], ctx: &Context) -> Result<()> {
    let granted = services.grant_consent(scopes).await.map_err(explain)?;
    if !ctx.json_output {
        let dim = Style::new().dim();
        for scope in granted {
            println!(
                "  {} {} {}",
                Style::new().green().apply_to("✓"),
                scope,
                dim.apply_to(format!("({})", scope.description()))
            );
        }
    }
    Ok(())
}

/// Turn a domain error into a user-facing one, with a hint when re-login helps.
pub fn explain(e: DomainError) -> anyhow::Error {
    if e.requires_login() {
        anyhow::anyhow!("{}\nRun 'fintrust auth login' to authenticate.", e)
    } else {
        anyhow::Error::new(e)
    }
}

/// Try to open a URL in the default browser.
pub fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
    }
    Ok(())
}
