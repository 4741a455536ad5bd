//! Health command - backend liveness and session check.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use super::Context;

/// Arguments for the health command.
#[derive(Args, Debug)]
pub struct HealthArgs {}

/// Health response for JSON output.
#[derive(Debug, Serialize)]
struct HealthOutput {
    healthy: bool,
    authenticated: bool,
    service: Option<String>,
    version: Option<String>,
    backend_url: String,
}

/// Run the health command.
pub async fn run(_args: HealthArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    let backend_url = services.gateway().base_url().to_string();
    let authenticated = services.session().await.is_some();

    match services.health().await {
        Ok(health) => {
            if ctx.json_output {
                let output = HealthOutput {
                    healthy: health.is_healthy(),
                    authenticated,
                    service: health.service.clone(),
                    version: health.version.clone(),
                    backend_url,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let green = Style::new().green();
                let dim = Style::new().dim();

                println!();
                println!("{}", style("FinTrust Backend").bold());
                println!("{}", dim.apply_to("─".repeat(40)));
                println!();
                println!(
                    "  {} {}",
                    dim.apply_to("Status:"),
                    green.apply_to(format!("● {}", health.status))
                );
                if let Some(service) = &health.service {
                    println!("  {} {}", dim.apply_to("Service:"), service);
                }
                if let Some(version) = &health.version {
                    println!("  {} {}", dim.apply_to("Version:"), version);
                }
                println!("  {} {}", dim.apply_to("Backend:"), backend_url);
                println!();
            }
        }
        Err(e) => {
            if ctx.json_output {
                let output = HealthOutput {
                    healthy: false,
                    authenticated,
                    service: None,
                    version: None,
                    backend_url,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let red = Style::new().red();
                let dim = Style::new().dim();

                println!();
                println!("{}", style("FinTrust Backend").bold());
                println!("{}", dim.apply_to("─".repeat(40)));
                println!();
                println!(
                    "  {} {}",
                    dim.apply_to("Status:"),
                    red.apply_to("● unreachable")
                );
                println!("  {} {}", dim.apply_to("Backend:"), backend_url);

                if ctx.verbose {
                    println!();
                    println!("  {} {}", dim.apply_to("Error:"), e);
                }

                println!();
                if e.requires_login() {
                    println!("  {}", dim.apply_to("Session rejected. Log in with: fintrust auth login"));
                    println!();
                }
            }
        }
    }

    Ok(())
}
