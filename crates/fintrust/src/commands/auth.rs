//! Auth command - session management.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;

use super::{Context, explain, open_url};

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in through the identity provider
    Login {
        /// Authorization code (or the full redirect URL); prompted for if omitted
        #[arg(long)]
        code: Option<String>,

        /// Print the login URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Replace the access token using the stored refresh token
    Refresh,

    /// Clear the stored session
    Logout,

    /// Show authentication status
    Status,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { code, no_browser } => cmd_login(code, no_browser, ctx).await,
        AuthCommand::Refresh => cmd_refresh(ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
        AuthCommand::Status => cmd_status(ctx).await,
    }
}

async fn cmd_login(code: Option<String>, no_browser: bool, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;

    let input = match code {
        Some(code) => code,
        None => {
            let auth_url = services.login_url();

            println!("FinTrust Login");
            println!("==============");
            println!();
            println!("Open this URL in your browser:");
            println!();
            println!("  {}", auth_url);
            println!();
            println!("After logging in you are redirected to");
            println!("  {}", ctx.config.config.identity.redirect_uri);
            println!("Paste the redirect URL (or just its code) here:");
            println!();

            if !no_browser && open_url(&auth_url).is_err() {
                println!("(Could not open browser automatically)");
                println!();
            }

            print!("code> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line
        }
    };

    let code = extract_code(&input);
    if code.is_empty() {
        println!("No code provided, aborting.");
        return Ok(());
    }

    let session = services.login(&code).await.map_err(explain)?;

    if ctx.json_output {
        let output = StatusOutput {
            authenticated: true,
            issued_at: Some(session.issued_at.to_rfc3339()),
            has_refresh_token: !session.refresh_token.is_empty(),
            credentials: ctx.config_dir.join(fintrust_oauth::CREDENTIALS_FILE).display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        println!("{}", Style::new().green().apply_to("Login successful."));
        println!("Grant consent with --consent on the commands that need it.");
    }
    Ok(())
}

async fn cmd_refresh(ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    let session = services.refresh().await.map_err(explain)?;
    if ctx.json_output {
        println!(
            "{}",
            serde_json::json!({ "refreshed": true, "issued_at": session.issued_at.to_rfc3339() })
        );
    } else {
        println!("Session refreshed.");
    }
    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    let had_session = services.session().await.is_some();
    services.logout().await?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "logged_out": had_session }));
    } else if had_session {
        println!("Logged out; stored tokens removed.");
    } else {
        println!("No session found.");
    }
    Ok(())
}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    authenticated: bool,
    issued_at: Option<String>,
    has_refresh_token: bool,
    credentials: String,
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    let session = services.session().await;
    let credentials = ctx.config_dir.join(fintrust_oauth::CREDENTIALS_FILE);

    if ctx.json_output {
        let output = StatusOutput {
            authenticated: session.is_some(),
            issued_at: session.as_ref().map(|s| s.issued_at.to_rfc3339()),
            has_refresh_token: session.as_ref().is_some_and(|s| !s.refresh_token.is_empty()),
            credentials: credentials.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Authentication Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    match session {
        Some(session) => {
            println!(
                "  {} {}",
                dim.apply_to("Session:"),
                Style::new().green().apply_to("● authenticated")
            );
            println!(
                "  {} {} ({}s ago)",
                dim.apply_to("Issued:"),
                session.issued_at.format("%Y-%m-%d %H:%M:%S UTC"),
                session.age_seconds()
            );
            if session.refresh_token.is_empty() {
                println!("  {} none", dim.apply_to("Refresh token:"));
            }
        }
        None => {
            println!(
                "  {} {}",
                dim.apply_to("Session:"),
                Style::new().red().apply_to("● not authenticated")
            );
            println!();
            println!("  {}", dim.apply_to("Log in with: fintrust auth login"));
        }
    }
    if ctx.verbose {
        println!("  {} {}", dim.apply_to("Credentials:"), credentials.display());
    }
    println!();
    Ok(())
}

/// Pull the authorization code out of pasted input.
///
/// Accepts a bare code or the full redirect URL carrying `?code=...`.
fn extract_code(input: &str) -> String {
    let input = input.trim();
    if let Ok(url) = url::Url::parse(input)
        && let Some((_, code)) = url.query_pairs().find(|(key, _)| key == "code")
    {
        return code.into_owned();
    }
    input.to_string()
}
