//! Audit command - manual audit records.

use anyhow::Result;
use clap::Args;
use fintrust_domain::audit::MANUAL_AUDIT_LOG;

use super::{Context, explain};

/// Arguments for the audit command.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Event details
    pub details: String,

    /// Action name
    #[arg(long, default_value = MANUAL_AUDIT_LOG)]
    pub action: String,
}

/// Run the audit command.
pub async fn run(args: AuditArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    services
        .record_audit_action(&args.action, &args.details)
        .await
        .map_err(explain)?;

    if ctx.json_output {
        println!(
            "{}",
            serde_json::json!({ "recorded": true, "action": args.action })
        );
    } else {
        println!("Audit log submitted.");
    }
    Ok(())
}
