//! Accounts command - balances behind the accounts scope.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use fintrust_domain::Scope;

use super::{Context, explain, grant};

/// Arguments for the accounts command.
#[derive(Args, Debug)]
pub struct AccountsArgs {
    /// Grant the accounts scope for this request
    #[arg(long)]
    pub consent: bool,
}

/// Run the accounts command.
pub async fn run(args: AccountsArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    if args.consent {
        grant(&services, &[Scope::Accounts], ctx).await?;
    }

    let summary = services.accounts().await.map_err(explain)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Accounts").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    for account in &summary.accounts {
        println!(
            "  {:<4} {:<12} {:>14.2}",
            account.id, account.account_type, account.balance
        );
    }
    println!("{}", dim.apply_to("─".repeat(40)));
    println!(
        "  {} accounts, total {:.2}",
        summary.total_accounts, summary.total_balance
    );
    println!();
    Ok(())
}
