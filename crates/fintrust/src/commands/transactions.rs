//! Transactions command - history behind the transactions scope.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use fintrust_domain::Scope;

use super::{Context, explain, grant};

/// Arguments for the transactions command.
#[derive(Args, Debug)]
pub struct TransactionsArgs {
    /// Grant the transactions scope for this request
    #[arg(long)]
    pub consent: bool,
}

/// Run the transactions command.
pub async fn run(args: TransactionsArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    if args.consent {
        grant(&services, &[Scope::Transactions], ctx).await?;
    }

    let list = services.transactions().await.map_err(explain)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Transactions").bold());
    println!("{}", dim.apply_to("─".repeat(60)));
    if list.transactions.is_empty() {
        println!("  {}", dim.apply_to("No transactions"));
    }
    for tx in &list.transactions {
        let amount = format!("{:>12.2}", tx.amount);
        let amount = if tx.amount < 0.0 {
            Style::new().red().apply_to(amount)
        } else {
            Style::new().green().apply_to(amount)
        };
        println!(
            "  {}  {}  {}",
            dim.apply_to(&tx.timestamp),
            amount,
            tx.merchant.as_deref().unwrap_or("-")
        );
    }
    println!();
    Ok(())
}
