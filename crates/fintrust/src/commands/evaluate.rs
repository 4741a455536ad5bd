//! Evaluate command - private loan eligibility.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use fintrust_domain::{EvaluationRequest, Outcome, Scope};

use super::{Context, explain, grant};

/// Arguments for the evaluate command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Annual income
    #[arg(long)]
    pub income: f64,

    /// Credit bureau score (300-850)
    #[arg(long)]
    pub credit_score: u32,

    /// Scope to grant before evaluating (repeatable; `loan` is required)
    #[arg(long = "consent", value_name = "SCOPE")]
    pub consent: Vec<Scope>,
}

/// Run the evaluate command.
pub async fn run(args: EvaluateArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    grant(&services, &args.consent, ctx).await?;

    let request = EvaluationRequest::new(args.income, args.credit_score);
    let decision = services.evaluate(request).await.map_err(explain)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    let outcome = match decision.outcome {
        Outcome::Eligible => Style::new().green().bold().apply_to(decision.outcome),
        Outcome::Denied => Style::new().red().bold().apply_to(decision.outcome),
    };
    let dim = Style::new().dim();

    println!();
    println!("{}", style("Loan Evaluation").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Outcome:"), outcome);
    println!(
        "  {} {:.2}",
        dim.apply_to("Final score:"),
        decision.final_score
    );
    if ctx.verbose {
        let policy = services.pipeline().policy();
        println!(
            "  {} threshold {}, sensitivity {}, epsilon {}",
            dim.apply_to("Policy:"),
            policy.threshold(),
            policy.sensitivity(),
            policy.epsilon()
        );
    }
    println!();
    Ok(())
}
