use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use token_pnl::{
    AggregateOptions, ReportTotals, aggregate_transactions, load_transactions, write_summaries,
};
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Roll a ledger of closed trades up into one proceeds / cost basis / PNL row per token
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Path to the transactions CSV
    #[arg(short = 't', long = "transactions", value_name = "PATH")]
    transactions: PathBuf,

    /// Path to write the per-token summary CSV
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: PathBuf,

    /// Accept fee_percentage values outside [0, 100]
    #[arg(long)]
    allow_any_fee: bool,

    /// Do not print the run summary
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "token_pnl=debug"
    } else {
        "token_pnl=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &Args) -> Result<()> {
    let transactions = load_transactions(&args.transactions).with_context(|| {
        format!(
            "failed to load transactions from {}",
            args.transactions.display()
        )
    })?;

    let options = AggregateOptions {
        validate_fees: !args.allow_any_fee,
    };
    let summaries = aggregate_transactions(&transactions, &options)
        .context("failed to aggregate transactions")?;

    write_summaries(&args.output, &summaries)
        .with_context(|| format!("failed to write summary to {}", args.output.display()))?;

    if !args.quiet {
        let totals = ReportTotals::from_summaries(&summaries);
        println!("\n=== TOKEN PNL SUMMARY ===");
        println!("Transactions: {}", totals.transactions);
        println!("Tokens: {}", totals.tokens);
        println!("Total sale proceeds: {}", totals.sale_proceeds);
        println!("Total cost basis: {}", totals.cost_basis);
        println!("Net PNL: {}", totals.pnl);
        println!("\nWrote summary report: {}", args.output.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}
