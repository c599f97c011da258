mod analyzer;
mod config;
mod error;
mod fetcher;
mod report;
mod scan;
mod scorer;
mod session;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, CONSOLE_TOP_ROWS, MAX_EARNINGS_YEARS};
use crate::error::Result;
use crate::fetcher::{MarketCapUniverse, PolygonClient, YahooEarningsFetcher};
use crate::report::{render_top, write_csv};
use crate::scan::Scanner;

#[derive(Debug, Parser)]
#[command(name = "emscan", about = "Scan earnings-day movers across top market-cap tickers.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every ticker in the universe and write a ranked CSV.
    Scan(ScanArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Number of top market-cap tickers to scan.
    #[arg(long, default_value_t = 100)]
    top: usize,
    /// Years of earnings history to consider.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=MAX_EARNINGS_YEARS))]
    years: u32,
    /// Path to the output CSV file.
    #[arg(long, default_value = "earnings_mover_scan.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    let result = match cli.command {
        Command::Scan(args) => run_scan(cfg, args).await,
    };
    if let Err(e) = result {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run_scan(cfg: Config, args: ScanArgs) -> Result<()> {
    info!(
        top = args.top,
        years = args.years,
        output = %args.output.display(),
        "Starting earnings mover scan"
    );

    let scanner = Scanner::new(
        Arc::new(MarketCapUniverse::new(&cfg)?),
        Arc::new(YahooEarningsFetcher::new(&cfg, args.years)?),
        Arc::new(PolygonClient::new(&cfg)?),
        cfg.sample_non_earnings_days,
        cfg.non_earnings_lookback_days,
    );

    let rows = scanner.run(args.top).await;

    write_csv(&args.output, &rows)?;
    info!("Results written to {}", args.output.display());

    println!("{}", render_top(&rows, CONSOLE_TOP_ROWS));
    Ok(())
}
