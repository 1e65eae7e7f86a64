use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ivradar", about = "Implied-volatility term-structure radar for option structures")]
pub struct Cli {
    /// Config file (defaults to $IVRADAR_CONFIG, then ./ivradar.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default configuration file
    InitConfig {
        /// Target path (defaults to the resolved config path)
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
    /// Scan the ticker universe with one strategy
    Scan {
        /// Strategy name or alias (see `strategies`)
        #[arg(long, default_value = "auto")]
        strategy: String,
        /// Calendar days of expirations to request
        #[arg(long)]
        days: Option<u32>,
        /// Ticker CSV (defaults to paths.tickers_csv)
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        min_score: Option<i32>,
        #[arg(long)]
        max_risk: Option<i32>,
        /// Scan only the first N tickers (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,
        /// Eligible-expiry rank of the short leg
        #[arg(long)]
        short_rank: Option<usize>,
        #[arg(long)]
        min_short_dte: Option<u32>,
        /// Ranks probed when rescuing watch candidates
        #[arg(long)]
        probe_count: Option<usize>,
        /// Do not persist the batch
        #[arg(long)]
        no_save: bool,
        /// Print score/risk breakdown lines instead of JSON
        #[arg(long)]
        explain: bool,
    },
    /// Short-leg IV drift across saved batches
    Drift {
        symbol: String,
        #[arg(long, default_value = "1")]
        lookback: usize,
    },
    /// Price the latest accepted blueprint for a symbol (no order is sent)
    Snipe {
        symbol: String,
        /// passive, neutral or aggressive
        #[arg(long, default_value = "neutral")]
        urgency: String,
    },
    /// List strategies and their aliases
    Strategies,
}
