use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use ivradar::application::scan::ScanOptions;
use ivradar::application::sniper::Urgency;
use ivradar::cli::commands::{Cli, Commands};
use ivradar::config::AppConfig;
use ivradar::IvRadar;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::InitConfig { path, force } => {
            let target = path.or(cli.config).unwrap_or_else(AppConfig::path_from_env);
            AppConfig::write_template(&target, force)?;
            println!("{}", serde_json::json!({ "written": target.display().to_string() }));
        }
        Commands::Strategies => {
            println!("{}", serde_json::to_string_pretty(&IvRadar::strategies())?);
        }
        Commands::Scan {
            strategy,
            days,
            csv,
            min_score,
            max_risk,
            limit,
            short_rank,
            min_short_dte,
            probe_count,
            no_save,
            explain,
        } => {
            let radar = IvRadar::new(AppConfig::resolve(cli.config.as_deref())?)?;
            let symbols = radar.load_tickers(csv.as_deref())?;

            let mut opts = ScanOptions::from_config(radar.config(), &strategy);
            if let Some(d) = days {
                opts.days = d;
            }
            if let Some(s) = min_score {
                opts.min_score = s;
            }
            if let Some(r) = max_risk {
                opts.max_risk = r;
            }
            if let Some(r) = short_rank {
                opts.policy.base_rank = r;
            }
            if let Some(d) = min_short_dte {
                opts.policy.min_dte = d;
            }
            if let Some(n) = probe_count {
                opts.policy.probe_count = n;
            }
            opts.limit = limit;
            opts.save = !no_save;

            let report = radar.scan(&symbols, &opts).await?;
            if explain {
                for gated in &report.top {
                    println!("{:<6} {}", gated.gate.to_string(), gated.row.explain());
                    if !gated.row.probe_summary.is_empty() {
                        println!("       probe: {}", gated.row.probe_summary);
                    }
                    if let Some(bp) = &gated.row.blueprint {
                        println!("       {}", bp.one_liner());
                    }
                }
                for err in &report.errors {
                    println!("ERROR  {:<6} {}", err.symbol, err.error);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Commands::Drift { symbol, lookback } => {
            let radar = IvRadar::new(AppConfig::resolve(cli.config.as_deref())?)?;
            let report = radar.drift(&symbol, lookback)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Snipe { symbol, urgency } => {
            let urgency: Urgency = urgency.parse().map_err(|e: String| e)?;
            let radar = IvRadar::new(AppConfig::resolve(cli.config.as_deref())?)?;
            let report = radar.snipe(&symbol, urgency).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
