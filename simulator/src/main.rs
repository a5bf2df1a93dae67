//! TokenSwap Simulator
//!
//! Runs scripted scenarios or random traffic against a swap engine backed
//! by the in-memory ledger.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

mod controller;
mod metrics;
mod scenario;
mod trader;

use controller::SimulationController;
use scenario::Scenario;
use tokenswap_exchange::{telemetry, ExchangeConfig};

/// TokenSwap Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "TokenSwap scenario runner and traffic simulator")]
struct Args {
    /// Built-in scenario to run
    #[arg(short, long, conflicts_with = "scenario_file")]
    scenario: Option<String>,

    /// JSON scenario file to run
    #[arg(long)]
    scenario_file: Option<PathBuf>,

    /// List built-in scenarios and exit
    #[arg(long)]
    list: bool,

    /// Number of traders for random traffic
    #[arg(short, long, default_value = "5")]
    traders: usize,

    /// Number of swaps for random traffic
    #[arg(long, default_value = "100")]
    swaps: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Print engine metrics in Prometheus format at the end
    #[arg(long)]
    prometheus: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.list {
        for name in Scenario::builtin_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = ExchangeConfig::from_env()?;
    telemetry::init_tracing(&config.log_level, config.log_json)?;

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(
        engine_account = %config.engine_account,
        rounding = ?config.rounding,
        "Starting TokenSwap Simulator"
    );

    let mut controller = SimulationController::new(config, args.seed);

    let scenario = match (&args.scenario, &args.scenario_file) {
        (Some(name), _) => Some(Scenario::load(name)?),
        (None, Some(path)) => Some(Scenario::from_file(path)?),
        (None, None) => None,
    };

    match scenario {
        Some(scenario) => controller.run_scenario(&scenario).await?,
        None => controller.run_random(args.traders, args.swaps).await?,
    }

    let summary = controller.metrics().summary();
    info!(
        total = summary.total_swaps,
        settled = summary.settled_swaps,
        rejected = summary.rejected_swaps,
        success_rate = summary.success_rate,
        p50_latency_us = summary.settled_latency.p50_us,
        p99_latency_us = summary.settled_latency.p99_us,
        "Simulation complete"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if args.prometheus {
        print!("{}", controller.engine().metrics().to_prometheus());
    }

    Ok(())
}
