use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use treasury_tx::core::DisplayRecord;
use treasury_tx::engine::Sinks;
use treasury_tx::feeds::DataGenerator;
use treasury_tx::{Config, ReferenceData, TradingEngine};

#[derive(Parser, Debug)]
#[command(name = "treasury-tx")]
#[command(about = "Treasury desk simulator over file-driven market data, trades and inquiries")]
#[command(version)]
struct Args {
    /// Config file (falls back to ./config.toml, then built-in defaults)
    #[arg(env = "TREASURY_TX_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let config = Config::load_default(args.config.as_deref());

    let level = &config.app.log_level;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},treasury_tx={level}")));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    tracing::info!("treasury-tx starting");

    let reference = Arc::new(ReferenceData::from_config(&config)?);
    tracing::info!("Loaded {} instruments", reference.len());

    if config.generator.enabled {
        DataGenerator::new(&reference, config.generator.clone())
            .generate_all(&config.app.input_dir)?;
    }

    // 1. Build every service, then connect them
    let mut engine = TradingEngine::new(&config, reference)?;
    engine.wire(Some(Sinks::open(&config)?))?;

    // 2. Replay the input files through the pipeline
    let summary = engine.run_feeds(&config.app.input_dir)?;
    tracing::info!("prices:      {}", summary.prices);
    tracing::info!("market data: {}", summary.market_data);
    tracing::info!("trades:      {}", summary.trades);
    tracing::info!("inquiries:   {}", summary.inquiries);

    for sector in engine.sector_risks() {
        tracing::info!("sector risk: {}", sector.display_fields().join(","));
    }

    tracing::info!(
        "Done: {} algo orders, {} trades, output in {}",
        engine.algo_execution().order_count(),
        engine.booking().len(),
        config.app.output_dir.display()
    );
    Ok(())
}
