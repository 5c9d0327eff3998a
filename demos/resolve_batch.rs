use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;

use clap::Parser;
use serde::Deserialize;

use tracing_subscriber::prelude::*;
use utxo_batch_resolver::batch_utils::audit::verify_resolution;
use utxo_batch_resolver::batch_utils::stats_accumulator::{ResolutionStats, StatsAccumulator};
use utxo_batch_resolver::ledger::Ledger;
use utxo_batch_resolver::resolver::ResolverConfig;
use utxo_batch_resolver::signature::Ed25519Verifier;
use utxo_batch_resolver::utils::{dump_json_lines, dump_pool, load_batch, load_pool};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pool_path: PathBuf,
    /// Resolved in order, one epoch each, against the same ledger.
    batch_paths: Vec<PathBuf>,
    #[serde(default)]
    resolver: ResolverConfig,

    accepted_output_path: PathBuf,
    rejected_output_path: PathBuf,
    pool_output_path: PathBuf,
    stats_output_path: PathBuf,
}

#[derive(Parser, Debug)]
#[clap(version)]
pub struct Cli {
    /// path to config file
    #[clap(long, value_parser)]
    config_path: PathBuf,
}

#[tokio::main]
async fn main() {
    let result = _main().await;
    result.unwrap();
}

async fn _main() -> anyhow::Result<()> {
    // Start logging setup block
    let fmt_layer = tracing_subscriber::fmt::layer().with_test_writer();

    tracing_subscriber::registry().with(fmt_layer).init();

    let Cli { config_path } = Cli::parse();

    tracing::info!("Config file {:?}", config_path);
    let file = File::open(&config_path).with_context(|| {
        format!(
            "Cannot read config file {path}",
            path = config_path.display()
        )
    })?;
    let config: Config = serde_yaml::from_reader(file).with_context(|| {
        format!(
            "Cannot read config file {path}",
            path = config_path.display()
        )
    })?;

    let initial_pool = load_pool(&config.pool_path)?;
    tracing::info!("pool loaded: {} unspent outputs", initial_pool.len());

    let mut ledger = Ledger::with_verifier(&initial_pool, Ed25519Verifier, config.resolver.clone());
    let mut stats = StatsAccumulator::<ResolutionStats>::default();
    let mut accepted = vec![];
    let mut rejected = vec![];

    for (epoch, batch_path) in config.batch_paths.iter().enumerate() {
        let batch = load_batch(batch_path)?;
        tracing::info!("epoch {}: {} candidates from {:?}", epoch, batch.len(), batch_path);

        let pool_before = ledger.utxo_pool().clone();
        let resolution = ledger.handle_txs(batch)?;
        let audited_fees = verify_resolution(&pool_before, &resolution.accepted)
            .with_context(|| format!("epoch {} failed the audit", epoch))?;
        tracing::info!(
            "epoch {}: accepted {}, rejected {}, fees {} (audited {}), passes {}",
            epoch,
            resolution.accepted.len(),
            resolution.rejected.len(),
            resolution.total_fees,
            audited_fees,
            resolution.passes,
        );

        stats.add_stats(epoch as u64, ResolutionStats::from(&resolution));
        accepted.extend(resolution.accepted);
        rejected.extend(resolution.rejected);
    }

    tracing::info!("Resolution finished, dumping files");

    dump_json_lines(&accepted, &config.accepted_output_path)?;
    dump_json_lines(&rejected, &config.rejected_output_path)?;
    dump_pool(ledger.utxo_pool(), &config.pool_output_path)?;
    stats.dump_stats(&config.stats_output_path, ResolutionStats::FORMAT)?;

    tracing::info!("Dumping finished");

    Ok(())
}
