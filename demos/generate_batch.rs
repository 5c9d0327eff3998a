use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utxo_batch_resolver::generation_utils::{generate_scenario, GenerationConfig};
use utxo_batch_resolver::utils::{dump_json_lines, dump_pool};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    generation: GenerationConfig,

    pool_output_path: PathBuf,
    batch_output_path: PathBuf,
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

    let scenario = generate_scenario(&config.generation)?;

    tracing::info!("generated {} owners, dumping files", scenario.keys.len());

    dump_pool(&scenario.pool, &config.pool_output_path)?;
    dump_json_lines(&scenario.candidates, &config.batch_output_path)?;

    tracing::info!("Dumping finished");

    Ok(())
}
