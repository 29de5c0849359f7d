use std::{env, path::PathBuf};

use anyhow::Context;
use log::info;

use coordinator::TrainingConfig;

const DEFAULT_CONFIG: &str = "training.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = TrainingConfig::from_path(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    let iterations = config.iterations;
    let theta = coordinator::train(config).await.context("training failed")?;

    info!(iterations = iterations, num_params = theta.len(); "training finished");
    Ok(())
}
