pub mod collect;
pub mod config;
pub mod error;
pub mod pool;
mod session;

use std::io;

use es_core::{Checkpoint, EsLearner, NoiseTable};
use log::info;
use tokio::task;

pub use collect::Collector;
pub use config::TrainingConfig;
pub use error::{CoordinatorError, Result};
pub use pool::{LocalPool, RemotePool, RolloutPool};
pub use session::Coordinator;

/// Runs a whole training session as described by `config`.
///
/// Workers run in process unless `config.worker_addrs` names remote ones.
///
/// # Errors
/// Returns a `CoordinatorError` if the configuration is invalid, connecting to
/// any worker fails or an iteration fails.
///
/// # Returns
/// The final parameters.
pub async fn train(config: TrainingConfig) -> Result<Vec<f32>> {
    config.validate()?;

    let (size, seed) = (config.es.noise_size, config.es.noise_seed);
    info!(size = size, seed = seed; "creating noise table");
    let noise = task::spawn_blocking(move || NoiseTable::create(size, seed))
        .await
        .map_err(|e| io::Error::other(format!("noise table join error: {e}")))?;

    let learner = EsLearner::from_config(config.es.clone(), noise.clone())?;

    if config.worker_addrs.is_empty() {
        let pool = LocalPool::new(&config.es, &noise)?;
        run(Coordinator::new(pool, learner), &config).await
    } else {
        info!("connecting to {} worker(s)", config.worker_addrs.len());
        let pool =
            RemotePool::connect(&config.worker_addrs, &config.es, &noise, learner.num_params())
                .await?;
        run(Coordinator::new(pool, learner), &config).await
    }
}

async fn run<P: RolloutPool>(
    mut coordinator: Coordinator<P>,
    config: &TrainingConfig,
) -> Result<Vec<f32>> {
    if let Some(path) = &config.restore {
        coordinator.restore(Checkpoint::load(path)?).await?;
    }

    for _ in 0..config.iterations {
        coordinator.train_iteration().await?;

        if let Some(path) = &config.checkpoint {
            coordinator.checkpoint().save(path)?;
        }
    }

    coordinator.shutdown().await
}
