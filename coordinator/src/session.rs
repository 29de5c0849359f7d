use es_core::{Checkpoint, EsLearner, IterationReport};
use log::info;

use crate::{Result, collect::Collector, pool::RolloutPool};

/// A training session, the learner driving a pool of rollout workers.
pub struct Coordinator<P> {
    pool: P,
    learner: EsLearner,
    collector: Collector,
    iteration: usize,
}

impl<P: RolloutPool> Coordinator<P> {
    /// Creates a new `Coordinator`.
    ///
    /// # Arguments
    /// * `pool` - The already bootstrapped workers.
    /// * `learner` - The learner owning the parameters.
    pub fn new(pool: P, learner: EsLearner) -> Self {
        Self {
            pool,
            learner,
            collector: Collector::new(),
            iteration: 0,
        }
    }

    pub fn learner(&self) -> &EsLearner {
        &self.learner
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// The amount of finished iterations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Runs one iteration: collect, update, then synchronize filters.
    ///
    /// # Returns
    /// The iteration report, or the first error any stage ran into.
    pub async fn train_iteration(&mut self) -> Result<IterationReport> {
        let min_episodes = self.learner.config().episodes_per_batch;
        let min_timesteps = self.learner.config().train_batch_size;

        let collected = self
            .collector
            .collect(&mut self.pool, self.learner.theta(), min_episodes, min_timesteps)
            .await?;

        let report = self.learner.step(collected)?;
        self.sync_filters().await?;
        self.iteration += 1;

        info!(
            iteration = self.iteration,
            episode_reward_mean = report.episode_reward_mean,
            episode_len_mean = report.episode_len_mean,
            timesteps_total = report.timesteps_total,
            episodes_so_far = report.info.episodes_so_far,
            update_ratio = report.info.update_ratio;
            "iteration finished"
        );

        Ok(report)
    }

    /// Folds every worker's new observations into the canonical filter and
    /// hands the result back to all of them.
    pub async fn sync_filters(&mut self) -> Result<()> {
        let states = self.pool.get_filters(true).await?;
        let canonical = self.learner.merge_filters(&states)?;
        self.pool.sync_filters(&canonical).await
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.learner.checkpoint()
    }

    /// Restores the learner from `checkpoint` and pushes its filter to every worker.
    pub async fn restore(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.learner.restore(checkpoint)?;

        let state = self.learner.filter().as_serializable();
        self.pool.sync_filters(&state).await?;

        info!(
            episodes_so_far = self.learner.episodes_so_far();
            "restored checkpoint"
        );

        Ok(())
    }

    /// Stops every worker.
    ///
    /// # Returns
    /// The final parameters.
    pub async fn shutdown(self) -> Result<Vec<f32>> {
        let Self { pool, learner, .. } = self;
        pool.shutdown().await?;
        Ok(learner.theta().to_vec())
    }
}
