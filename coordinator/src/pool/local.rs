use std::sync::Arc;

use comms::specs::{filter::FilterState, rollout::ResultBundle, worker::WorkerSpec};
use es_core::{EsConfig, NoiseTable, RolloutWorker};
use log::{debug, info, warn};
use tokio::task;

use crate::{CoordinatorError, Result, pool::RolloutPool};

/// Rollout workers running in process, each round on tokio's blocking pool.
pub struct LocalPool {
    workers: Vec<RolloutWorker>,
    specs: Vec<WorkerSpec>,
    noise: NoiseTable,
    round: u64,
}

impl LocalPool {
    /// Creates a new `LocalPool` of `config.num_workers` workers.
    ///
    /// Every worker shares `noise` instead of holding its own copy.
    ///
    /// # Arguments
    /// * `config` - The run configuration.
    /// * `noise` - The shared noise table.
    ///
    /// # Returns
    /// A new pool, or a `Bounds` error if the table can't hold the parameters.
    pub fn new(config: &EsConfig, noise: &NoiseTable) -> Result<Self> {
        let specs: Vec<_> = (0..config.num_workers)
            .map(|worker_id| config.worker_spec(worker_id))
            .collect();

        let workers = specs
            .iter()
            .map(|spec| RolloutWorker::new(spec, noise.clone()))
            .collect::<es_core::Result<Vec<_>>>()?;

        info!(workers = workers.len(); "created local worker pool");
        Ok(Self {
            workers,
            specs,
            noise: noise.clone(),
            round: 0,
        })
    }
}

impl RolloutPool for LocalPool {
    fn num_workers(&self) -> usize {
        self.workers.len()
    }

    async fn run_round(&mut self, params: Arc<[f32]>) -> Result<Vec<ResultBundle>> {
        self.round += 1;

        let handles: Vec<_> = self
            .workers
            .drain(..)
            .map(|mut worker| {
                let params = Arc::clone(&params);
                task::spawn_blocking(move || {
                    let res = worker.do_rollouts(&params, None);
                    (worker, res)
                })
            })
            .collect();

        let mut bundles = Vec::with_capacity(handles.len());
        let mut failure = None;

        for (slot, handle) in handles.into_iter().enumerate() {
            let (worker, res) = match handle.await {
                Ok(out) => out,
                Err(e) => {
                    // The worker went down with its task, start over from its spec.
                    let spec = &self.specs[slot];
                    warn!(worker_id = spec.worker_id; "rollout task failed: {e}");
                    let mut rebuilt = RolloutWorker::new(spec, self.noise.clone())?;
                    rebuilt.resume_from(self.round);
                    self.workers.push(rebuilt);
                    failure.get_or_insert(CoordinatorError::RolloutFailure {
                        worker_id: spec.worker_id,
                        msg: e.to_string(),
                    });
                    continue;
                }
            };

            match res {
                Ok(bundle) => bundles.push(bundle),
                Err(e) => {
                    failure.get_or_insert(CoordinatorError::RolloutFailure {
                        worker_id: worker.worker_id(),
                        msg: e.to_string(),
                    });
                }
            }

            self.workers.push(worker);
        }

        if let Some(e) = failure {
            return Err(e);
        }

        debug!(bundles = bundles.len(); "local round finished");
        Ok(bundles)
    }

    async fn get_filters(&mut self, flush: bool) -> Result<Vec<FilterState>> {
        Ok(self
            .workers
            .iter_mut()
            .map(|worker| worker.get_filter(flush))
            .collect())
    }

    async fn sync_filters(&mut self, state: &FilterState) -> Result<()> {
        for worker in &mut self.workers {
            worker.sync_filter(state)?;
        }

        Ok(())
    }

    async fn shutdown(self) -> Result<()> {
        info!(workers = self.workers.len(); "local worker pool stopped");
        Ok(())
    }
}
