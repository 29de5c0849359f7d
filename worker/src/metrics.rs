use std::time::Duration;

use comms::specs::rollout::ResultBundle;

#[derive(Debug, Default, Clone)]
pub struct WorkerMetrics {
    pub compute_time: Duration,

    pub rounds: u64,
    pub failed_rounds: u64,
    pub pairs: u64,
    pub eval_episodes: u64,
    pub timesteps: u64,
}

impl WorkerMetrics {
    /// Accounts for a successful round.
    pub fn add_bundle(&mut self, bundle: &ResultBundle, elapsed: Duration) {
        self.rounds += 1;
        self.pairs += bundle.pairs() as u64;
        self.eval_episodes += bundle.eval_returns.len() as u64;
        self.timesteps += bundle.timesteps() as u64;
        self.compute_time += elapsed;
    }

    #[inline]
    pub fn bump_failed(&mut self) {
        self.rounds += 1;
        self.failed_rounds += 1;
    }
}
