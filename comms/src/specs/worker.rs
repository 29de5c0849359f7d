use serde::{Deserialize, Serialize};

use super::{env::EnvSpec, filter::FilterKind, policy::PolicySpec};

/// Wire-level bootstrap specification for a worker instance.
///
/// This type is exchanged over the network during worker bootstrap, right
/// before the noise table transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub worker_id: usize,
    pub env: EnvSpec,
    pub policy: PolicySpec,
    pub observation_filter: FilterKind,
    pub rollout: RolloutSpec,
    pub seed: Option<u64>,
}

/// The parameters of a worker's batch loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RolloutSpec {
    /// Standard deviation of the parameter perturbations.
    pub noise_stdev: f32,
    /// Probability of spending a rollout on an unperturbed evaluation.
    pub eval_prob: f32,
    /// Standard deviation of the exploration noise added to continuous actions.
    pub action_noise_std: f32,
    /// Minimum wall-clock time a worker keeps sampling per round.
    pub min_task_runtime_secs: f64,
    /// Upper bound on the steps of a single episode.
    pub timestep_limit: Option<usize>,
}
