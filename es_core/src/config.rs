use serde::{Deserialize, Serialize};

use comms::specs::{
    env::EnvSpec,
    filter::FilterKind,
    policy::PolicySpec,
    worker::{RolloutSpec, WorkerSpec},
};

use crate::{EsErr, Result, noise::DEFAULT_NOISE_SEED};

/// The specification for the `Optimizer` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam { beta1: f32, beta2: f32, epsilon: f32 },
    SgdMomentum { momentum: f32 },
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self::Adam {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

/// Options that only apply to evaluation workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub num_envs_per_worker: usize,
    pub observation_filter: FilterKind,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            num_envs_per_worker: 1,
            observation_filter: FilterKind::NoFilter,
        }
    }
}

/// Every option of an evolution strategies run.
///
/// Missing fields take their default value when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsConfig {
    /// Standard deviation of the noise added to continuous actions.
    pub action_noise_std: f32,
    /// Weight decay applied to the parameters every step.
    pub l2_coeff: f32,
    /// Standard deviation of the parameter perturbations.
    pub noise_stdev: f32,
    /// Minimum perturbed episodes per iteration.
    pub episodes_per_batch: usize,
    /// Minimum perturbed timesteps per iteration.
    pub train_batch_size: usize,
    pub eval_prob: f32,
    pub stepsize: f32,
    /// Floats in the shared noise table.
    pub noise_size: usize,
    pub noise_seed: u64,
    /// Evaluation means averaged in the reported reward.
    pub report_length: usize,
    pub num_workers: usize,
    pub num_gpus: usize,
    pub min_task_runtime_secs: f64,
    pub timestep_limit: Option<usize>,
    /// Noise windows reconstructed at once while aggregating.
    pub batch_size: usize,
    pub optimizer: OptimizerSpec,
    pub observation_filter: FilterKind,
    pub evaluation: EvaluationConfig,
    pub env: EnvSpec,
    pub policy: PolicySpec,
    pub seed: Option<u64>,
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            action_noise_std: 0.01,
            l2_coeff: 0.005,
            noise_stdev: 0.02,
            episodes_per_batch: 1000,
            train_batch_size: 10_000,
            eval_prob: 0.03,
            stepsize: 0.01,
            noise_size: 250_000_000,
            noise_seed: DEFAULT_NOISE_SEED,
            report_length: 10,
            num_workers: 10,
            num_gpus: 0,
            min_task_runtime_secs: 0.2,
            timestep_limit: None,
            batch_size: 500,
            optimizer: OptimizerSpec::default(),
            observation_filter: FilterKind::MeanStd,
            evaluation: EvaluationConfig::default(),
            env: EnvSpec::default(),
            policy: PolicySpec::default(),
            seed: None,
        }
    }
}

impl EsConfig {
    /// Checks every option once, before anything is built.
    ///
    /// # Returns
    /// A `Config` error naming the first invalid option.
    pub fn validate(&self) -> Result<()> {
        if self.num_gpus > 1 {
            return Err(EsErr::config("`num_gpus` > 1 is not supported"));
        }

        if self.num_workers == 0 {
            return Err(EsErr::config("`num_workers` must be > 0"));
        }

        if self.evaluation.num_envs_per_worker != 1 {
            return Err(EsErr::config(
                "`evaluation.num_envs_per_worker` must always be 1",
            ));
        }

        if self.evaluation.observation_filter != FilterKind::NoFilter {
            return Err(EsErr::config(
                "`evaluation.observation_filter` must always be `no_filter`",
            ));
        }

        let positive = [
            ("noise_stdev", self.noise_stdev),
            ("stepsize", self.stepsize),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.) {
                return Err(EsErr::config(format!("`{name}` must be > 0, got {value}")));
            }
        }

        let non_negative = [
            ("l2_coeff", self.l2_coeff),
            ("action_noise_std", self.action_noise_std),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.) {
                return Err(EsErr::config(format!("`{name}` must be >= 0, got {value}")));
            }
        }

        if !(0. ..=1.).contains(&self.eval_prob) {
            return Err(EsErr::config(format!(
                "`eval_prob` must be in [0, 1], got {}",
                self.eval_prob
            )));
        }

        if !(self.min_task_runtime_secs.is_finite() && self.min_task_runtime_secs >= 0.) {
            return Err(EsErr::config("`min_task_runtime_secs` must be >= 0"));
        }

        let counts = [
            ("noise_size", self.noise_size),
            ("batch_size", self.batch_size),
            ("report_length", self.report_length),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(EsErr::config(format!("`{name}` must be > 0")));
            }
        }

        if self.timestep_limit == Some(0) {
            return Err(EsErr::config("`timestep_limit` must be > 0"));
        }

        match self.env {
            EnvSpec::CartPole { max_steps: 0 } | EnvSpec::Pendulum { max_steps: 0 } => {
                return Err(EsErr::config("environment `max_steps` must be > 0"));
            }
            _ => {}
        }

        match self.optimizer {
            OptimizerSpec::SgdMomentum { momentum } if !(0. ..1.).contains(&momentum) => {
                return Err(EsErr::config(format!(
                    "`momentum` must be in [0, 1), got {momentum}"
                )));
            }
            _ => {}
        }

        match &self.policy {
            PolicySpec::Mlp { hidden } if hidden.contains(&0) => {
                return Err(EsErr::config("mlp hidden layers can't be empty"));
            }
            _ => {}
        }

        Ok(())
    }

    /// The batch loop options sent to every worker.
    pub fn rollout_spec(&self) -> RolloutSpec {
        RolloutSpec {
            noise_stdev: self.noise_stdev,
            eval_prob: self.eval_prob,
            action_noise_std: self.action_noise_std,
            min_task_runtime_secs: self.min_task_runtime_secs,
            timestep_limit: self.timestep_limit,
        }
    }

    /// The bootstrap specification of the worker `worker_id`.
    ///
    /// Seeded runs give every worker its own seed derived from `seed`.
    pub fn worker_spec(&self, worker_id: usize) -> WorkerSpec {
        WorkerSpec {
            worker_id,
            env: self.env,
            policy: self.policy.clone(),
            observation_filter: self.observation_filter,
            rollout: self.rollout_spec(),
            seed: self.seed.map(|s| s.wrapping_add(1000 * (worker_id as u64 + 1))),
        }
    }
}
