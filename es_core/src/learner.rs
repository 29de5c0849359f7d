use comms::specs::rollout::ResultBundle;
use log::{debug, info};

use crate::{
    EsErr, NoiseTable, Result,
    aggregate::batched_weighted_sum,
    checkpoint::Checkpoint,
    config::EsConfig,
    env::build_env,
    filter::{FilterState, ObservationFilter},
    optimization::{Optimizer, build_optimizer},
    policy::build_policy,
    ranks::compute_centered_ranks,
    report::{IterationReport, ReportInfo, mean, squared_norm},
};

/// The bundles gathered during one iteration and the quotas they account for.
#[derive(Debug, Default)]
pub struct Collected {
    pub bundles: Vec<ResultBundle>,
    /// Perturbed episodes, two per pair.
    pub episodes: usize,
    /// Steps taken by both legs of every pair.
    pub timesteps: usize,
}

/// Owns the authoritative parameters and turns collected results into updates.
pub struct EsLearner {
    config: EsConfig,
    noise: NoiseTable,
    theta: Vec<f32>,
    optimizer: Box<dyn Optimizer>,
    filter: ObservationFilter,
    episodes_so_far: usize,
    timesteps_total: usize,
    reward_list: Vec<f32>,
}

impl EsLearner {
    /// Creates a new `EsLearner` with the initial parameters of a freshly built policy.
    ///
    /// # Arguments
    /// * `config` - The already validated run configuration.
    /// * `noise` - The shared noise table.
    ///
    /// # Returns
    /// A `Bounds` error if the noise table can't hold the parameters.
    pub fn from_config(config: EsConfig, noise: NoiseTable) -> Result<Self> {
        let env = build_env(config.env, config.seed);
        let policy = build_policy(
            &config.policy,
            env.observation_dim(),
            env.action_space(),
            config.action_noise_std,
            config.seed,
        );

        let theta = policy.get_flat_parameters().to_vec();
        Self::new(config, noise, theta, env.observation_dim())
    }

    /// Creates a new `EsLearner` starting from `theta`.
    pub fn new(
        config: EsConfig,
        noise: NoiseTable,
        theta: Vec<f32>,
        observation_dim: usize,
    ) -> Result<Self> {
        if theta.len() > noise.len() {
            return Err(EsErr::Bounds {
                index: 0,
                len: theta.len(),
                table: noise.len(),
            });
        }

        let optimizer = build_optimizer(config.optimizer, theta.len(), config.stepsize);
        let filter = ObservationFilter::new(config.observation_filter, observation_dim);

        info!(
            num_params = theta.len(),
            noise_size = noise.len();
            "created learner"
        );

        Ok(Self {
            config,
            noise,
            theta,
            optimizer,
            filter,
            episodes_so_far: 0,
            timesteps_total: 0,
            reward_list: Vec::new(),
        })
    }

    pub fn config(&self) -> &EsConfig {
        &self.config
    }

    pub fn noise(&self) -> &NoiseTable {
        &self.noise
    }

    pub fn theta(&self) -> &[f32] {
        &self.theta
    }

    pub fn num_params(&self) -> usize {
        self.theta.len()
    }

    pub fn episodes_so_far(&self) -> usize {
        self.episodes_so_far
    }

    pub fn step_count(&self) -> u64 {
        self.optimizer.step_count()
    }

    /// The canonical observation filter.
    pub fn filter(&self) -> &ObservationFilter {
        &self.filter
    }

    /// Performs one update from everything collected this iteration.
    ///
    /// Returns are replaced by centered ranks, the gradient is estimated as
    /// the rank weighted sum of the noise windows over `2N`, and the optimizer
    /// steps along `-g + l2_coeff * theta`.
    ///
    /// # Arguments
    /// * `collected` - This iteration's bundles and their quotas.
    ///
    /// # Returns
    /// The iteration report, or a `Consistency` error if the bundles disagree
    /// on the amount of records.
    pub fn step(&mut self, collected: Collected) -> Result<IterationReport> {
        let mut noise_indices = Vec::new();
        let mut returns = Vec::new();
        let mut lengths = Vec::new();
        let mut eval_returns = Vec::new();
        let mut eval_lengths = Vec::new();

        for bundle in collected.bundles {
            noise_indices.extend(bundle.noise_indices);
            returns.extend(bundle.returns);
            lengths.extend(bundle.lengths);
            eval_returns.extend(bundle.eval_returns);
            eval_lengths.extend(bundle.eval_lengths);
        }

        EsErr::check("evaluation lengths", eval_lengths.len(), eval_returns.len())?;
        EsErr::check("perturbation returns", returns.len(), noise_indices.len())?;
        EsErr::check("perturbation lengths", lengths.len(), noise_indices.len())?;

        let n = noise_indices.len();
        let p = self.theta.len();
        let timesteps_this_iter = lengths.iter().map(|[pos, neg]| pos + neg).sum();

        EsErr::check("collected episodes", collected.episodes, 2 * n)?;
        EsErr::check("collected timesteps", collected.timesteps, timesteps_this_iter)?;

        let ranks = compute_centered_ranks(&returns);
        let weights: Vec<f32> = ranks.iter().map(|[pos, neg]| pos - neg).collect();
        let vectors = noise_indices.iter().map(|&i| self.noise.get(i, p));

        let (mut g, count) = batched_weighted_sum(&weights, vectors, p, self.config.batch_size)?;
        if n > 0 {
            let size = (2 * n) as f32;
            g.iter_mut().for_each(|x| *x /= size);
        }

        EsErr::check("gradient length", g.len(), p)?;
        EsErr::check("aggregated perturbations", count, n)?;

        let l2 = self.config.l2_coeff;
        let direction: Vec<f32> = g
            .iter()
            .zip(&self.theta)
            .map(|(g, t)| -g + l2 * t)
            .collect();

        let (theta, update_ratio) = self.optimizer.update(&self.theta, &direction)?;
        self.theta = theta;
        self.episodes_so_far += collected.episodes;
        self.timesteps_total += timesteps_this_iter;

        if let Some(eval_mean) = mean(&eval_returns) {
            self.reward_list.push(eval_mean);
        }

        let recent = self.reward_list.len().saturating_sub(self.config.report_length);
        let eval_lengths: Vec<f64> = eval_lengths.iter().map(|&l| l as f64).collect();

        let report = IterationReport {
            episode_reward_mean: mean(&self.reward_list[recent..]),
            episode_len_mean: mean(&eval_lengths),
            timesteps_this_iter,
            timesteps_total: self.timesteps_total,
            info: ReportInfo {
                weights_norm: squared_norm(&self.theta),
                grad_norm: squared_norm(&g),
                update_ratio,
                episodes_this_iter: 2 * n,
                episodes_so_far: self.episodes_so_far,
            },
        };

        debug!(
            pairs = n,
            evals = eval_returns.len(),
            grad_norm = report.info.grad_norm,
            update_ratio = update_ratio;
            "learner step"
        );

        Ok(report)
    }

    /// Merges the buffers of every worker filter into the canonical filter.
    ///
    /// # Arguments
    /// * `states` - The workers' filters, pulled with a flush.
    ///
    /// # Returns
    /// The canonical filter to push back to every worker.
    pub fn merge_filters(&mut self, states: &[FilterState]) -> Result<FilterState> {
        for state in states {
            self.filter.apply_changes(state)?;
        }

        Ok(self.filter.as_serializable())
    }

    /// Snapshots the state needed to resume training.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            weights: self.theta.clone(),
            filter: self.filter.as_serializable(),
            episodes_so_far: self.episodes_so_far,
        }
    }

    /// Restores the weights, the canonical filter and the episode counter.
    ///
    /// The optimizer state isn't part of a checkpoint and starts over.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> Result<()> {
        EsErr::check("checkpoint weights", checkpoint.weights.len(), self.theta.len())?;
        let filter = ObservationFilter::from_state(&checkpoint.filter)?;
        EsErr::check(
            "checkpoint filter dimension",
            filter.running().mean().len(),
            self.filter.running().mean().len(),
        )?;

        self.theta = checkpoint.weights;
        self.filter = filter;
        self.episodes_so_far = checkpoint.episodes_so_far;
        Ok(())
    }
}
