use std::time::{Duration, Instant};

use comms::specs::{
    rollout::{ResultBundle, RolloutResult},
    worker::{RolloutSpec, WorkerSpec},
};
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    EsErr, NoiseTable, Result,
    env::{Environment, build_env},
    filter::{FilterState, ObservationFilter},
    perturbation::PerturbationSampler,
    policy::{Policy, build_policy},
    rollout::{Rollout, rollout},
};

/// Runs mirrored perturbation rollouts for one worker.
///
/// Holds its own environment, policy and observation filter, and a handle
/// to the shared noise table. Nothing here is shared with other workers.
pub struct RolloutWorker {
    worker_id: usize,
    env: Box<dyn Environment>,
    policy: Box<dyn Policy>,
    filter: ObservationFilter,
    sampler: PerturbationSampler,
    spec: RolloutSpec,
    rng: StdRng,
    round: u64,
    buf: Vec<f32>,
}

impl RolloutWorker {
    /// Creates a new `RolloutWorker` from its bootstrap specification.
    ///
    /// # Arguments
    /// * `spec` - The worker's specification.
    /// * `noise` - The shared noise table.
    ///
    /// # Returns
    /// A `Bounds` error if the noise table is smaller than the policy.
    pub fn new(spec: &WorkerSpec, noise: NoiseTable) -> Result<Self> {
        let env = build_env(spec.env, spec.seed);
        let policy = build_policy(
            &spec.policy,
            env.observation_dim(),
            env.action_space(),
            spec.rollout.action_noise_std,
            spec.seed,
        );

        Self::with_parts(spec, env, policy, noise)
    }

    /// Creates a new `RolloutWorker` around an already built environment and policy.
    pub fn with_parts(
        spec: &WorkerSpec,
        env: Box<dyn Environment>,
        policy: Box<dyn Policy>,
        noise: NoiseTable,
    ) -> Result<Self> {
        let num_params = policy.num_parameters();
        let sampler = PerturbationSampler::new(noise, num_params, spec.rollout.noise_stdev)?;
        let filter = ObservationFilter::new(spec.observation_filter, env.observation_dim());

        let rng = match spec.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            worker_id: spec.worker_id,
            env,
            policy,
            filter,
            sampler,
            spec: spec.rollout,
            rng,
            round: 0,
            buf: vec![0.; num_params],
        })
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn num_params(&self) -> usize {
        self.buf.len()
    }

    /// The number of the last round, failed rounds included.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Continues the round numbering of a worker this one replaces.
    pub fn resume_from(&mut self, round: u64) {
        self.round = round;
    }

    /// Collects results for one round with the parameters `params`.
    ///
    /// Keeps sampling until at least one perturbation pair was collected and
    /// the minimum task runtime elapsed. Each iteration is an evaluation
    /// episode with probability `eval_prob`, a mirrored pair otherwise.
    ///
    /// # Arguments
    /// * `params` - The coordinator's current parameters.
    /// * `timestep_limit` - A step limit overriding the configured one.
    ///
    /// # Returns
    /// This round's results, or the first error any episode ran into.
    pub fn do_rollouts(
        &mut self,
        params: &[f32],
        timestep_limit: Option<usize>,
    ) -> Result<ResultBundle> {
        self.round += 1;
        EsErr::check("broadcast parameters", params.len(), self.num_params())?;
        self.policy.set_flat_parameters(params)?;

        let limit = timestep_limit.or(self.spec.timestep_limit);
        let min_runtime = Duration::from_secs_f64(self.spec.min_task_runtime_secs);
        let mut bundle = ResultBundle::new(self.worker_id, self.round);
        let start = Instant::now();

        while bundle.pairs() == 0 || start.elapsed() < min_runtime {
            let result = if self.rng.random::<f32>() < self.spec.eval_prob {
                self.evaluate(params, limit)?
            } else {
                self.perturbed_pair(params, limit)?
            };

            bundle.push(result);
        }

        debug!(
            worker_id = self.worker_id,
            round = self.round,
            pairs = bundle.pairs(),
            evals = bundle.eval_returns.len();
            "finished rollouts"
        );

        Ok(bundle)
    }

    fn evaluate(&mut self, params: &[f32], limit: Option<usize>) -> Result<RolloutResult> {
        self.policy.set_flat_parameters(params)?;
        let res = rollout(
            self.policy.as_mut(),
            self.env.as_mut(),
            &mut self.filter,
            limit,
            false,
        )?;

        Ok(RolloutResult::Eval {
            ret: episode_return(&res)?,
            length: res.len(),
        })
    }

    fn perturbed_pair(&mut self, params: &[f32], limit: Option<usize>) -> Result<RolloutResult> {
        let perturbation = self.sampler.sample(&mut self.rng)?;

        perturbation.add_to(params, &mut self.buf);
        self.policy.set_flat_parameters(&self.buf)?;
        let pos = rollout(
            self.policy.as_mut(),
            self.env.as_mut(),
            &mut self.filter,
            limit,
            true,
        )?;

        perturbation.sub_from(params, &mut self.buf);
        self.policy.set_flat_parameters(&self.buf)?;
        let neg = rollout(
            self.policy.as_mut(),
            self.env.as_mut(),
            &mut self.filter,
            limit,
            true,
        )?;

        Ok(RolloutResult::Perturbation {
            noise_index: perturbation.noise_index,
            return_pos: episode_return(&pos)?,
            return_neg: episode_return(&neg)?,
            sign_return_pos: pos.sign_sum(),
            sign_return_neg: neg.sign_sum(),
            length_pos: pos.len(),
            length_neg: neg.len(),
        })
    }

    /// The serialized observation filter, optionally clearing its buffer.
    pub fn get_filter(&mut self, flush: bool) -> FilterState {
        if flush {
            self.filter.flush()
        } else {
            self.filter.as_serializable()
        }
    }

    /// Replaces the observation filter's statistics with the canonical ones.
    pub fn sync_filter(&mut self, state: &FilterState) -> Result<()> {
        self.filter.sync(state)
    }
}

/// The episode's return, which must be finite to be reported.
fn episode_return(episode: &Rollout) -> Result<f32> {
    let ret = episode.sum();
    if !ret.is_finite() {
        return Err(EsErr::rollout(format!(
            "episode of {} steps returned {ret}",
            episode.len()
        )));
    }

    Ok(ret)
}
