//! Parametrized policies mapping observations to actions.
//!
//! A policy exposes its parameters as a single flat vector, the unit the
//! optimizer and the perturbations work with.

mod linear;
mod mlp;

pub use comms::specs::policy::PolicySpec;
pub use linear::LinearPolicy;
pub use mlp::MlpPolicy;

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

use crate::{
    EsErr, Result,
    env::{Action, ActionSpace},
};

pub trait Policy: Send {
    fn num_parameters(&self) -> usize;

    fn get_flat_parameters(&self) -> &[f32];

    /// Replaces every parameter, the exact inverse of `get_flat_parameters`.
    ///
    /// # Returns
    /// A `Consistency` error if `params` has the wrong length.
    fn set_flat_parameters(&mut self, params: &[f32]) -> Result<()>;

    /// Computes the action to take after observing `observation`.
    ///
    /// # Arguments
    /// * `observation` - The already filtered observation.
    /// * `add_noise` - Whether to add exploration noise to continuous actions.
    fn compute_action(&mut self, observation: &[f32], add_noise: bool) -> Result<Action>;
}

/// Turns the raw outputs of a network into actions of a given space.
#[derive(Debug)]
pub(crate) struct ActionHead {
    space: ActionSpace,
    action_noise_std: f32,
    rng: StdRng,
}

impl ActionHead {
    pub(crate) fn new(space: ActionSpace, action_noise_std: f32, rng: StdRng) -> Self {
        Self {
            space,
            action_noise_std,
            rng,
        }
    }

    /// Discrete spaces take the arg-max, continuous ones squash with `tanh`
    /// into the bounds and optionally add gaussian noise.
    pub(crate) fn act(&mut self, outputs: ArrayView1<f32>, add_noise: bool) -> Action {
        match &self.space {
            ActionSpace::Discrete(_) => {
                let (best, _) = outputs.iter().enumerate().fold(
                    (0, f32::NEG_INFINITY),
                    |(best, max), (i, &x)| if x > max { (i, x) } else { (best, max) },
                );
                Action::Discrete(best)
            }
            ActionSpace::Continuous { low, high } => {
                let action = outputs
                    .iter()
                    .zip(low.iter().zip(high))
                    .map(|(o, (l, h))| {
                        let a = l + (o.tanh() + 1.) / 2. * (h - l);
                        if add_noise {
                            let n: f32 = self.rng.sample(StandardNormal);
                            a + self.action_noise_std * n
                        } else {
                            a
                        }
                    })
                    .collect();
                Action::Continuous(action)
            }
        }
    }
}

/// Applies the affine map stored in `params` to `x`.
///
/// `params` holds the `(n_in, n_out)` weights in row major order followed by
/// the `n_out` biases.
pub(crate) fn dense(
    x: ArrayView1<f32>,
    params: &[f32],
    (n_in, n_out): (usize, usize),
) -> Result<Array1<f32>> {
    let w_size = n_in * n_out;
    EsErr::check("dense layer parameters", params.len(), w_size + n_out)?;
    EsErr::check("dense layer input", x.len(), n_in)?;

    let w = ArrayView2::from_shape((n_in, n_out), &params[..w_size])
        .map_err(|e| EsErr::rollout(e.to_string()))?;
    let b = ArrayView1::from(&params[w_size..]);

    Ok(x.dot(&w) + b)
}

/// The amount of parameters of a dense layer.
pub(crate) fn dense_size((n_in, n_out): (usize, usize)) -> usize {
    (n_in + 1) * n_out
}

/// Initializes a dense layer with gaussian columns of norm `std` and null biases.
pub(crate) fn normc_init(
    (n_in, n_out): (usize, usize),
    std: f32,
    rng: &mut StdRng,
    out: &mut Vec<f32>,
) {
    let mut w: Vec<f32> = (0..n_in * n_out).map(|_| rng.sample(StandardNormal)).collect();

    for col in 0..n_out {
        let norm = (0..n_in)
            .map(|row| w[row * n_out + col].powi(2))
            .sum::<f32>()
            .sqrt()
            .max(f32::EPSILON);

        for row in 0..n_in {
            w[row * n_out + col] *= std / norm;
        }
    }

    out.extend(w);
    out.extend(std::iter::repeat_n(0., n_out));
}

/// Builds the policy described by `spec`.
///
/// # Arguments
/// * `spec` - The policy backend.
/// * `observation_dim` - The length of the observations.
/// * `action_space` - The environment's action space.
/// * `action_noise_std` - The exploration noise for continuous actions.
/// * `seed` - An optional seed for the initial parameters and the action noise.
///
/// # Returns
/// The policy behind a trait object.
pub fn build_policy(
    spec: &PolicySpec,
    observation_dim: usize,
    action_space: ActionSpace,
    action_noise_std: f32,
    seed: Option<u64>,
) -> Box<dyn Policy> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let out_dim = action_space.dim();
    let head_rng = StdRng::seed_from_u64(rng.random());
    let head = ActionHead::new(action_space, action_noise_std, head_rng);

    match spec {
        PolicySpec::Linear => Box::new(LinearPolicy::new(observation_dim, out_dim, head, &mut rng)),
        PolicySpec::Mlp { hidden } => {
            Box::new(MlpPolicy::new(observation_dim, hidden, out_dim, head, &mut rng))
        }
    }
}
