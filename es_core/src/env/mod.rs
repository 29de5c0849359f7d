//! Environments a policy is rolled out in.
//!
//! Every environment is driven through the object safe [`Environment`]
//! trait, so the rollout engine never knows which one it is stepping.

mod cartpole;
mod pendulum;

pub use cartpole::CartPole;
pub use comms::specs::env::EnvSpec;
pub use pendulum::Pendulum;

use crate::Result;

/// An action taken by a policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Discrete(usize),
    Continuous(Vec<f32>),
}

/// The set of actions an environment accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionSpace {
    /// One of `n` choices.
    Discrete(usize),
    /// A box bounded element-wise by `low` and `high`.
    Continuous { low: Vec<f32>, high: Vec<f32> },
}

impl ActionSpace {
    /// The amount of outputs a policy needs to produce an action.
    pub fn dim(&self) -> usize {
        match self {
            ActionSpace::Discrete(n) => *n,
            ActionSpace::Continuous { low, .. } => low.len(),
        }
    }
}

/// The outcome of a single environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

pub trait Environment: Send {
    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Applies `action` and advances the episode by one step.
    ///
    /// # Returns
    /// A `Rollout` error if the action doesn't belong to the action space.
    fn step(&mut self, action: &Action) -> Result<StepResult>;

    /// Reseeds the environment's randomness.
    fn seed(&mut self, seed: u64);

    /// The length of every observation.
    fn observation_dim(&self) -> usize;

    fn action_space(&self) -> ActionSpace;

    /// The step limit after which the environment ends an episode on its own.
    fn max_episode_steps(&self) -> Option<usize>;
}

/// Builds the environment described by `spec`.
///
/// # Arguments
/// * `spec` - The environment to build.
/// * `seed` - An optional seed, otherwise seeded from the OS.
///
/// # Returns
/// The environment behind a trait object.
pub fn build_env(spec: EnvSpec, seed: Option<u64>) -> Box<dyn Environment> {
    let mut env: Box<dyn Environment> = match spec {
        EnvSpec::CartPole { max_steps } => Box::new(CartPole::new(max_steps)),
        EnvSpec::Pendulum { max_steps } => Box::new(Pendulum::new(max_steps)),
    };

    if let Some(seed) = seed {
        env.seed(seed);
    }

    env
}
