use crate::{
    Result,
    env::Environment,
    filter::ObservationFilter,
    policy::Policy,
};

/// The rewards of a single episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rollout {
    pub rewards: Vec<f32>,
}

impl Rollout {
    /// The amount of steps the episode lasted.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// The episode's return.
    pub fn sum(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// The sum of the signs of the rewards, null rewards count as `0`.
    pub fn sign_sum(&self) -> f32 {
        self.rewards
            .iter()
            .map(|&r| {
                if r > 0. {
                    1.
                } else if r < 0. {
                    -1.
                } else {
                    0.
                }
            })
            .sum()
    }
}

/// Runs a single episode of `policy` in `env`.
///
/// Every observation goes through `filter`, updating its statistics, before
/// reaching the policy. The episode ends when the environment says so or
/// after `max_steps` steps, whichever comes first.
///
/// # Arguments
/// * `policy` - The policy, already loaded with the parameters to evaluate.
/// * `env` - The environment.
/// * `filter` - The observation filter.
/// * `max_steps` - An optional step limit on top of the environment's own.
/// * `add_noise` - Whether to add exploration noise to the actions.
///
/// # Returns
/// The per-step rewards, or the first environment or policy error.
pub fn rollout(
    policy: &mut dyn Policy,
    env: &mut dyn Environment,
    filter: &mut ObservationFilter,
    max_steps: Option<usize>,
    add_noise: bool,
) -> Result<Rollout> {
    let limit = match (max_steps, env.max_episode_steps()) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b).unwrap_or(usize::MAX),
    };

    let mut rewards = Vec::new();
    let mut observation = env.reset()?;

    while rewards.len() < limit {
        let filtered = filter.filter(&observation, true);
        let action = policy.compute_action(&filtered, add_noise)?;
        let step = env.step(&action)?;

        rewards.push(step.reward);
        observation = step.observation;

        if step.done {
            break;
        }
    }

    Ok(Rollout { rewards })
}
