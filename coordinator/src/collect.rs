use std::sync::Arc;

use es_core::{Collected, EsErr};
use log::{debug, info};

use crate::{Result, pool::RolloutPool};

/// Runs whole rounds on a pool until an iteration's quotas are met.
///
/// Rounds are numbered from 1 across the whole session, every bundle must
/// carry the number of the round it answers.
#[derive(Debug, Default)]
pub struct Collector {
    round: u64,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of the last round run.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Collects at least `min_episodes` perturbed episodes and `min_timesteps` steps.
    ///
    /// Rounds are never cut short, so an iteration usually overshoots its
    /// quotas by up to one round.
    ///
    /// # Arguments
    /// * `pool` - The workers to broadcast to.
    /// * `params` - The parameters every round evaluates.
    /// * `min_episodes` - The perturbed episodes quota.
    /// * `min_timesteps` - The perturbed timesteps quota.
    ///
    /// # Returns
    /// Every bundle gathered, or the first failure of any round.
    pub async fn collect<P: RolloutPool>(
        &mut self,
        pool: &mut P,
        params: &[f32],
        min_episodes: usize,
        min_timesteps: usize,
    ) -> Result<Collected> {
        let params: Arc<[f32]> = params.into();
        let mut collected = Collected::default();

        while collected.episodes < min_episodes || collected.timesteps < min_timesteps {
            self.round += 1;
            let bundles = pool.run_round(Arc::clone(&params)).await?;
            let (episodes, timesteps) = (collected.episodes, collected.timesteps);

            for bundle in bundles {
                EsErr::check("bundle round", bundle.round as usize, self.round as usize)?;

                if !bundle.is_consistent() {
                    return Err(EsErr::Consistency {
                        what: "bundle records",
                        got: bundle.returns.len(),
                        expected: bundle.noise_indices.len(),
                    }
                    .into());
                }

                collected.episodes += bundle.episodes();
                collected.timesteps += bundle.timesteps();
                collected.bundles.push(bundle);
            }

            // A round that adds nothing to an unmet quota would repeat forever.
            if collected.episodes == episodes && episodes < min_episodes {
                return Err(EsErr::Consistency {
                    what: "episodes added by round",
                    got: 0,
                    expected: min_episodes - episodes,
                }
                .into());
            }

            if collected.timesteps == timesteps && timesteps < min_timesteps {
                return Err(EsErr::Consistency {
                    what: "timesteps added by round",
                    got: 0,
                    expected: min_timesteps - timesteps,
                }
                .into());
            }

            info!(
                round = self.round,
                episodes = collected.episodes,
                timesteps = collected.timesteps;
                "round collected"
            );
        }

        debug!(
            episodes = collected.episodes,
            timesteps = collected.timesteps,
            bundles = collected.bundles.len();
            "collected iteration results"
        );

        Ok(collected)
    }
}
