use serde::{Deserialize, Serialize};

/// A single record produced by a worker's batch loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RolloutResult {
    /// An episode run with the unperturbed parameters.
    Eval { ret: f32, length: usize },
    /// A mirrored pair of episodes run with `theta + e` and `theta - e`.
    Perturbation {
        noise_index: usize,
        return_pos: f32,
        return_neg: f32,
        sign_return_pos: f32,
        sign_return_neg: f32,
        length_pos: usize,
        length_neg: usize,
    },
}

/// Everything one worker collected during one round.
///
/// Perturbations are identified by their noise table index only, the
/// coordinator rebuilds the vectors from its own copy of the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub worker_id: usize,
    pub round: u64,
    pub noise_indices: Vec<usize>,
    pub returns: Vec<[f32; 2]>,
    pub sign_returns: Vec<[f32; 2]>,
    pub lengths: Vec<[usize; 2]>,
    pub eval_returns: Vec<f32>,
    pub eval_lengths: Vec<usize>,
}

impl ResultBundle {
    /// Creates an empty bundle for `worker_id`'s `round`.
    pub fn new(worker_id: usize, round: u64) -> Self {
        Self {
            worker_id,
            round,
            ..Default::default()
        }
    }

    /// Appends a record to the matching accumulators.
    pub fn push(&mut self, result: RolloutResult) {
        match result {
            RolloutResult::Eval { ret, length } => {
                self.eval_returns.push(ret);
                self.eval_lengths.push(length);
            }
            RolloutResult::Perturbation {
                noise_index,
                return_pos,
                return_neg,
                sign_return_pos,
                sign_return_neg,
                length_pos,
                length_neg,
            } => {
                self.noise_indices.push(noise_index);
                self.returns.push([return_pos, return_neg]);
                self.sign_returns.push([sign_return_pos, sign_return_neg]);
                self.lengths.push([length_pos, length_neg]);
            }
        }
    }

    /// The amount of perturbation pairs in this bundle.
    pub fn pairs(&self) -> usize {
        self.noise_indices.len()
    }

    /// Perturbed episodes, two per pair.
    pub fn episodes(&self) -> usize {
        self.lengths.len() * 2
    }

    /// Steps taken by both legs of every pair.
    pub fn timesteps(&self) -> usize {
        self.lengths.iter().map(|[pos, neg]| pos + neg).sum()
    }

    /// Whether every per-pair list and the eval lists have matching lengths.
    pub fn is_consistent(&self) -> bool {
        let n = self.noise_indices.len();
        self.returns.len() == n
            && self.sign_returns.len() == n
            && self.lengths.len() == n
            && self.eval_returns.len() == self.eval_lengths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_two_episodes_per_pair() {
        let mut bundle = ResultBundle::new(3, 7);
        bundle.push(RolloutResult::Perturbation {
            noise_index: 10,
            return_pos: 2.0,
            return_neg: -2.0,
            sign_return_pos: 2.0,
            sign_return_neg: -2.0,
            length_pos: 4,
            length_neg: 6,
        });
        bundle.push(RolloutResult::Eval { ret: 1.5, length: 9 });

        assert_eq!(bundle.pairs(), 1);
        assert_eq!(bundle.episodes(), 2);
        assert_eq!(bundle.timesteps(), 10);
        assert_eq!(bundle.eval_lengths, vec![9]);
        assert!(bundle.is_consistent());
    }

    #[test]
    fn detects_ragged_lists() {
        let mut bundle = ResultBundle::new(0, 0);
        bundle.noise_indices.push(1);
        assert!(!bundle.is_consistent());
    }
}
