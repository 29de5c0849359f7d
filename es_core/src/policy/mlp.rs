use ndarray::Array1;
use rand::rngs::StdRng;

use super::{ActionHead, Policy, dense, dense_size, normc_init};
use crate::{EsErr, Result, env::Action};

/// A feed forward network with `tanh` hidden layers and a linear output layer.
#[derive(Debug)]
pub struct MlpPolicy {
    dims: Vec<(usize, usize)>,
    params: Vec<f32>,
    head: ActionHead,
}

impl MlpPolicy {
    pub(crate) fn new(
        observation_dim: usize,
        hidden: &[usize],
        out_dim: usize,
        head: ActionHead,
        rng: &mut StdRng,
    ) -> Self {
        let sizes: Vec<usize> = std::iter::once(observation_dim)
            .chain(hidden.iter().copied())
            .chain(std::iter::once(out_dim))
            .collect();
        let dims: Vec<(usize, usize)> = sizes.windows(2).map(|w| (w[0], w[1])).collect();

        let mut params = Vec::with_capacity(dims.iter().copied().map(dense_size).sum());
        for (i, &dim) in dims.iter().enumerate() {
            let std = if i + 1 == dims.len() { 0.01 } else { 1.0 };
            normc_init(dim, std, rng, &mut params);
        }

        Self { dims, params, head }
    }
}

impl Policy for MlpPolicy {
    fn num_parameters(&self) -> usize {
        self.params.len()
    }

    fn get_flat_parameters(&self) -> &[f32] {
        &self.params
    }

    fn set_flat_parameters(&mut self, params: &[f32]) -> Result<()> {
        EsErr::check("policy parameters", params.len(), self.params.len())?;
        self.params.copy_from_slice(params);
        Ok(())
    }

    fn compute_action(&mut self, observation: &[f32], add_noise: bool) -> Result<Action> {
        let mut x = Array1::from(observation.to_vec());
        let mut offset = 0;

        for (i, &dim) in self.dims.iter().enumerate() {
            let size = dense_size(dim);
            let z = dense(x.view(), &self.params[offset..offset + size], dim)?;
            offset += size;

            x = if i + 1 < self.dims.len() {
                z.mapv_into(f32::tanh)
            } else {
                z
            };
        }

        Ok(self.head.act(x.view(), add_noise))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::env::ActionSpace;

    fn policy(hidden: &[usize]) -> MlpPolicy {
        let space = ActionSpace::Continuous {
            low: vec![-2.0],
            high: vec![2.0],
        };
        let head = ActionHead::new(space, 0.1, StdRng::seed_from_u64(1));
        MlpPolicy::new(3, hidden, 1, head, &mut StdRng::seed_from_u64(2))
    }

    #[test]
    fn counts_every_layer() {
        assert_eq!(policy(&[8, 4]).num_parameters(), 4 * 8 + 9 * 4 + 5);
        assert_eq!(policy(&[]).num_parameters(), 4);
    }

    #[test]
    fn flat_parameters_round_trip() {
        let mut policy = policy(&[5]);
        let params: Vec<f32> = (0..policy.num_parameters()).map(|x| x as f32).collect();

        policy.set_flat_parameters(&params).unwrap();
        assert_eq!(policy.get_flat_parameters(), params.as_slice());
    }

    #[test]
    fn actions_stay_in_bounds() {
        let mut policy = policy(&[16]);
        let params: Vec<f32> = (0..policy.num_parameters()).map(|x| x as f32).collect();
        policy.set_flat_parameters(&params).unwrap();

        let Action::Continuous(action) = policy.compute_action(&[1.0, 2.0, 3.0], false).unwrap()
        else {
            panic!("expected a continuous action");
        };
        assert_eq!(action.len(), 1);
        assert!(action[0].abs() <= 2.0);
    }

    #[test]
    fn same_seed_same_initial_parameters() {
        assert_eq!(
            policy(&[4]).get_flat_parameters(),
            policy(&[4]).get_flat_parameters()
        );
    }
}
