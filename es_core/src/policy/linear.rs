use ndarray::ArrayView1;
use rand::rngs::StdRng;

use super::{ActionHead, Policy, dense, dense_size, normc_init};
use crate::{EsErr, Result, env::Action};

/// A single affine map from observations to action outputs.
#[derive(Debug)]
pub struct LinearPolicy {
    dim: (usize, usize),
    params: Vec<f32>,
    head: ActionHead,
}

impl LinearPolicy {
    pub(crate) fn new(
        observation_dim: usize,
        out_dim: usize,
        head: ActionHead,
        rng: &mut StdRng,
    ) -> Self {
        let dim = (observation_dim, out_dim);
        let mut params = Vec::with_capacity(dense_size(dim));
        normc_init(dim, 0.01, rng, &mut params);

        Self { dim, params, head }
    }
}

impl Policy for LinearPolicy {
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
        let out = dense(ArrayView1::from(observation), &self.params, self.dim)?;
        Ok(self.head.act(out.view(), add_noise))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::env::ActionSpace;

    fn policy() -> LinearPolicy {
        let mut rng = StdRng::seed_from_u64(3);
        let head = ActionHead::new(ActionSpace::Discrete(2), 0., StdRng::seed_from_u64(4));
        LinearPolicy::new(4, 2, head, &mut rng)
    }

    #[test]
    fn flat_parameters_round_trip() {
        let mut policy = policy();
        assert_eq!(policy.num_parameters(), 10);

        let params: Vec<f32> = (0..10).map(|x| x as f32 * 0.1).collect();
        policy.set_flat_parameters(&params).unwrap();
        assert_eq!(policy.get_flat_parameters(), params.as_slice());
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        let mut policy = policy();
        assert!(matches!(
            policy.set_flat_parameters(&[0.; 9]),
            Err(EsErr::Consistency { .. })
        ));
    }

    #[test]
    fn acts_on_the_sign_of_the_outputs() {
        let mut policy = policy();
        // Output 1 is the first observation, output 0 its opposite.
        let mut params = vec![0.; 10];
        params[0] = -1.;
        params[1] = 1.;
        policy.set_flat_parameters(&params).unwrap();

        let right = policy.compute_action(&[1.0, 0., 0., 0.], false).unwrap();
        let left = policy.compute_action(&[-1.0, 0., 0., 0.], false).unwrap();
        assert_eq!(right, Action::Discrete(1));
        assert_eq!(left, Action::Discrete(0));
    }

    #[test]
    fn wrong_observation_length_fails() {
        let mut policy = policy();
        assert!(policy.compute_action(&[1.0, 2.0], false).is_err());
    }
}
