use super::Optimizer;
use crate::{EsErr, Result};

/// Gradient descent with an exponentially averaged velocity.
#[derive(Debug)]
pub struct SgdMomentum {
    stepsize: f32,
    momentum: f32,
    velocity: Box<[f32]>,
    t: u64,
}

impl SgdMomentum {
    /// Creates a new `SgdMomentum` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `stepsize` - The coefficient that modulates the size of every update.
    /// * `momentum` - The weight given to the previous velocity.
    ///
    /// # Returns
    /// A new `SgdMomentum` instance.
    pub fn new(len: usize, stepsize: f32, momentum: f32) -> Self {
        Self {
            stepsize,
            momentum,
            velocity: vec![0.; len].into_boxed_slice(),
            t: 0,
        }
    }
}

impl Optimizer for SgdMomentum {
    fn compute_step(&mut self, direction: &[f32]) -> Result<Vec<f32>> {
        EsErr::check("velocity length", direction.len(), self.velocity.len())?;

        let lr = self.stepsize;
        let mu = self.momentum;
        self.t += 1;

        let step = direction
            .iter()
            .zip(self.velocity.iter_mut())
            .map(|(d, v)| {
                *v = mu * *v + (1. - mu) * d;
                -lr * *v
            })
            .collect();

        Ok(step)
    }

    fn step_count(&self) -> u64 {
        self.t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_accumulates() {
        let mut opt = SgdMomentum::new(1, 0.1, 0.5);

        let first = opt.compute_step(&[1.0]).unwrap();
        let second = opt.compute_step(&[1.0]).unwrap();

        assert!((first[0] + 0.05).abs() < 1e-7);
        assert!((second[0] + 0.075).abs() < 1e-7);
        assert_eq!(opt.step_count(), 2);
    }

    #[test]
    fn zero_direction_leaves_theta_unchanged() {
        let mut opt = SgdMomentum::new(2, 0.01, 0.9);
        let (theta, _) = opt.update(&[1.0, 2.0], &[0.; 2]).unwrap();
        assert_eq!(theta, vec![1.0, 2.0]);
    }
}
