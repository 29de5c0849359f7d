use super::Optimizer;
use crate::{EsErr, Result};

#[derive(Debug)]
pub struct Adam {
    stepsize: f32,
    beta1: f32,
    beta2: f32,
    beta1_t: f32,
    beta2_t: f32,
    m: Box<[f32]>,
    v: Box<[f32]>,
    epsilon: f32,
    t: u64,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `stepsize` - The coefficient that modulates the size of every update.
    /// * `beta1`, `beta2`, `epsilon` - Hyperparameters to the optimization algorithm.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new(len: usize, stepsize: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            stepsize,
            beta1,
            beta2,
            beta1_t: 1.,
            beta2_t: 1.,
            m: vec![0.; len].into_boxed_slice(),
            v: vec![0.; len].into_boxed_slice(),
            epsilon,
            t: 0,
        }
    }
}

impl Optimizer for Adam {
    fn compute_step(&mut self, direction: &[f32]) -> Result<Vec<f32>> {
        EsErr::check("adam moments length", direction.len(), self.m.len())?;

        let Self {
            stepsize: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;

        self.t += 1;
        self.beta1_t *= b1;
        self.beta2_t *= b2;

        let a = lr * (1. - self.beta2_t).sqrt() / (1. - self.beta1_t);

        let step = direction
            .iter()
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
            .map(|((d, m), v)| {
                *m = b1 * *m + (1. - b1) * d;
                *v = b2 * *v + (1. - b2) * d * d;
                -a * *m / (v.sqrt() + eps)
            })
            .collect();

        Ok(step)
    }

    fn step_count(&self) -> u64 {
        self.t
    }
}
