use crate::{EsErr, Result};

/// Defines how the parameters advance given an ascent direction.
///
/// Implementors only compute the step; `update` applies it and reports how
/// big it was relative to the parameters.
pub trait Optimizer: Send {
    /// Computes the step for `direction`, advancing the internal state.
    ///
    /// # Arguments
    /// * `direction` - The descent direction, `-g + l2_coeff * theta`.
    ///
    /// # Returns
    /// The step to add to the parameters, of the same length as `direction`.
    fn compute_step(&mut self, direction: &[f32]) -> Result<Vec<f32>>;

    /// The amount of updates applied so far.
    fn step_count(&self) -> u64;

    /// Advances `theta` along `direction`.
    ///
    /// # Arguments
    /// * `theta` - The current parameters.
    /// * `direction` - The descent direction.
    ///
    /// # Returns
    /// The new parameters and the ratio `||step|| / ||theta||`, `0` for null parameters.
    fn update(&mut self, theta: &[f32], direction: &[f32]) -> Result<(Vec<f32>, f32)> {
        EsErr::check("direction length", direction.len(), theta.len())?;

        let step = self.compute_step(direction)?;
        let theta_norm = norm(theta);
        let ratio = if theta_norm > 0. {
            norm(&step) / theta_norm
        } else {
            0.
        };

        let new_theta = theta.iter().zip(&step).map(|(t, s)| t + s).collect();
        Ok((new_theta, ratio))
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
