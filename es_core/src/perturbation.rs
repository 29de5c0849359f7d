use rand::Rng;

use crate::{EsErr, NoiseTable, Result};

/// A scaled noise window, identified by where it starts in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    pub noise_index: usize,
    pub scaled: Vec<f32>,
}

impl Perturbation {
    /// Writes `theta + perturbation` into `out`.
    pub fn add_to(&self, theta: &[f32], out: &mut [f32]) {
        out.iter_mut()
            .zip(theta.iter().zip(&self.scaled))
            .for_each(|(o, (t, e))| *o = t + e);
    }

    /// Writes `theta - perturbation` into `out`.
    pub fn sub_from(&self, theta: &[f32], out: &mut [f32]) {
        out.iter_mut()
            .zip(theta.iter().zip(&self.scaled))
            .for_each(|(o, (t, e))| *o = t - e);
    }
}

/// Draws perturbations sized to the parameter count out of the noise table.
#[derive(Debug, Clone)]
pub struct PerturbationSampler {
    noise: NoiseTable,
    dim: usize,
    noise_stdev: f32,
}

impl PerturbationSampler {
    /// Creates a new `PerturbationSampler`.
    ///
    /// # Arguments
    /// * `noise` - The shared noise table.
    /// * `dim` - The amount of parameters each perturbation covers.
    /// * `noise_stdev` - The scale applied to the raw noise.
    ///
    /// # Returns
    /// A `Bounds` error if the table can't hold a single window of `dim`.
    pub fn new(noise: NoiseTable, dim: usize, noise_stdev: f32) -> Result<Self> {
        if dim > noise.len() {
            return Err(EsErr::Bounds {
                index: 0,
                len: dim,
                table: noise.len(),
            });
        }

        Ok(Self {
            noise,
            dim,
            noise_stdev,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn noise(&self) -> &NoiseTable {
        &self.noise
    }

    /// Samples a new perturbation at a uniformly random index.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Perturbation> {
        let index = self.noise.sample_index(self.dim, rng)?;
        self.at(index)
    }

    /// Rebuilds the perturbation that starts at `noise_index`.
    ///
    /// Two holders of the same table always rebuild the same vector.
    pub fn at(&self, noise_index: usize) -> Result<Perturbation> {
        let window = self.noise.get(noise_index, self.dim)?;
        let scaled = window.iter().map(|x| self.noise_stdev * x).collect();

        Ok(Perturbation {
            noise_index,
            scaled,
        })
    }
}
