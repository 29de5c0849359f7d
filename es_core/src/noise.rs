use std::{fmt, sync::Arc};

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::{EsErr, Result};

/// The seed used for the noise table unless configured otherwise.
pub const DEFAULT_NOISE_SEED: u64 = 123;

/// Floats generated by each independently seeded block.
///
/// Changing it changes the content of every table, keep it fixed.
const BLOCK_SIZE: usize = 1 << 16;

/// A large immutable pool of standard normal samples.
///
/// Perturbations are windows into this table, identified by their start
/// index. Clones share the same buffer.
#[derive(Clone)]
pub struct NoiseTable {
    noise: Arc<[f32]>,
}

impl NoiseTable {
    /// Creates a new `NoiseTable` filled with standard normal samples.
    ///
    /// The table is generated in fixed-size blocks in parallel, each block
    /// from its own generator derived from `seed`. The content depends only
    /// on `count` and `seed`.
    ///
    /// # Arguments
    /// * `count` - The amount of floats in the table.
    /// * `seed` - The seed the blocks derive their generators from.
    ///
    /// # Returns
    /// A new `NoiseTable` instance.
    pub fn create(count: usize, seed: u64) -> Self {
        let mut noise = vec![0.; count];

        noise
            .par_chunks_mut(BLOCK_SIZE)
            .enumerate()
            .for_each(|(block, values)| {
                let mut rng = StdRng::seed_from_u64(block_seed(seed, block));
                values
                    .iter_mut()
                    .for_each(|x| *x = rng.sample(StandardNormal));
            });

        Self {
            noise: noise.into(),
        }
    }

    /// Wraps an already generated table, as received from the coordinator.
    pub fn from_vec(noise: Vec<f32>) -> Self {
        Self {
            noise: noise.into(),
        }
    }

    /// The amount of floats in the table.
    pub fn len(&self) -> usize {
        self.noise.len()
    }

    pub fn is_empty(&self) -> bool {
        self.noise.is_empty()
    }

    /// The whole table, used to broadcast it to remote workers.
    pub fn as_slice(&self) -> &[f32] {
        &self.noise
    }

    /// Returns the window of `len` floats starting at `index`.
    ///
    /// # Returns
    /// A `Bounds` error if the window doesn't fit in the table.
    pub fn get(&self, index: usize, len: usize) -> Result<&[f32]> {
        index
            .checked_add(len)
            .and_then(|end| self.noise.get(index..end))
            .ok_or(EsErr::Bounds {
                index,
                len,
                table: self.noise.len(),
            })
    }

    /// Samples a uniformly distributed start index for a window of `len` floats.
    ///
    /// # Arguments
    /// * `len` - The window length, usually the parameter count.
    /// * `rng` - The random number generator to draw from.
    ///
    /// # Returns
    /// An index in `[0, len() - len]` or a `Bounds` error if `len > len()`.
    pub fn sample_index<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Result<usize> {
        let Some(last) = self.noise.len().checked_sub(len) else {
            return Err(EsErr::Bounds {
                index: 0,
                len,
                table: self.noise.len(),
            });
        };

        Ok(rng.random_range(0..=last))
    }
}

impl fmt::Debug for NoiseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseTable")
            .field("len", &self.noise.len())
            .finish()
    }
}

fn block_seed(seed: u64, block: usize) -> u64 {
    seed ^ (block as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_table() {
        let a = NoiseTable::create(3 * BLOCK_SIZE + 17, 123);
        let b = NoiseTable::create(3 * BLOCK_SIZE + 17, 123);

        let a_bits: Vec<u32> = a.as_slice().iter().map(|x| x.to_bits()).collect();
        let b_bits: Vec<u32> = b.as_slice().iter().map(|x| x.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn different_seed_different_table() {
        let a = NoiseTable::create(1000, 1);
        let b = NoiseTable::create(1000, 2);
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn looks_standard_normal() {
        let table = NoiseTable::create(200_000, DEFAULT_NOISE_SEED);
        let n = table.len() as f64;

        let mean = table.as_slice().iter().map(|&x| x as f64).sum::<f64>() / n;
        let var = table
            .as_slice()
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        assert!(mean.abs() < 0.02, "mean {mean}");
        assert!((var - 1.0).abs() < 0.02, "var {var}");
    }

    #[test]
    fn sampled_windows_always_fit() {
        const COUNT: usize = 64;
        const DIM: usize = 60;

        let table = NoiseTable::create(COUNT, 7);
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..1000 {
            let index = table.sample_index(DIM, &mut rng).unwrap();
            assert!(index + DIM <= COUNT);
            assert_eq!(table.get(index, DIM).unwrap().len(), DIM);
        }
    }

    #[test]
    fn exact_fit_only_has_index_zero() {
        let table = NoiseTable::create(8, 7);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(table.sample_index(8, &mut rng).unwrap(), 0);
    }

    #[test]
    fn window_past_the_end_is_a_bounds_error() {
        let table = NoiseTable::create(10, 7);

        assert!(matches!(
            table.get(8, 3),
            Err(EsErr::Bounds {
                index: 8,
                len: 3,
                table: 10
            })
        ));
        assert!(table.get(usize::MAX, 2).is_err());
        assert!(table.sample_index(11, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
