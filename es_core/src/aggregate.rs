use rayon::prelude::*;

use crate::{EsErr, Result};

/// Elements of the output each rayon task accumulates.
const PAR_CHUNK: usize = 1 << 14;

/// Computes `sum_i weights[i] * vectors[i]` pulling at most `batch_size` vectors at a time.
///
/// `vectors` is consumed lazily, so `N` vectors of `dim` floats are never
/// held in memory together. Every output element accumulates its terms in
/// index order, which makes the result independent of `batch_size`.
///
/// # Arguments
/// * `weights` - One weight per vector.
/// * `vectors` - A lazy sequence of vectors of length `dim`.
/// * `dim` - The length of every vector and of the result.
/// * `batch_size` - The maximum amount of vectors pulled at once.
///
/// # Returns
/// The weighted sum and the amount of vectors consumed, or a `Consistency`
/// error if a vector has the wrong length or there are fewer vectors than weights.
pub fn batched_weighted_sum<I, V>(
    weights: &[f32],
    vectors: I,
    dim: usize,
    batch_size: usize,
) -> Result<(Vec<f32>, usize)>
where
    I: IntoIterator<Item = Result<V>>,
    V: AsRef<[f32]> + Sync,
{
    if batch_size == 0 {
        return Err(EsErr::config("aggregation batch_size must be greater than 0"));
    }

    let mut vectors = vectors.into_iter();
    let mut total = vec![0.; dim];
    let mut count = 0;
    let mut batch = Vec::with_capacity(batch_size.min(weights.len()));

    for batch_weights in weights.chunks(batch_size) {
        batch.clear();

        for vector in vectors.by_ref().take(batch_weights.len()) {
            let vector = vector?;
            EsErr::check("noise vector length", vector.as_ref().len(), dim)?;
            batch.push(vector);
        }

        EsErr::check("noise vectors in batch", batch.len(), batch_weights.len())?;

        total
            .par_chunks_mut(PAR_CHUNK)
            .enumerate()
            .for_each(|(chunk, out)| {
                let start = chunk * PAR_CHUNK;
                let end = start + out.len();

                for (w, vector) in batch_weights.iter().zip(&batch) {
                    out.iter_mut()
                        .zip(&vector.as_ref()[start..end])
                        .for_each(|(o, x)| *o += w * x);
                }
            });

        count += batch.len();
    }

    Ok((total, count))
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    fn random(n: usize, rng: &mut StdRng) -> Vec<f32> {
        (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
    }

    #[test]
    fn matches_the_naive_sum() {
        let weights = [0.5, -1.0, 2.0];
        let vectors = [vec![1.0, 2.0], vec![3.0, -1.0], vec![0.0, 0.25]];

        let (sum, count) =
            batched_weighted_sum(&weights, vectors.iter().map(Ok), 2, 2).unwrap();

        assert_eq!(count, 3);
        assert_eq!(sum, vec![0.5 - 3.0, 1.0 + 1.0 + 0.5]);
    }

    #[test]
    fn identical_for_every_batch_size() {
        const N: usize = 23;
        const DIM: usize = 37;

        let mut rng = StdRng::seed_from_u64(3);
        let weights = random(N, &mut rng);
        let vectors: Vec<Vec<f32>> = (0..N).map(|_| random(DIM, &mut rng)).collect();

        let (reference, _) =
            batched_weighted_sum(&weights, vectors.iter().map(Ok), DIM, N).unwrap();

        for batch_size in 1..=N {
            let (sum, count) =
                batched_weighted_sum(&weights, vectors.iter().map(Ok), DIM, batch_size).unwrap();

            assert_eq!(sum.len(), DIM);
            assert_eq!(count, N);
            let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(&sum), bits(&reference), "batch_size {batch_size}");
        }
    }

    #[test]
    fn spans_several_parallel_chunks() {
        let dim = PAR_CHUNK * 2 + 5;
        let ones = vec![1.0; dim];
        let vectors = [ones.as_slice(), ones.as_slice()];

        let (sum, count) =
            batched_weighted_sum(&[1.0, 2.0], vectors.into_iter().map(Ok), dim, 1).unwrap();

        assert_eq!(count, 2);
        assert!(sum.iter().all(|&x| x == 3.0));
    }

    #[test]
    fn no_weights_gives_zeros() {
        let (sum, count) =
            batched_weighted_sum(&[], std::iter::empty::<Result<Vec<f32>>>(), 4, 8).unwrap();

        assert_eq!(sum, vec![0.; 4]);
        assert_eq!(count, 0);
    }

    #[test]
    fn missing_vectors_are_inconsistent() {
        let vectors = [vec![1.0, 1.0]];
        let res = batched_weighted_sum(&[1.0, 1.0], vectors.iter().map(Ok), 2, 5);
        assert!(matches!(res, Err(EsErr::Consistency { .. })));
    }

    #[test]
    fn wrong_vector_length_is_inconsistent() {
        let vectors = [vec![1.0, 1.0, 1.0]];
        let res = batched_weighted_sum(&[1.0], vectors.iter().map(Ok), 2, 1);
        assert!(matches!(res, Err(EsErr::Consistency { .. })));
    }

    #[test]
    fn vector_errors_propagate() {
        let vectors = vec![Ok(vec![1.0]), Err(EsErr::rollout("boom"))];
        let res = batched_weighted_sum(&[1.0, 1.0], vectors, 1, 1);
        assert!(matches!(res, Err(EsErr::Rollout { .. })));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let res = batched_weighted_sum(&[1.0], [Ok(vec![1.0])], 1, 0);
        assert!(matches!(res, Err(EsErr::Config(_))));
    }
}
