//! Return processing: raw returns into scale-free centered ranks.

/// Ranks `values` in ascending order, `0` being the smallest.
///
/// The sort is stable, so ties are ranked by their original position.
pub fn compute_ranks(values: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0; values.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = rank;
    }

    ranks
}

/// Maps paired returns to their centered ranks.
///
/// All `2N` returns are ranked together and rank `r` becomes
/// `r / (2N - 1) - 0.5`, so the result lies in `[-0.5, 0.5]` and only the
/// relative order of the returns matters.
pub fn compute_centered_ranks(returns: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let flat: Vec<f32> = returns.iter().flatten().copied().collect();
    let denom = flat.len().saturating_sub(1).max(1) as f32;

    let centered: Vec<f32> = compute_ranks(&flat)
        .into_iter()
        .map(|rank| rank as f32 / denom - 0.5)
        .collect();

    centered
        .chunks_exact(2)
        .map(|pair| [pair[0], pair[1]])
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

    use super::*;

    fn random_returns(n: usize, seed: u64) -> Vec<[f32; 2]> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| [rng.random_range(-100.0..100.0), rng.random_range(-100.0..100.0)])
            .collect()
    }

    #[test]
    fn ranks_are_a_permutation() {
        let ranks = compute_ranks(&[3.0, -1.0, 7.0, 0.5]);
        assert_eq!(ranks, vec![2, 0, 3, 1]);
    }

    #[test]
    fn ties_keep_original_order() {
        let ranks = compute_ranks(&[1.0, 1.0, 0.0, 1.0]);
        assert_eq!(ranks, vec![1, 2, 0, 3]);
    }

    #[test]
    fn single_pair_spans_the_whole_range() {
        let ranks = compute_centered_ranks(&[[2.0, -2.0]]);
        assert_eq!(ranks, vec![[0.5, -0.5]]);
    }

    #[test]
    fn centered_ranks_range() {
        for n in [1, 2, 5, 64] {
            let ranks = compute_centered_ranks(&random_returns(n, n as u64));
            let flat: Vec<f32> = ranks.iter().flatten().copied().collect();

            let min = flat.iter().copied().fold(f32::INFINITY, f32::min);
            let max = flat.iter().copied().fold(f32::NEG_INFINITY, f32::max);

            assert_eq!(flat.len(), 2 * n);
            assert!((min + 0.5).abs() < 1e-6);
            assert!((max - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn invariant_under_monotonic_rescaling() {
        let mut values: Vec<f32> = (-40..40).map(|x| x as f32).collect();
        values.shuffle(&mut StdRng::seed_from_u64(11));
        let returns: Vec<[f32; 2]> = values.chunks_exact(2).map(|p| [p[0], p[1]]).collect();

        let rescaled: Vec<[f32; 2]> = returns
            .iter()
            .map(|[a, b]| [(a / 10.0).exp() * 3.0 + 1.0, (b / 10.0).exp() * 3.0 + 1.0])
            .collect();

        assert_eq!(compute_centered_ranks(&returns), compute_centered_ranks(&rescaled));
    }

    #[test]
    fn empty_input() {
        assert!(compute_centered_ranks(&[]).is_empty());
    }
}
