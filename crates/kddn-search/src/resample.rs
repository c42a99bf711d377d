// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::{ConditionMatrix, KddnError, PriorKnowledge};
use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index;

/// Pools the samples of both conditions, shuffles them, and splits them back
/// into groups of the original sizes.
pub fn permuted_split<R: Rng + ?Sized>(
    data1: &ConditionMatrix,
    data2: &ConditionMatrix,
    rng: &mut R,
) -> Result<(ConditionMatrix, ConditionMatrix), KddnError> {
    let p = data1.n_vars();
    if data2.n_vars() != p {
        return Err(KddnError::invalid_input(format!(
            "variable count mismatch: data1={p}, data2={}",
            data2.n_vars()
        )));
    }
    let n1 = data1.n_samples();
    let n2 = data2.n_samples();
    let mut order: Vec<usize> = (0..n1 + n2).collect();
    order.shuffle(rng);

    let pooled = |row: usize, var: usize| {
        if row < n1 {
            data1.get(row, var)
        } else {
            data2.get(row - n1, var)
        }
    };
    let first = ConditionMatrix::from_fn(n1, p, |sample, var| pooled(order[sample], var))?;
    let second = ConditionMatrix::from_fn(n2, p, |sample, var| pooled(order[n1 + sample], var))?;
    Ok((first, second))
}

/// The `index`-th unordered pair `(i, j)`, `i < j`, in row-major order of the
/// upper triangle.
pub fn pair_from_index(p: usize, index: usize) -> (usize, usize) {
    let mut remaining = index;
    let mut row = 0;
    while row + 1 < p {
        let width = p - row - 1;
        if remaining < width {
            return (row, row + 1 + remaining);
        }
        remaining -= width;
        row += 1;
    }
    (row, row)
}

/// Prior with exactly `edges` distinct pairs asserted in both conditions.
pub fn random_prior<R: Rng + ?Sized>(
    p: usize,
    edges: usize,
    rng: &mut R,
) -> Result<PriorKnowledge, KddnError> {
    let pairs = p * p.saturating_sub(1) / 2;
    if edges > pairs {
        return Err(KddnError::invalid_input(format!(
            "cannot place {edges} random edges among {pairs} pairs"
        )));
    }
    let chosen: Vec<(usize, usize)> = index::sample(rng, pairs, edges)
        .into_iter()
        .map(|linear| pair_from_index(p, linear))
        .collect();
    PriorKnowledge::from_shared_pairs(p, &chosen)
}

#[cfg(test)]
mod tests {
    use super::{pair_from_index, permuted_split, random_prior};
    use kddn_core::ConditionMatrix;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn pair_indices_walk_the_upper_triangle() {
        let pairs: Vec<_> = (0..6).map(|index| pair_from_index(4, index)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn permuted_split_preserves_group_sizes_and_pooled_values() {
        let data1 = ConditionMatrix::from_rows(&[[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]])
            .expect("valid rows");
        let data2 = ConditionMatrix::from_rows(&[[4.0, 40.0], [5.0, 50.0]]).expect("valid rows");
        let mut rng = StdRng::seed_from_u64(9);

        let (first, second) = permuted_split(&data1, &data2, &mut rng).expect("valid split");
        assert_eq!(first.n_samples(), 3);
        assert_eq!(second.n_samples(), 2);

        let mut pooled: Vec<f64> = first
            .column(0)
            .iter()
            .chain(second.column(0))
            .copied()
            .collect();
        pooled.sort_by(f64::total_cmp);
        assert_eq!(pooled, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        for sample in 0..3 {
            assert_eq!(first.get(sample, 1), first.get(sample, 0) * 10.0, "rows stay intact");
        }
    }

    #[test]
    fn random_prior_places_exactly_the_requested_edges() {
        let mut rng = StdRng::seed_from_u64(1);
        let prior = random_prior(5, 4, &mut rng).expect("enough pairs");
        assert_eq!(prior.knowledge_edge_count(), 4);
        for i in 0..5 {
            assert_eq!(prior.weight(i, i), 0.0);
            for j in 0..5 {
                assert_eq!(prior.weight(i, j), prior.weight(j, i));
                assert_eq!(prior.weight(i, j), prior.weight(i, j + 5));
            }
        }
        assert!(random_prior(3, 4, &mut rng).is_err());
    }
}
