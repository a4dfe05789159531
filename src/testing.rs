//! Seeded instance generators and brute-force references shared by unit tests.

use crate::matrix::{CostMatrix, UNBOUNDED};
use rand::seq::index::sample;
use rand::seq::SliceRandom;
use rand::Rng;

/// `num_rows` × `num_cols` matrix where every row ranks `listed` distinct random columns
/// 1..=listed and leaves the rest unbounded.
pub(crate) fn random_slot_matrix<R: Rng>(
    rng: &mut R,
    num_rows: usize,
    num_cols: usize,
    listed: usize,
) -> CostMatrix {
    let rows: Vec<Vec<f64>> = (0..num_rows)
        .map(|_| {
            let mut row = vec![UNBOUNDED; num_cols];
            let mut columns = sample(rng, num_cols, listed).into_vec();
            columns.shuffle(rng);
            for (rank, j) in columns.into_iter().enumerate() {
                row[j] = (rank + 1) as f64;
            }
            row
        })
        .collect();
    CostMatrix::from_rows(&rows).unwrap()
}

/// Random topics with capacities in `1..=max_capacity` and students ranking `listed`
/// distinct topic ids. Topic ids are spread out so they differ from column indices.
pub(crate) fn random_instance<R: Rng>(
    rng: &mut R,
    num_students: usize,
    num_topics: usize,
    listed: usize,
    max_capacity: usize,
) -> (Vec<i64>, Vec<usize>, Vec<Vec<i64>>) {
    let topic_ids: Vec<i64> = (0..num_topics).map(|j| 100 + 3 * j as i64).collect();
    let capacities = (0..num_topics)
        .map(|_| rng.gen_range(1..=max_capacity))
        .collect();
    let preferences = (0..num_students)
        .map(|_| {
            let mut picked = sample(rng, num_topics, listed).into_vec();
            picked.shuffle(rng);
            picked.into_iter().map(|j| topic_ids[j]).collect()
        })
        .collect();
    (topic_ids, capacities, preferences)
}

/// Minimal total cost and minimal worst cost over all perfect matchings using finite
/// cells, or `None` if there is no such matching.
pub(crate) fn brute_force(costs: &CostMatrix) -> Option<(f64, f64)> {
    fn search(
        costs: &CostMatrix,
        row: usize,
        used: &mut [bool],
        sum: f64,
        worst: f64,
        best: &mut Option<(f64, f64)>,
    ) {
        if row == costs.num_rows() {
            *best = Some(match *best {
                None => (sum, worst),
                Some((best_sum, best_worst)) => (best_sum.min(sum), best_worst.min(worst)),
            });
            return;
        }
        for j in 0..costs.num_cols() {
            let cost = costs.get(row, j);
            if used[j] || !cost.is_finite() {
                continue;
            }
            used[j] = true;
            search(costs, row + 1, used, sum + cost, worst.max(cost), best);
            used[j] = false;
        }
    }

    let mut best = None;
    let mut used = vec![false; costs.num_cols()];
    search(costs, 0, &mut used, 0., f64::NEG_INFINITY, &mut best);
    best
}
