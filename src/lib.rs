//! Exact assignment of students to capacity-bounded topics from ranked preferences.
//!
//! Two optimal assignments are computed over the same data:
//!
//! * **sum-optimal** (linear sum assignment): the total of the ranks students receive is minimal,
//! * **bottleneck** (linear bottleneck assignment): the worst rank any student receives is minimal.
//!
//! Preferences become a student × topic rank matrix ([`matrix::build_rank_matrix`]). Every topic
//! column is then replicated once per unit of capacity ([`matrix::expand_capacities`]), so a
//! topic of capacity `c` turns into `c` interchangeable slots (never more than there are
//! students) and the problem becomes a plain bipartite perfect matching. Unlisted topics are unbounded and never become arcs of the
//! [`ArcStorage`] both solvers read.
//!
//! ```
//! use topic_assignment::solve_assignments;
//!
//! let topic_ids = [1, 2, 3];
//! let capacities = [1, 1, 2];
//! let preferences = vec![vec![1, 3], vec![2, 3], vec![1, 2]];
//! let assignments = solve_assignments(&topic_ids, &capacities, &preferences).unwrap();
//! assert_eq!(assignments.sum_optimal.objective, 4.);
//! assert_eq!(assignments.bottleneck.summary.worst, 2.);
//! ```
pub mod bottleneck;
pub mod error;
pub mod input;
pub mod matrix;
pub mod metrics;
pub mod report;
pub mod shortest_path;
pub mod solution;
pub mod solver;

#[cfg(test)]
pub(crate) mod testing;

pub use bottleneck::{perfect_matching_within, BottleneckSolver};
pub use error::AssignmentError;
pub use matrix::{
    build_rank_matrix, expand_capacities, usable_capacity, CostMatrix, SlotMatrix, UNBOUNDED,
};
pub use metrics::{summarize, RankSummary, TopicAssignment};
pub use shortest_path::ShortestPathSolver;
pub use solution::{Matching, UnsignedInt};
pub use solver::{ArcStorage, AssignmentSolver};

use tracing::debug;

/// One optimal assignment expressed in topic indices.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentOutcome {
    /// index i gives the topic column (position in `topic_ids`) assigned to student i
    pub topics: Vec<usize>,
    /// index i gives the rank student i gave to their topic
    pub ranks: Vec<f64>,
    /// objective reached by the matcher: total rank or worst rank
    pub objective: f64,
    pub summary: RankSummary,
}

impl AssignmentOutcome {
    fn new(objective: f64, assignment: TopicAssignment) -> Self {
        AssignmentOutcome {
            topics: assignment.topics,
            ranks: assignment.ranks,
            objective,
            summary: assignment.summary,
        }
    }
}

/// Both optimal assignments of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignments {
    pub sum_optimal: AssignmentOutcome,
    pub bottleneck: AssignmentOutcome,
}

/// Runs the whole engine.
///
/// `topic_ids` fixes the topic column order, `capacities[j]` is the capacity of
/// `topic_ids[j]`, and `preferences[i]` lists the topic ids of student `i` from most to least
/// preferred. Either both assignments are returned or the run fails as a whole.
pub fn solve_assignments(
    topic_ids: &[i64],
    capacities: &[usize],
    preferences: &[Vec<i64>],
) -> Result<Assignments, AssignmentError> {
    if preferences.is_empty() {
        return Err(AssignmentError::InvalidReference(
            "no students to assign".to_string(),
        ));
    }
    let base = build_rank_matrix(topic_ids, preferences)?;

    let capacity = usable_capacity(capacities, preferences.len()).ok_or_else(|| {
        AssignmentError::InvalidReference("total topic capacity overflows".to_string())
    })?;
    if capacity < preferences.len() {
        return Err(AssignmentError::InfeasibleCapacity {
            capacity,
            students: preferences.len(),
        });
    }
    let slots = expand_capacities(&base, capacities)?;
    let arcs = ArcStorage::<u32>::from_dense(&slots.costs)?;

    let mut sum_solver = ShortestPathSolver::new(base.num_rows(), slots.num_slots());
    let sum_matching = sum_solver.solve(&arcs)?;
    let bottleneck_matching = BottleneckSolver::default().solve(&arcs)?;

    let sum_optimal = AssignmentOutcome::new(
        sum_matching.objective,
        summarize(&base, &sum_matching, &slots.slot_to_topic)?,
    );
    let bottleneck = AssignmentOutcome::new(
        bottleneck_matching.objective,
        summarize(&base, &bottleneck_matching, &slots.slot_to_topic)?,
    );
    debug!(
        "sum-optimal: total {} worst {}; bottleneck: total {} worst {}",
        sum_optimal.objective,
        sum_optimal.summary.worst,
        bottleneck.ranks.iter().sum::<f64>(),
        bottleneck.objective
    );
    Ok(Assignments {
        sum_optimal,
        bottleneck,
    })
}

#[cfg(test)]
mod tests {
    use super::solve_assignments;
    use crate::error::AssignmentError;
    use crate::testing::random_instance;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use test_log::test;

    #[test]
    fn test_capacity_deficit_fails_before_matching() {
        let err = solve_assignments(&[1, 2], &[1, 1], &[vec![1, 2], vec![2, 1], vec![1, 2]])
            .unwrap_err();
        assert_eq!(
            err,
            AssignmentError::InfeasibleCapacity {
                capacity: 2,
                students: 3
            }
        );
    }

    #[test]
    fn test_huge_capacities_are_clipped_to_students() {
        let preferences = vec![vec![1, 2], vec![1, 2]];
        for capacities in [[usize::MAX / 4, 1], [usize::MAX, 1], [usize::MAX, usize::MAX]] {
            let assignments = solve_assignments(&[1, 2], &capacities, &preferences).unwrap();
            assert_eq!(assignments.sum_optimal.topics, [0, 0]);
            assert_eq!(assignments.sum_optimal.objective, 2.);
            assert_eq!(assignments.bottleneck.summary.worst, 1.);
        }
    }

    #[test]
    fn test_unknown_topic_is_invalid_reference() {
        let err = solve_assignments(&[1, 2], &[1, 1], &[vec![1, 9]]).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidReference(_)));
    }

    #[test]
    fn test_reversed_preferences() {
        let topic_ids = [1, 2, 3, 4, 5, 6, 7];
        let preferences = vec![vec![7, 6, 5, 4, 3, 2, 1]; 5];
        let assignments = solve_assignments(&topic_ids, &[1; 7], &preferences).unwrap();
        assert_eq!(assignments.sum_optimal.objective, 15.);
        assert_eq!(assignments.sum_optimal.summary.average, 3.);
        assert_eq!(assignments.bottleneck.objective, 5.);
        assert_eq!(assignments.bottleneck.summary.worst, 5.);
    }

    #[test]
    fn test_capacity_lets_students_share_a_topic() {
        let preferences = vec![vec![10, 20], vec![10, 20], vec![10, 20]];
        let assignments = solve_assignments(&[10, 20], &[3, 1], &preferences).unwrap();
        assert_eq!(assignments.sum_optimal.topics, [0, 0, 0]);
        assert_eq!(assignments.bottleneck.summary.worst, 1.);
        assert_eq!(assignments.bottleneck.summary.std_dev, 0.);
    }

    #[test]
    fn test_identical_top_choice_with_unit_capacity() {
        let topic_ids = [1, 2, 3, 4];
        let preferences = vec![
            vec![1, 2, 3, 4],
            vec![1, 3, 4, 2],
            vec![1, 4, 2, 3],
        ];
        let assignments = solve_assignments(&topic_ids, &[1; 4], &preferences).unwrap();
        let first_choices = |ranks: &[f64]| ranks.iter().filter(|r| **r == 1.).count();
        assert_eq!(first_choices(&assignments.sum_optimal.ranks), 1);
        assert_eq!(assignments.sum_optimal.objective, 5.);
        assert_eq!(assignments.sum_optimal.summary.worst, 2.);
        // every student can get a second choice, topic 1 may stay empty
        assert!(first_choices(&assignments.bottleneck.ranks) <= 1);
        assert_eq!(assignments.bottleneck.summary.worst, 2.);
    }

    #[test]
    fn test_bottleneck_never_worse_than_sum_optimal_worst() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..40 {
            let (topic_ids, capacities, preferences) = random_instance(&mut rng, 12, 8, 4, 3);
            let capacity: usize = capacities.iter().sum();
            if capacity < preferences.len() {
                continue;
            }
            match solve_assignments(&topic_ids, &capacities, &preferences) {
                Ok(assignments) => {
                    let sum = &assignments.sum_optimal;
                    let bottleneck = &assignments.bottleneck;
                    assert!(bottleneck.summary.worst <= sum.summary.worst);
                    assert!(sum.objective <= bottleneck.ranks.iter().sum::<f64>());
                    assert_eq!(sum.objective, sum.ranks.iter().sum::<f64>());
                    for outcome in [sum, bottleneck] {
                        let mut load = vec![0; topic_ids.len()];
                        outcome.topics.iter().for_each(|j| load[*j] += 1);
                        assert!(load.iter().zip(capacities.iter()).all(|(l, c)| l <= c));
                    }
                }
                Err(err) => assert!(
                    matches!(err, AssignmentError::InfeasibleAssignment { .. }),
                    "{}",
                    err
                ),
            }
        }
    }
}
