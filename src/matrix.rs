//! Dense rank matrices: construction from ranked preferences and expansion of
//! topic columns into unit-capacity slots.

use crate::error::AssignmentError;
use std::collections::HashMap;
use tracing::debug;

/// Cost of a student/topic pair the student did not list.
pub const UNBOUNDED: f64 = f64::INFINITY;

/// Row-major dense cost matrix. Rows are students, columns are topics or slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    num_rows: usize,
    num_cols: usize,
    values: Vec<f64>,
}

impl CostMatrix {
    /// Matrix filled with [`UNBOUNDED`].
    pub fn unbounded(num_rows: usize, num_cols: usize) -> CostMatrix {
        CostMatrix {
            num_rows,
            num_cols,
            values: vec![UNBOUNDED; num_rows * num_cols],
        }
    }

    /// Builds a matrix from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<CostMatrix, AssignmentError> {
        let num_cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * num_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != num_cols {
                return Err(AssignmentError::InvalidReference(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    num_cols
                )));
            }
            values.extend_from_slice(row);
        }
        Ok(CostMatrix {
            num_rows: rows.len(),
            num_cols,
            values,
        })
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.num_cols + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.num_cols + col] = value;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.num_cols..(row + 1) * self.num_cols]
    }
}

/// Builds the student × topic rank matrix.
///
/// `topic_ids` fixes the column order. Entry `(i, j)` is the 1-based position of
/// `topic_ids[j]` in `preferences[i]`, or [`UNBOUNDED`] when student `i` did not
/// list it.
pub fn build_rank_matrix(
    topic_ids: &[i64],
    preferences: &[Vec<i64>],
) -> Result<CostMatrix, AssignmentError> {
    let id_to_index: HashMap<i64, usize> = topic_ids
        .iter()
        .enumerate()
        .map(|(j, id)| (*id, j))
        .collect();

    let mut costs = CostMatrix::unbounded(preferences.len(), topic_ids.len());
    for (i, prefs) in preferences.iter().enumerate() {
        for (rank, topic_id) in (1..).zip(prefs.iter()) {
            let j = *id_to_index.get(topic_id).ok_or_else(|| {
                AssignmentError::InvalidReference(format!(
                    "preference topic id {} of student {} not found in topics list",
                    topic_id, i
                ))
            })?;
            if costs.get(i, j).is_finite() {
                return Err(AssignmentError::InvalidReference(format!(
                    "topic id {} is listed more than once by student {}",
                    topic_id, i
                )));
            }
            costs.set(i, j, rank as f64);
        }
    }
    debug!(
        "rank matrix: {} students x {} topics",
        costs.num_rows, costs.num_cols
    );
    Ok(costs)
}

/// Rank matrix with every topic column replicated once per unit of capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotMatrix {
    pub costs: CostMatrix,
    /// index s gives the topic owning slot s
    pub slot_to_topic: Vec<usize>,
}

impl SlotMatrix {
    #[inline]
    pub fn num_slots(&self) -> usize {
        self.slot_to_topic.len()
    }
}

/// Seats usable by `num_students`: a topic never holds more than `num_students`, so each
/// capacity counts at most that much. `None` if the sum overflows.
///
/// Below `num_students` this equals the plain capacity total.
pub fn usable_capacity(capacities: &[usize], num_students: usize) -> Option<usize> {
    capacities
        .iter()
        .try_fold(0usize, |acc, cap| acc.checked_add((*cap).min(num_students)))
}

/// Expands topic columns into slots: topic `j` yields `capacities[j]` identical columns,
/// clipped to the number of students.
pub fn expand_capacities(
    base: &CostMatrix,
    capacities: &[usize],
) -> Result<SlotMatrix, AssignmentError> {
    if capacities.len() != base.num_cols() {
        return Err(AssignmentError::InvalidReference(format!(
            "{} capacities given for {} topics",
            capacities.len(),
            base.num_cols()
        )));
    }

    let num_students = base.num_rows();
    let num_slots = usable_capacity(capacities, num_students).ok_or_else(|| {
        AssignmentError::InvalidReference("total topic capacity overflows".to_string())
    })?;
    let mut slot_to_topic = Vec::with_capacity(num_slots);
    for (j, cap) in capacities.iter().enumerate() {
        slot_to_topic.extend(std::iter::repeat(j).take((*cap).min(num_students)));
    }
    if slot_to_topic.is_empty() {
        return Err(AssignmentError::InfeasibleCapacity {
            capacity: 0,
            students: base.num_rows(),
        });
    }

    let mut costs = CostMatrix::unbounded(base.num_rows(), slot_to_topic.len());
    for i in 0..base.num_rows() {
        for (s, j) in slot_to_topic.iter().enumerate() {
            costs.set(i, s, base.get(i, *j));
        }
    }
    debug!(
        "expanded {} topics into {} slots",
        base.num_cols(),
        slot_to_topic.len()
    );
    Ok(SlotMatrix {
        costs,
        slot_to_topic,
    })
}

#[cfg(test)]
mod tests {
    use super::{build_rank_matrix, expand_capacities, usable_capacity, CostMatrix, UNBOUNDED};
    use crate::error::AssignmentError;

    #[test]
    fn test_build_rank_matrix() {
        let costs = build_rank_matrix(&[10, 20, 30], &[vec![30, 10], vec![20, 30]]).unwrap();
        assert_eq!(costs.row(0), &[2.0, UNBOUNDED, 1.0]);
        assert_eq!(costs.row(1), &[UNBOUNDED, 1.0, 2.0]);
    }

    #[test]
    fn test_build_rank_matrix_unknown_topic() {
        let err = build_rank_matrix(&[1, 2], &[vec![1, 3]]).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidReference(_)));
    }

    #[test]
    fn test_build_rank_matrix_repeated_topic() {
        let err = build_rank_matrix(&[1, 2], &[vec![1, 2, 1]]).unwrap_err();
        assert_eq!(
            err,
            AssignmentError::InvalidReference(
                "topic id 1 is listed more than once by student 0".to_string()
            )
        );
    }

    #[test]
    fn test_expand_capacities() {
        let base = CostMatrix::from_rows(&[vec![1.0, 2.0], vec![UNBOUNDED, 1.0]]).unwrap();
        let slots = expand_capacities(&base, &[2, 1]).unwrap();
        assert_eq!(slots.slot_to_topic, [0, 0, 1]);
        assert_eq!(slots.costs.row(0), &[1.0, 1.0, 2.0]);
        assert_eq!(slots.costs.row(1), &[UNBOUNDED, UNBOUNDED, 1.0]);
    }

    #[test]
    fn test_expand_zero_capacity() {
        let base = CostMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let err = expand_capacities(&base, &[0, 0]).unwrap_err();
        assert_eq!(
            err,
            AssignmentError::InfeasibleCapacity {
                capacity: 0,
                students: 1
            }
        );
    }

    #[test]
    fn test_expand_capacity_length_mismatch() {
        let base = CostMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let err = expand_capacities(&base, &[1]).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidReference(_)));
    }

    #[test]
    fn test_expand_clips_capacity_to_students() {
        let base = CostMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        let slots = expand_capacities(&base, &[usize::MAX, 3]).unwrap();
        assert_eq!(slots.slot_to_topic, [0, 0, 1, 1]);
        assert_eq!(slots.costs.row(1), &[2.0, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_usable_capacity() {
        assert_eq!(usable_capacity(&[2, 1, 1], 10), Some(4));
        assert_eq!(usable_capacity(&[usize::MAX, 1], 3), Some(4));
        assert_eq!(usable_capacity(&[usize::MAX, 1], usize::MAX), None);
        assert_eq!(usable_capacity(&[], 3), Some(0));
    }
}
