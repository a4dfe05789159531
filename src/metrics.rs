use crate::error::AssignmentError;
use crate::matrix::CostMatrix;
use crate::solution::{Matching, UnsignedInt};

/// Statistics of the ranks students received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSummary {
    pub average: f64,
    pub worst: f64,
    /// population standard deviation
    pub std_dev: f64,
}

impl RankSummary {
    pub fn from_ranks(ranks: &[f64]) -> Option<RankSummary> {
        if ranks.is_empty() {
            return None;
        }
        let n = ranks.len() as f64;
        let average = ranks.iter().sum::<f64>() / n;
        let worst = ranks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = ranks.iter().map(|r| (r - average).powi(2)).sum::<f64>() / n;
        Some(RankSummary {
            average,
            worst,
            std_dev: variance.sqrt(),
        })
    }
}

/// A matching translated back from slots to topics.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicAssignment {
    /// index i gives the topic column assigned to student i
    pub topics: Vec<usize>,
    /// index i gives the rank student i gave to their topic
    pub ranks: Vec<f64>,
    pub summary: RankSummary,
}

/// Maps slots back to topics and looks the ranks up in the topic-level matrix.
///
/// An unassigned student or an unbounded rank means a matcher returned a broken
/// solution; both are reported as [`AssignmentError::InconsistentSolution`].
pub fn summarize<I: UnsignedInt>(
    base: &CostMatrix,
    matching: &Matching<I>,
    slot_to_topic: &[usize],
) -> Result<TopicAssignment, AssignmentError> {
    if matching.student_to_slot.len() != base.num_rows() {
        return Err(AssignmentError::InconsistentSolution(format!(
            "matching covers {} students, rank matrix has {}",
            matching.student_to_slot.len(),
            base.num_rows()
        )));
    }
    let slots = matching.slots().ok_or_else(|| {
        AssignmentError::InconsistentSolution("matching leaves students unassigned".to_string())
    })?;

    let mut topics = Vec::with_capacity(slots.len());
    let mut ranks = Vec::with_capacity(slots.len());
    for (i, s) in slots.into_iter().enumerate() {
        let j = *slot_to_topic.get(s).ok_or_else(|| {
            AssignmentError::InvalidReference(format!(
                "slot {} of student {} is outside the slot map",
                s, i
            ))
        })?;
        if j >= base.num_cols() {
            return Err(AssignmentError::InvalidReference(format!(
                "slot {} maps to unknown topic {}",
                s, j
            )));
        }
        let rank = base.get(i, j);
        if !rank.is_finite() {
            return Err(AssignmentError::InconsistentSolution(format!(
                "student {} was placed on unlisted topic {}",
                i, j
            )));
        }
        topics.push(j);
        ranks.push(rank);
    }

    let summary = RankSummary::from_ranks(&ranks).ok_or_else(|| {
        AssignmentError::InconsistentSolution("no students to summarize".to_string())
    })?;
    Ok(TopicAssignment {
        topics,
        ranks,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::{summarize, RankSummary};
    use crate::error::AssignmentError;
    use crate::matrix::{CostMatrix, UNBOUNDED};
    use crate::solution::Matching;
    use test_log::test;

    fn matching(slots: &[u32], num_slots: u32) -> Matching<u32> {
        let mut matching = Matching::unassigned(slots.len() as u32, num_slots);
        for (i, s) in slots.iter().enumerate() {
            matching.assign(i as u32, *s);
        }
        matching
    }

    #[test]
    fn test_rank_summary() {
        let summary = RankSummary::from_ranks(&[1., 2., 3., 2.]).unwrap();
        assert_eq!(summary.average, 2.);
        assert_eq!(summary.worst, 3.);
        assert!((summary.std_dev - 0.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(RankSummary::from_ranks(&[]), None);
    }

    #[test]
    fn test_summarize_maps_slots_to_topics() {
        let base = CostMatrix::from_rows(&[vec![1., 2.], vec![2., 1.], vec![1., UNBOUNDED]]).unwrap();
        let slot_to_topic = [0, 0, 1];
        let assignment = summarize(&base, &matching(&[2, 1, 0], 3), &slot_to_topic).unwrap();
        assert_eq!(assignment.topics, [1, 0, 0]);
        assert_eq!(assignment.ranks, [2., 2., 1.]);
        assert_eq!(assignment.summary.worst, 2.);
        assert!((assignment.summary.average - 5. / 3.).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_rejects_unbounded_rank() {
        let base = CostMatrix::from_rows(&[vec![1., UNBOUNDED]]).unwrap();
        let err = summarize(&base, &matching(&[1], 2), &[0, 1]).unwrap_err();
        assert!(matches!(err, AssignmentError::InconsistentSolution(_)));
    }

    #[test]
    fn test_summarize_rejects_partial_matching() {
        let base = CostMatrix::from_rows(&[vec![1., 2.], vec![2., 1.]]).unwrap();
        let partial = Matching::<u32>::unassigned(2, 2);
        let err = summarize(&base, &partial, &[0, 1]).unwrap_err();
        assert!(matches!(err, AssignmentError::InconsistentSolution(_)));
    }

    #[test]
    fn test_summarize_rejects_bad_slot_map() {
        let base = CostMatrix::from_rows(&[vec![1., 2.]]).unwrap();
        let err = summarize(&base, &matching(&[1], 2), &[0]).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidReference(_)));
        let err = summarize(&base, &matching(&[0], 2), &[5, 0]).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidReference(_)));
    }
}
