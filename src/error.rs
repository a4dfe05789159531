use thiserror::Error;

/// Errors raised by the assignment engine.
///
/// Every variant is terminal for the current run: no partial assignment is
/// ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    /// A preference or slot map points outside the known topics.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Total capacity is zero or smaller than the number of students.
    #[error("infeasible capacity: total capacity {capacity} cannot seat {students} students")]
    InfeasibleCapacity { capacity: usize, students: usize },

    /// A matcher could not cover every student with a distinct slot.
    #[error("infeasible assignment in {matcher}: {step}")]
    InfeasibleAssignment { matcher: &'static str, step: String },

    /// A matcher produced a solution that is not total or uses an unbounded rank.
    #[error("inconsistent solution: {0}")]
    InconsistentSolution(String),
}

impl AssignmentError {
    pub(crate) fn infeasible(matcher: &'static str, step: impl Into<String>) -> Self {
        AssignmentError::InfeasibleAssignment {
            matcher,
            step: step.into(),
        }
    }
}
