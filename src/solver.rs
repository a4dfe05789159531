use crate::error::AssignmentError;
use crate::matrix::CostMatrix;
use crate::solution::{Matching, UnsignedInt};
use anyhow;
use anyhow::{anyhow as anyhow_error, ensure, Result};
use num_iter;
use num_traits::AsPrimitive;
use tracing::trace;

/// Finite arcs of a student × slot cost matrix in compressed sparse row form.
///
/// Unbounded cells are simply absent. Rows are appended in order and every row
/// must hold at least one arc before the next one is started.
#[derive(Debug, Clone)]
pub struct ArcStorage<I: UnsignedInt> {
    num_rows: I,
    num_cols: I,
    i_starts_stops: Vec<I>,
    j_counts: Vec<I>,
    column_indices: Vec<I>,
    // memory view of all values
    values: Vec<f64>,
}

impl<I: UnsignedInt> ArcStorage<I> {
    pub fn new(row_capacity: usize, arcs_capacity: usize) -> Self {
        Self {
            num_rows: I::zero(),
            num_cols: I::zero(),
            i_starts_stops: Vec::with_capacity(row_capacity + 1),
            j_counts: Vec::with_capacity(row_capacity),
            column_indices: Vec::with_capacity(arcs_capacity),
            values: Vec::with_capacity(arcs_capacity),
        }
    }

    /// Clears the storage and sets the problem dimensions.
    pub fn init(&mut self, num_rows: I, num_cols: I) -> Result<(), anyhow::Error> {
        ensure!(num_rows <= num_cols);
        ensure!(num_rows < I::max_value());
        self.num_rows = num_rows;
        self.num_cols = num_cols;

        self.i_starts_stops.clear();
        self.i_starts_stops.resize(2, I::zero());
        self.j_counts.clear();
        self.j_counts.push(I::zero());

        self.column_indices.clear();
        self.values.clear();
        Ok(())
    }

    #[inline]
    pub fn add_value(&mut self, row: I, column: I, value: f64) -> Result<(), anyhow::Error> {
        let current_row = self.j_counts.len() - 1;
        let row_usize: usize = row.as_();
        ensure!(row_usize == current_row || row_usize == current_row + 1);
        ensure!(value.is_finite(), "arc ({}, {}) has non-finite cost", row, column);

        let cumulative_offset = self.i_starts_stops[current_row + 1]
            .checked_add(&I::one())
            .ok_or_else(|| {
                anyhow_error!("i_starts_stops vector is longer then max value of type")
            })?;

        if row_usize > current_row {
            // starting the next row
            // ensure that row has at least one element
            ensure!(self.j_counts[current_row] > I::zero());
            self.i_starts_stops.push(cumulative_offset);
            self.j_counts.push(I::one());
        } else {
            self.i_starts_stops[current_row + 1] = cumulative_offset;
            self.j_counts[current_row] += I::one()
        }

        self.column_indices.push(column);
        self.values.push(value);
        Ok(())
    }

    #[inline]
    pub fn extend_from_values(
        &mut self,
        row: I,
        columns: &[I],
        values: &[f64],
    ) -> Result<(), anyhow::Error> {
        ensure!(columns.len() == values.len());
        ensure!(!columns.is_empty(), "row {} has no arcs", row);
        ensure!(values.iter().all(|v| v.is_finite()));
        let current_row = self.j_counts.len() - 1;
        let row_usize: usize = row.as_();
        ensure!(row_usize == current_row || row_usize == current_row + 1);

        let length_increment = I::from_usize(columns.len())
            .ok_or_else(|| anyhow_error!(" columns slice is longer then max value of type"))?;
        let cumulative_offset = self.i_starts_stops[current_row + 1]
            .checked_add(&length_increment)
            .ok_or_else(|| {
                anyhow_error!("i_starts_stops vector is longer then max value of type")
            })?;

        if row_usize > current_row {
            // starting the next row
            // ensure that current_row has at least one element
            ensure!(self.j_counts[current_row] > I::zero());
            self.i_starts_stops.push(cumulative_offset);
            self.j_counts.push(length_increment);
        } else {
            self.i_starts_stops[current_row + 1] = cumulative_offset;
            self.j_counts[current_row] += length_increment;
        }
        self.column_indices.extend_from_slice(columns);
        self.values.extend_from_slice(values);
        Ok(())
    }

    /// Collects the finite cells of a dense matrix.
    ///
    /// A student without any finite cell can never be matched, and more students
    /// than slots can never be seated; both are reported before any solver runs.
    pub fn from_dense(costs: &CostMatrix) -> Result<Self, AssignmentError> {
        if costs.num_rows() > costs.num_cols() {
            return Err(AssignmentError::InfeasibleCapacity {
                capacity: costs.num_cols(),
                students: costs.num_rows(),
            });
        }
        let to_index = |value: usize| {
            I::from_usize(value).ok_or_else(|| {
                AssignmentError::InvalidReference(format!(
                    "index {} does not fit the index type",
                    value
                ))
            })
        };
        let num_rows = to_index(costs.num_rows())?;
        let num_cols = to_index(costs.num_cols())?;

        let arcs_capacity = (0..costs.num_rows())
            .map(|i| costs.row(i).iter().filter(|v| v.is_finite()).count())
            .sum();
        let mut storage = Self::new(costs.num_rows(), arcs_capacity);
        storage
            .init(num_rows, num_cols)
            .map_err(|e| AssignmentError::InvalidReference(format!("{:#}", e)))?;

        let mut columns = Vec::with_capacity(costs.num_cols());
        let mut values = Vec::with_capacity(costs.num_cols());
        for i in 0..costs.num_rows() {
            columns.clear();
            values.clear();
            for (j, value) in costs.row(i).iter().enumerate() {
                if value.is_finite() {
                    columns.push(to_index(j)?);
                    values.push(*value);
                }
            }
            if columns.is_empty() {
                return Err(AssignmentError::infeasible(
                    "arc storage",
                    format!("student {} has no finite cost for any slot", i),
                ));
            }
            storage
                .extend_from_values(to_index(i)?, &columns, &values)
                .map_err(|e| AssignmentError::InvalidReference(format!("{:#}", e)))?;
        }
        trace!(
            "arc storage: {} rows, {} cols, {} arcs",
            storage.num_rows,
            storage.num_cols,
            storage.num_of_arcs()
        );
        Ok(storage)
    }

    #[inline]
    pub fn num_of_arcs(&self) -> usize {
        self.column_indices.len()
    }

    #[inline]
    pub fn num_rows(&self) -> I {
        self.num_rows
    }

    #[inline]
    pub fn num_cols(&self) -> I {
        self.num_cols
    }

    /// Column indices and costs of the arcs leaving `row`.
    #[inline]
    pub fn row(&self, row: usize) -> (&[I], &[f64]) {
        let start: usize = self.i_starts_stops[row].as_();
        let stop: usize = start + AsPrimitive::<usize>::as_(self.j_counts[row]);
        (
            &self.column_indices[start..stop],
            &self.values[start..stop],
        )
    }

    /// Cost of arc `(row, col)` or `None` when the cell is unbounded.
    pub fn arc_value(&self, row: usize, col: I) -> Option<f64> {
        let (columns, values) = self.row(row);
        columns
            .iter()
            .position(|j| *j == col)
            .map(|idx| values[idx])
    }

    /// Sorted distinct arc costs.
    pub fn distinct_values(&self) -> Vec<f64> {
        let mut values = self.values.clone();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        values
    }

    /// Returns summed cost of assigned arcs.
    pub fn get_objective(&self, matching: &Matching<I>) -> f64 {
        let mut obj = 0.;
        for i in num_iter::range(I::zero(), self.num_rows) {
            let i_usize: usize = i.as_();
            let j: I = matching.student_to_slot[i_usize];
            if j == I::max_value() {
                // skip any unassigned
                continue;
            }
            obj += self.arc_value(i_usize, j).unwrap_or(f64::INFINITY);
        }
        obj
    }

    /// Returns the largest cost among assigned arcs.
    pub fn get_bottleneck(&self, matching: &Matching<I>) -> f64 {
        num_iter::range(I::zero(), self.num_rows)
            .filter_map(|i| {
                let i_usize: usize = i.as_();
                let j = matching.student_to_slot[i_usize];
                if j == I::max_value() {
                    None
                } else {
                    Some(self.arc_value(i_usize, j).unwrap_or(f64::INFINITY))
                }
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn validate_input(&self) -> Result<(), AssignmentError> {
        let arcs_count = self.num_of_arcs();
        if self.num_rows > self.num_cols {
            let capacity: usize = self.num_cols.as_();
            let students: usize = self.num_rows.as_();
            return Err(AssignmentError::InfeasibleCapacity { capacity, students });
        }
        if arcs_count == 0 || self.num_rows.is_zero() {
            return Err(AssignmentError::InvalidReference(
                "assignment problem has no arcs".to_string(),
            ));
        }
        if self.j_counts.len() != AsPrimitive::<usize>::as_(self.num_rows) {
            return Err(AssignmentError::InvalidReference(format!(
                "arc storage holds {} rows, expected {}",
                self.j_counts.len(),
                self.num_rows
            )));
        }
        if let Some(j) = self.column_indices.iter().find(|j| **j >= self.num_cols) {
            return Err(AssignmentError::InvalidReference(format!(
                "arc column {} is out of range for {} slots",
                j, self.num_cols
            )));
        }
        Ok(())
    }
}

/// Solver of a perfect student → slot matching over finite arcs.
pub trait AssignmentSolver<I: UnsignedInt> {
    /// Name used in logs and errors.
    const NAME: &'static str;

    fn solve(&mut self, arcs: &ArcStorage<I>) -> Result<Matching<I>, AssignmentError>;

    /// Checks that `matching` is total, injective and uses finite arcs only.
    fn verify_solution(
        &self,
        arcs: &ArcStorage<I>,
        matching: &Matching<I>,
    ) -> Result<(), AssignmentError> {
        let num_cols: usize = arcs.num_cols().as_();
        let mut used = vec![false; num_cols];
        for (i, j) in matching.student_to_slot.iter().enumerate() {
            if *j == I::max_value() {
                return Err(AssignmentError::InconsistentSolution(format!(
                    "{}: student {} is unassigned",
                    Self::NAME,
                    i
                )));
            }
            let j_usize: usize = j.as_();
            if j_usize >= num_cols || used[j_usize] {
                return Err(AssignmentError::InconsistentSolution(format!(
                    "{}: slot {} is out of range or used twice",
                    Self::NAME,
                    j
                )));
            }
            used[j_usize] = true;
            if arcs.arc_value(i, *j).is_none() {
                return Err(AssignmentError::InconsistentSolution(format!(
                    "{}: student {} placed on unbounded slot {}",
                    Self::NAME,
                    i,
                    j
                )));
            }
        }
        Ok(())
    }
}
