use crate::error::AssignmentError;
use crate::solution::{Matching, UnsignedInt};
use crate::solver::{ArcStorage, AssignmentSolver};
use num_iter;
use tracing::{debug, trace};

/// Sum-optimal solver for the rectangular assignment problem
/// Which seats every student on a distinct slot with minimal total cost, by growing the matching one
/// student at a time along shortest augmenting paths (Jonker-Volgenant style) while keeping dual
/// prices that make all reduced costs non-negative.
#[derive(Clone)]
pub struct ShortestPathSolver<I: UnsignedInt> {
    // row and column dual variables
    u: Vec<f64>,
    v: Vec<f64>,
    shortest_path_costs: Vec<f64>,
    // index j gives the row from which column j was reached
    path: Vec<I>,
    // columns not yet scanned in the current augmentation
    remaining: Vec<I>,
    scanned_rows: Vec<bool>,
    scanned_cols: Vec<bool>,

    /// number of columns scanned over the last solve
    pub nits: u32,
}

impl<I: UnsignedInt> AssignmentSolver<I> for ShortestPathSolver<I> {
    const NAME: &'static str = "sum-optimal matcher";

    fn solve(&mut self, arcs: &ArcStorage<I>) -> Result<Matching<I>, AssignmentError> {
        arcs.validate_input()?;
        self.init_solve(arcs);

        let mut matching = Matching::unassigned(arcs.num_rows(), arcs.num_cols());
        for cur_row in num_iter::range(I::zero(), arcs.num_rows()) {
            let sink = self.augmenting_path(arcs, &matching, cur_row)?;
            self.augment(&mut matching, cur_row, sink);
            trace!("student_to_slot: {:?}", matching.student_to_slot);
        }

        matching.objective = arcs.get_objective(&matching);
        self.verify_solution(arcs, &matching)?;
        debug!(
            "{}: total cost {} after scanning {} columns",
            Self::NAME,
            matching.objective,
            self.nits
        );
        Ok(matching)
    }
}

impl<I: UnsignedInt> ShortestPathSolver<I> {
    pub fn new(row_capacity: usize, column_capacity: usize) -> Self {
        Self {
            u: Vec::with_capacity(row_capacity),
            v: Vec::with_capacity(column_capacity),
            shortest_path_costs: Vec::with_capacity(column_capacity),
            path: Vec::with_capacity(column_capacity),
            remaining: Vec::with_capacity(column_capacity),
            scanned_rows: Vec::with_capacity(row_capacity),
            scanned_cols: Vec::with_capacity(column_capacity),
            nits: 0,
        }
    }

    fn init_solve(&mut self, arcs: &ArcStorage<I>) {
        let num_rows: usize = arcs.num_rows().as_();
        let num_cols: usize = arcs.num_cols().as_();

        self.u.clear();
        self.u.resize(num_rows, 0.);
        self.v.clear();
        self.v.resize(num_cols, 0.);
        self.path.clear();
        self.path.resize(num_cols, I::max_value());
        self.scanned_rows.clear();
        self.scanned_rows.resize(num_rows, false);
        self.scanned_cols.clear();
        self.scanned_cols.resize(num_cols, false);
        self.nits = 0;
    }

    /// Dijkstra over reduced costs from `cur_row` to the nearest free column.
    ///
    /// Returns the free column reached and leaves `path`, `shortest_path_costs` and the
    /// dual variables updated for it.
    fn augmenting_path(
        &mut self,
        arcs: &ArcStorage<I>,
        matching: &Matching<I>,
        cur_row: I,
    ) -> Result<I, AssignmentError> {
        let num_cols = arcs.num_cols();
        let num_cols_usize: usize = num_cols.as_();

        self.remaining.clear();
        self.remaining.extend(num_iter::range(I::zero(), num_cols));
        self.shortest_path_costs.clear();
        self.shortest_path_costs
            .resize(num_cols_usize, f64::INFINITY);
        self.scanned_rows.iter_mut().for_each(|r| *r = false);
        self.scanned_cols.iter_mut().for_each(|c| *c = false);

        let mut min_val = 0.;
        let mut i = cur_row;
        let mut sink = I::max_value();
        while sink == I::max_value() {
            let i_usize: usize = i.as_();
            self.scanned_rows[i_usize] = true;

            // relax the arcs leaving row i
            let (columns, values) = arcs.row(i_usize);
            for (j, cost) in columns.iter().zip(values.iter()) {
                let j_usize: usize = j.as_();
                if self.scanned_cols[j_usize] {
                    continue;
                }
                let reduced = min_val + cost - self.u[i_usize] - self.v[j_usize];
                if reduced < self.shortest_path_costs[j_usize] {
                    self.path[j_usize] = i;
                    self.shortest_path_costs[j_usize] = reduced;
                }
            }

            // pick the closest unscanned column, preferring free ones on ties
            let mut index = usize::MAX;
            let mut lowest = f64::INFINITY;
            for (it, j) in self.remaining.iter().enumerate() {
                let j_usize: usize = j.as_();
                let cost = self.shortest_path_costs[j_usize];
                if cost < lowest
                    || (cost == lowest
                        && matching.slot_to_student[j_usize] == I::max_value())
                {
                    lowest = cost;
                    index = it;
                }
            }

            min_val = lowest;
            if index == usize::MAX || min_val == f64::INFINITY {
                return Err(AssignmentError::infeasible(
                    Self::NAME,
                    format!(
                        "no augmenting path for student {} ({} students already seated)",
                        cur_row, cur_row
                    ),
                ));
            }

            let j = self.remaining.swap_remove(index);
            let j_usize: usize = j.as_();
            self.nits += 1;
            if matching.slot_to_student[j_usize] == I::max_value() {
                sink = j;
            } else {
                i = matching.slot_to_student[j_usize];
            }
            self.scanned_cols[j_usize] = true;
        }

        // update dual variables
        let cur_row_usize: usize = cur_row.as_();
        self.u[cur_row_usize] += min_val;
        for (r, scanned) in self.scanned_rows.iter().enumerate() {
            if *scanned && r != cur_row_usize {
                let j_usize: usize = matching.student_to_slot[r].as_();
                self.u[r] += min_val - self.shortest_path_costs[j_usize];
            }
        }
        for (j, scanned) in self.scanned_cols.iter().enumerate() {
            if *scanned {
                self.v[j] -= min_val - self.shortest_path_costs[j];
            }
        }
        trace!("sink: {}, min_val: {}", sink, min_val);
        Ok(sink)
    }

    /// Flips the alternating path ending in `sink` back to `cur_row`.
    fn augment(&self, matching: &mut Matching<I>, cur_row: I, sink: I) {
        let mut j = sink;
        loop {
            let j_usize: usize = j.as_();
            let i = self.path[j_usize];
            let i_usize: usize = i.as_();
            let previous = matching.student_to_slot[i_usize];
            matching.assign(i, j);
            if i == cur_row {
                break;
            }
            j = previous;
        }
    }
}
