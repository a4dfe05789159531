use crate::error::AssignmentError;
use crate::solution::{Matching, UnsignedInt};
use crate::solver::{ArcStorage, AssignmentSolver};
use num_iter;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Bottleneck solver
/// Which seats every student on a distinct slot so that the largest matched cost is minimal.
///
/// The optimal bottleneck is one of the distinct arc costs. The solver binary searches over them,
/// asking [`perfect_matching_within`] whether the arcs not above a candidate threshold still seat
/// every student, and keeps the witness matching of the smallest feasible threshold.
#[derive(Clone, Default)]
pub struct BottleneckSolver {
    /// number of feasibility probes made by the last solve
    pub nprobes: u32,
    /// smallest feasible threshold found by the last solve
    pub threshold: Option<f64>,
}

impl<I: UnsignedInt> AssignmentSolver<I> for BottleneckSolver {
    const NAME: &'static str = "bottleneck matcher";

    fn solve(&mut self, arcs: &ArcStorage<I>) -> Result<Matching<I>, AssignmentError> {
        arcs.validate_input()?;
        self.nprobes = 0;
        self.threshold = None;

        let thresholds = arcs.distinct_values();
        let mut lo = 0;
        let mut hi = thresholds.len() - 1;

        // every finite arc allowed: if this fails no threshold can succeed
        self.nprobes += 1;
        let mut best = perfect_matching_within(arcs, thresholds[hi]).ok_or_else(|| {
            AssignmentError::infeasible(
                <Self as AssignmentSolver<I>>::NAME,
                format!(
                    "no perfect matching at the largest threshold {} ({} candidate thresholds)",
                    thresholds[hi],
                    thresholds.len()
                ),
            )
        })?;

        // invariant: thresholds[lo] <= optimum <= thresholds[hi], best is feasible at hi
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            self.nprobes += 1;
            match perfect_matching_within(arcs, thresholds[mid]) {
                Some(matching) => {
                    trace!("threshold {} feasible", thresholds[mid]);
                    hi = mid;
                    best = matching;
                }
                None => {
                    trace!("threshold {} infeasible", thresholds[mid]);
                    lo = mid + 1;
                }
            }
        }

        best.objective = arcs.get_bottleneck(&best);
        self.verify_solution(arcs, &best)?;
        if best.objective != thresholds[hi] {
            return Err(AssignmentError::InconsistentSolution(format!(
                "{}: witness bottleneck {} differs from threshold {}",
                <Self as AssignmentSolver<I>>::NAME,
                best.objective,
                thresholds[hi]
            )));
        }
        self.threshold = Some(thresholds[hi]);
        debug!(
            "{}: worst cost {} after {} probes",
            <Self as AssignmentSolver<I>>::NAME,
            best.objective,
            self.nprobes
        );
        Ok(best)
    }
}

/// Feasibility oracle: a perfect matching using only arcs with cost `<= threshold`, or `None`
/// if some student cannot be seated.
///
/// Maximum cardinality matching by Hopcroft-Karp over the thresholded arcs.
pub fn perfect_matching_within<I: UnsignedInt>(
    arcs: &ArcStorage<I>,
    threshold: f64,
) -> Option<Matching<I>> {
    let mut graph = ThresholdGraph::new(arcs, threshold);
    let mut phases = 0;
    while graph.build_layers() {
        phases += 1;
        graph.cursor.iter_mut().for_each(|c| *c = 0);
        for root in num_iter::range(I::zero(), arcs.num_rows()) {
            let root_usize: usize = root.as_();
            if graph.matching.student_to_slot[root_usize] == I::max_value() {
                graph.augment_from(root);
            }
        }
        if graph.matching.is_perfect() {
            break;
        }
    }
    trace!(
        "threshold {}: {} phases, {} students unassigned",
        threshold,
        phases,
        graph.matching.num_unassigned
    );
    if graph.matching.is_perfect() {
        Some(graph.matching)
    } else {
        None
    }
}

const UNREACHED: usize = usize::MAX;

struct ThresholdGraph<'a, I: UnsignedInt> {
    arcs: &'a ArcStorage<I>,
    threshold: f64,
    matching: Matching<I>,
    // BFS layer of each row, UNREACHED for rows outside the layered graph or proven dead
    layer: Vec<usize>,
    // next arc to try for each row within the current phase
    cursor: Vec<usize>,
    // column through which the search left each row on the stack
    via: Vec<I>,
    queue: VecDeque<I>,
    stack: Vec<I>,
}

impl<'a, I: UnsignedInt> ThresholdGraph<'a, I> {
    fn new(arcs: &'a ArcStorage<I>, threshold: f64) -> Self {
        let num_rows: usize = arcs.num_rows().as_();
        Self {
            arcs,
            threshold,
            matching: Matching::unassigned(arcs.num_rows(), arcs.num_cols()),
            layer: vec![UNREACHED; num_rows],
            cursor: vec![0; num_rows],
            via: vec![I::max_value(); num_rows],
            queue: VecDeque::with_capacity(num_rows),
            stack: Vec::with_capacity(num_rows),
        }
    }

    /// Layers rows by alternating distance from the free rows, up to the first layer that
    /// touches a free column; deeper rows stay unreached so only shortest paths augment.
    /// Returns true if some free column is reachable.
    fn build_layers(&mut self) -> bool {
        let arcs = self.arcs;
        self.queue.clear();
        for i in num_iter::range(I::zero(), arcs.num_rows()) {
            let i_usize: usize = i.as_();
            if self.matching.student_to_slot[i_usize] == I::max_value() {
                self.layer[i_usize] = 0;
                self.queue.push_back(i);
            } else {
                self.layer[i_usize] = UNREACHED;
            }
        }

        // layer of the first row with an arc to a free column
        let mut free_layer = UNREACHED;
        while let Some(u) = self.queue.pop_front() {
            let u_usize: usize = u.as_();
            if self.layer[u_usize] > free_layer {
                break;
            }
            let (columns, values) = arcs.row(u_usize);
            for (v, cost) in columns.iter().zip(values.iter()) {
                if *cost > self.threshold {
                    continue;
                }
                let v_usize: usize = v.as_();
                let w = self.matching.slot_to_student[v_usize];
                if w == I::max_value() {
                    free_layer = free_layer.min(self.layer[u_usize]);
                } else {
                    let w_usize: usize = w.as_();
                    if self.layer[w_usize] == UNREACHED {
                        self.layer[w_usize] = self.layer[u_usize] + 1;
                        self.queue.push_back(w);
                    }
                }
            }
        }
        if free_layer == UNREACHED {
            return false;
        }
        self.layer
            .iter_mut()
            .filter(|l| **l > free_layer)
            .for_each(|l| *l = UNREACHED);
        true
    }

    /// Depth-first search for an augmenting path along the layers, flipping it when found.
    fn augment_from(&mut self, root: I) -> bool {
        let arcs = self.arcs;
        self.stack.clear();
        self.stack.push(root);

        while let Some(&u) = self.stack.last() {
            let u_usize: usize = u.as_();
            let (columns, values) = arcs.row(u_usize);
            let mut descend = None;

            while self.cursor[u_usize] < columns.len() {
                let idx = self.cursor[u_usize];
                self.cursor[u_usize] += 1;
                if values[idx] > self.threshold {
                    continue;
                }
                let v = columns[idx];
                let v_usize: usize = v.as_();
                let w = self.matching.slot_to_student[v_usize];
                if w == I::max_value() {
                    // free slot: shift every row on the stack onto the slot it left through
                    self.matching.assign(u, v);
                    let depth = self.stack.len() - 1;
                    for row in self.stack[..depth].iter() {
                        let row_usize: usize = row.as_();
                        self.matching.assign(*row, self.via[row_usize]);
                    }
                    return true;
                }
                let w_usize: usize = w.as_();
                if self.layer[w_usize] == self.layer[u_usize] + 1 {
                    self.via[u_usize] = v;
                    descend = Some(w);
                    break;
                }
            }

            match descend {
                Some(w) => self.stack.push(w),
                None => {
                    // dead end for the rest of this phase
                    self.layer[u_usize] = UNREACHED;
                    self.stack.pop();
                }
            }
        }
        false
    }
}
