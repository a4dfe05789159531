use num_traits::{AsPrimitive, FromPrimitive, NumAssign, PrimInt, Unsigned};
use std::fmt::{Debug, Display};

pub trait UnsignedInt:
    PrimInt
    + Unsigned
    + Display
    + Debug
    + AsPrimitive<usize>
    + AsPrimitive<f64>
    + FromPrimitive
    + NumAssign
{
}

impl<T> UnsignedInt for T where
    T: PrimInt
        + Unsigned
        + Display
        + Debug
        + AsPrimitive<usize>
        + AsPrimitive<f64>
        + FromPrimitive
        + NumAssign
{
}

///
/// Matching of students (rows) to slots (columns)
///
#[derive(Debug, Clone, PartialEq)]
pub struct Matching<I>
where
    I: UnsignedInt,
{
    /// index i gives the slot, s, taken by student i
    ///
    /// Unassigned students are marked by MAX value of the integer type (u32::MAX for u32)
    pub student_to_slot: Vec<I>,
    /// index s gives the student, i, who takes slot s
    ///
    /// Free slots are marked by MAX value of the integer type (u32::MAX for u32)
    pub slot_to_student: Vec<I>,
    /// number of unassigned students
    pub num_unassigned: I,
    /// optimal objective value reached by the matcher: summed cost for the sum objective,
    /// largest matched cost for the bottleneck objective
    pub objective: f64,
}

impl<I> Matching<I>
where
    I: UnsignedInt,
{
    /// Empty matching with every student unassigned and every slot free.
    pub fn unassigned(num_rows: I, num_cols: I) -> Matching<I> {
        let num_rows_usize: usize = num_rows.as_();
        let num_cols_usize: usize = num_cols.as_();
        Matching::<I> {
            student_to_slot: vec![I::max_value(); num_rows_usize],
            slot_to_student: vec![I::max_value(); num_cols_usize],
            num_unassigned: num_rows,
            objective: f64::NAN,
        }
    }

    #[inline]
    pub fn is_perfect(&self) -> bool {
        self.num_unassigned.is_zero()
    }

    /// Puts student `row` on slot `col`, overwriting both sides.
    #[inline]
    pub(crate) fn assign(&mut self, row: I, col: I) {
        let row_usize: usize = row.as_();
        let col_usize: usize = col.as_();
        if self.student_to_slot[row_usize] == I::max_value() {
            self.num_unassigned -= I::one();
        }
        self.student_to_slot[row_usize] = col;
        self.slot_to_student[col_usize] = row;
    }

    /// Slot indices per student as `usize`, or `None` when some student is unassigned.
    pub fn slots(&self) -> Option<Vec<usize>> {
        self.student_to_slot
            .iter()
            .map(|s| {
                if *s == I::max_value() {
                    None
                } else {
                    let s_usize: usize = s.as_();
                    Some(s_usize)
                }
            })
            .collect()
    }
}
