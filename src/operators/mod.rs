use crate::error::SmallResult;
use crate::tuple::{Tuple, TupleDesc};

pub mod aggregate;
pub mod delete;
pub mod filter;
pub mod insert;
pub mod join;
pub mod limit;
pub mod order_by;
pub mod project;
pub mod sequential_scan;

/// The pull-based iterator protocol every relational operator implements.
/// `open`/`rewind`/`close` bracket a scan; `next` pulls one tuple at a time
/// so no operator (besides the blocking ones that inherently must, like
/// `OrderBy`) ever materializes its whole input.
pub trait Operator {
    fn open(&mut self) -> SmallResult;
    fn next(&mut self) -> SmallResult<Option<Tuple>>;
    fn rewind(&mut self) -> SmallResult;
    fn get_tuple_desc(&self) -> &TupleDesc;
    fn close(&mut self);
}
