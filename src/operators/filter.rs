use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::expr::Expr;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{BoolOp, DBValue};

/// Passes through only the tuples for which `op.apply(lhs, rhs)` holds.
/// Pure: it never mutates a tuple, only decides whether to forward it.
pub struct Filter {
    child: Box<dyn Operator>,
    op: BoolOp,
    lhs: Box<dyn Expr>,
    rhs: Box<dyn Expr>,
}

impl Filter {
    /// Fails with `IncompatibleTypes` if `lhs` and `rhs` don't evaluate to
    /// the same field type (e.g. a string filter built over an int column).
    pub fn new(child: Box<dyn Operator>, lhs: Box<dyn Expr>, op: BoolOp, rhs: Box<dyn Expr>) -> SmallResult<Filter> {
        if lhs.result_type() != rhs.result_type() {
            return Err(SmallError::new(
                ErrorKind::IncompatibleTypes,
                "filter: left and right operands have different types",
            ));
        }
        Ok(Filter { child, op, lhs, rhs })
    }

    fn matches(&self, tuple: &Tuple) -> SmallResult<bool> {
        let lhs = self.lhs.eval(Some(tuple))?;
        let rhs = self.rhs.eval(Some(tuple))?;
        match (&lhs, &rhs) {
            (DBValue::Int(a), DBValue::Int(b)) => Ok(self.op.apply(a, b)),
            (DBValue::String(a), DBValue::String(b)) => Ok(self.op.apply(a, b)),
            _ => Err(SmallError::new(ErrorKind::TypeMismatch, "filter: mismatched operand types")),
        }
    }
}

impl Operator for Filter {
    fn open(&mut self) -> SmallResult {
        self.child.open()
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            if self.matches(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> SmallResult {
        self.child.rewind()
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        self.child.get_tuple_desc()
    }

    fn close(&mut self) {
        self.child.close()
    }
}
