use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::expr::Expr;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::DBValue;

/// Nested-loop equi-join: for every left tuple, rescans the whole right
/// child looking for matches on `left_expr == right_expr`. Simple rather
/// than fast, same tradeoff the teacher's own join implementations make
/// before a query planner exists to pick something smarter.
pub struct EqualityJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    left_expr: Box<dyn Expr>,
    right_expr: Box<dyn Expr>,
    desc: TupleDesc,
    current_left: Option<Tuple>,
}

impl EqualityJoin {
    pub fn new(
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        left_expr: Box<dyn Expr>,
        right_expr: Box<dyn Expr>,
    ) -> EqualityJoin {
        let desc = left.get_tuple_desc().merge(right.get_tuple_desc());
        EqualityJoin {
            left,
            right,
            left_expr,
            right_expr,
            desc,
            current_left: None,
        }
    }

    fn matches(&self, l: &Tuple, r: &Tuple) -> SmallResult<bool> {
        let lv = self.left_expr.eval(Some(l))?;
        let rv = self.right_expr.eval(Some(r))?;
        match (&lv, &rv) {
            (DBValue::Int(a), DBValue::Int(b)) => Ok(a == b),
            (DBValue::String(a), DBValue::String(b)) => Ok(a == b),
            _ => Err(SmallError::new(ErrorKind::TypeMismatch, "join: mismatched key types")),
        }
    }
}

impl Operator for EqualityJoin {
    fn open(&mut self) -> SmallResult {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        Ok(())
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                self.current_left = self.left.next()?;
                match &self.current_left {
                    None => return Ok(None),
                    Some(_) => self.right.rewind()?,
                }
            }
            let left_tuple = self.current_left.as_ref().unwrap().clone();
            while let Some(right_tuple) = self.right.next()? {
                if self.matches(&left_tuple, &right_tuple)? {
                    return Ok(Some(Tuple::join(&left_tuple, &right_tuple)));
                }
            }
            self.current_left = None;
        }
    }

    fn rewind(&mut self) -> SmallResult {
        self.current_left = None;
        self.left.rewind()
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
    }
}
