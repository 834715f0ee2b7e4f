use std::cmp::Ordering;

use itertools::Itertools;

use crate::error::SmallResult;
use crate::expr::Expr;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Ordered;

/// Sorts its entire input by a lexicographic sequence of keys before
/// producing the first output tuple. Unlike every other operator here,
/// `OrderBy` is necessarily blocking: there is no way to know a tuple's
/// position in sorted order without having seen the rest of the input.
pub struct OrderBy {
    child: Box<dyn Operator>,
    keys: Vec<(Box<dyn Expr>, bool)>,
    buffered: Vec<Tuple>,
    index: usize,
}

impl OrderBy {
    pub fn new(child: Box<dyn Operator>, keys: Vec<(Box<dyn Expr>, bool)>) -> OrderBy {
        OrderBy {
            child,
            keys,
            buffered: Vec::new(),
            index: 0,
        }
    }

    fn compare(&self, a: &Tuple, b: &Tuple) -> Ordering {
        for (expr, ascending) in &self.keys {
            let ordered = a.compare_field(b, expr.as_ref()).unwrap_or(Ordered::Equal);
            let cmp = match ordered {
                Ordered::Less => Ordering::Less,
                Ordered::Equal => Ordering::Equal,
                Ordered::Greater => Ordering::Greater,
            };
            let cmp = if *ascending { cmp } else { cmp.reverse() };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

impl Operator for OrderBy {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        self.rewind()
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        if self.index < self.buffered.len() {
            let t = self.buffered[self.index].clone();
            self.index += 1;
            return Ok(Some(t));
        }
        Ok(None)
    }

    fn rewind(&mut self) -> SmallResult {
        self.child.rewind()?;
        let mut tuples = Vec::new();
        while let Some(t) = self.child.next()? {
            tuples.push(t);
        }
        self.buffered = tuples.into_iter().sorted_by(|a, b| self.compare(a, b)).collect();
        self.index = 0;
        Ok(())
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        self.child.get_tuple_desc()
    }

    fn close(&mut self) {
        self.buffered.clear();
        self.child.close()
    }
}
