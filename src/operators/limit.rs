use crate::error::SmallResult;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};

/// Forwards at most `limit` tuples from its child, then returns `None`
/// forever.
pub struct Limit {
    child: Box<dyn Operator>,
    limit: usize,
    emitted: usize,
}

impl Limit {
    pub fn new(child: Box<dyn Operator>, limit: usize) -> Limit {
        Limit {
            child,
            limit,
            emitted: 0,
        }
    }
}

impl Operator for Limit {
    fn open(&mut self) -> SmallResult {
        self.child.open()
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        if self.emitted >= self.limit {
            return Ok(None);
        }
        match self.child.next()? {
            Some(t) => {
                self.emitted += 1;
                Ok(Some(t))
            }
            None => Ok(None),
        }
    }

    fn rewind(&mut self) -> SmallResult {
        self.emitted = 0;
        self.child.rewind()
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        self.child.get_tuple_desc()
    }

    fn close(&mut self) {
        self.child.close()
    }
}
