use std::sync::Arc;

use crate::bufferpool::{BufferPool, TransactionId};
use crate::error::SmallResult;
use crate::heap_file::HeapFile;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{DBType, DBValue, FieldType};

/// Inserts every tuple its child produces into `target`, then yields a
/// single summary tuple holding the count. Like `OrderBy`/`Aggregator`,
/// this is effectively a blocking operator: its one output depends on
/// having consumed the whole input.
pub struct Insert {
    tid: TransactionId,
    pool: Arc<BufferPool>,
    target: Arc<HeapFile>,
    child: Box<dyn Operator>,
    desc: TupleDesc,
    result: Option<i64>,
}

impl Insert {
    pub fn new(tid: TransactionId, pool: Arc<BufferPool>, target: Arc<HeapFile>, child: Box<dyn Operator>) -> Insert {
        let desc = TupleDesc::new(vec![FieldType::new("count", "", DBType::Int)]);
        Insert {
            tid,
            pool,
            target,
            child,
            desc,
            result: None,
        }
    }
}

impl Operator for Insert {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        let mut count = 0i64;
        loop {
            match self.child.next() {
                Ok(Some(tuple)) => match self.target.insert_tuple(self.tid, &self.pool, tuple) {
                    Ok(_) => count += 1,
                    Err(e) => {
                        self.pool.abort_transaction(self.tid);
                        return Err(e);
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    self.pool.abort_transaction(self.tid);
                    return Err(e);
                }
            }
        }
        self.result = Some(count);
        Ok(())
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        match self.result.take() {
            Some(count) => Ok(Some(Tuple::new(self.desc.copy(), vec![DBValue::Int(count)]))),
            None => Ok(None),
        }
    }

    fn rewind(&mut self) -> SmallResult {
        self.result = None;
        self.child.rewind()
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn close(&mut self) {
        self.child.close()
    }
}
