use std::sync::Arc;

use crate::bufferpool::{BufferPool, TransactionId};
use crate::error::SmallResult;
use crate::heap_file::HeapFile;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{DBType, DBValue, FieldType};

/// Deletes every tuple its child produces from `target` (by record id),
/// then yields a single summary tuple holding the count.
pub struct Delete {
    tid: TransactionId,
    pool: Arc<BufferPool>,
    target: Arc<HeapFile>,
    child: Box<dyn Operator>,
    desc: TupleDesc,
    result: Option<i64>,
}

impl Delete {
    pub fn new(tid: TransactionId, pool: Arc<BufferPool>, target: Arc<HeapFile>, child: Box<dyn Operator>) -> Delete {
        let desc = TupleDesc::new(vec![FieldType::new("count", "", DBType::Int)]);
        Delete {
            tid,
            pool,
            target,
            child,
            desc,
            result: None,
        }
    }
}

impl Operator for Delete {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        let mut count = 0i64;
        loop {
            match self.child.next() {
                Ok(Some(tuple)) => {
                    if let Some(rid) = tuple.rid {
                        match self.target.delete_tuple(self.tid, &self.pool, rid) {
                            Ok(_) => count += 1,
                            Err(e) => {
                                self.pool.abort_transaction(self.tid);
                                return Err(e);
                            }
                        }
                    }
                }
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
