use std::sync::Arc;

use crate::bufferpool::{BufferPool, Permission, TransactionId};
use crate::error::SmallResult;
use crate::heap_file::HeapFile;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};

/// Reads every tuple of a heap file, one page at a time, under `tid`'s
/// read lock. This is the concrete leaf every scenario in the spec's
/// end-to-end examples needs but the distilled operator list never named
/// directly — every other operator pulls from something like this.
pub struct SequentialScan {
    tid: TransactionId,
    pool: Arc<BufferPool>,
    file: Arc<HeapFile>,
    desc: TupleDesc,
    next_page: u32,
    current: Vec<Tuple>,
    index: usize,
}

impl SequentialScan {
    pub fn new(tid: TransactionId, pool: Arc<BufferPool>, file: Arc<HeapFile>) -> SequentialScan {
        let desc = file.desc().copy();
        SequentialScan {
            tid,
            pool,
            file,
            desc,
            next_page: 0,
            current: Vec::new(),
            index: 0,
        }
    }

    fn load_next_page(&mut self) -> SmallResult<bool> {
        let npages = self.file.num_pages()?;
        while self.next_page < npages {
            let page_no = self.next_page;
            self.next_page += 1;
            let page_arc = self.pool.get_page(self.tid, &self.file, page_no, Permission::ReadOnly)?;
            let page = page_arc.lock().unwrap();
            let tuples: Vec<Tuple> = page.iter_tuples().cloned().collect();
            drop(page);
            if !tuples.is_empty() {
                self.current = tuples;
                self.index = 0;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Operator for SequentialScan {
    fn open(&mut self) -> SmallResult {
        self.rewind()
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        loop {
            if self.index < self.current.len() {
                let t = self.current[self.index].clone();
                self.index += 1;
                return Ok(Some(t));
            }
            if !self.load_next_page()? {
                return Ok(None);
            }
        }
    }

    fn rewind(&mut self) -> SmallResult {
        self.next_page = 0;
        self.current.clear();
        self.index = 0;
        Ok(())
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn close(&mut self) {
        self.current.clear();
    }
}
