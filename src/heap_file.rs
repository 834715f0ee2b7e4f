use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use crate::bufferpool::{BufferPool, Permission, TransactionId};
use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::page::HeapPage;
use crate::tuple::{RecordId, Tuple, TupleDesc};

/// A single heap-organized table: an unordered collection of fixed-layout
/// pages backed by one file on disk. `HeapFile` never caches page contents
/// itself — every read goes through a `BufferPool`, which owns the locking
/// and dirty/clean bookkeeping.
pub struct HeapFile {
    path: PathBuf,
    desc: TupleDesc,
    page_size: usize,
    string_length: usize,
    // Guards page allocation (`insert_tuple`'s append-a-page path) so two
    // concurrent inserts can't both decide the file needs growing and
    // clobber each other's new page.
    grow_lock: StdMutex<()>,
}

impl HeapFile {
    /// Open (creating if necessary) the heap file at `path`.
    pub fn new(path: &Path, desc: TupleDesc, page_size: usize, string_length: usize) -> SmallResult<HeapFile> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .open(path)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &format!("opening {:?}: {}", path, e)))?;
        Ok(HeapFile {
            path: path.to_path_buf(),
            desc,
            page_size,
            string_length,
            grow_lock: StdMutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn num_pages(&self) -> SmallResult<u32> {
        let file = File::open(&self.path)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        let len = file
            .metadata()
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?
            .len();
        Ok((len / self.page_size as u64) as u32)
    }

    /// Read page `page_no` directly off disk, bypassing the buffer pool.
    /// `BufferPool::get_page` is the only caller that should use this; every
    /// other consumer goes through the pool so reads and writes stay
    /// consistent with in-flight transactions.
    pub fn read_page(&self, page_no: u32) -> SmallResult<HeapPage> {
        let mut file = File::open(&self.path)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        file.seek(SeekFrom::Start((page_no as u64) * (self.page_size as u64)))
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        let mut buf = vec![0u8; self.page_size];
        file.read_exact(&mut buf)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        HeapPage::from_buffer(&self.path, page_no, &self.desc, self.page_size, self.string_length, &buf)
    }

    /// Append a freshly initialized empty page to the file and return its
    /// page number.
    fn allocate_page(&self) -> SmallResult<u32> {
        let _guard = self.grow_lock.lock().unwrap();
        let page_no = self.num_pages()?;
        let empty = HeapPage::empty(&self.path, page_no, &self.desc, self.page_size, self.string_length);
        let buf = empty.to_buffer(self.string_length)?;
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        file.seek(SeekFrom::Start((page_no as u64) * (self.page_size as u64)))
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        file.write_all(&buf)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        Ok(page_no)
    }

    /// Insert `tuple`, scanning existing pages for a free slot before
    /// appending a new page. Each page is probed under a read lock first;
    /// a page that turns out full is skipped without ever taking a write
    /// lock on it, and any lock failure on a probed or candidate page
    /// (contention, timeout) is treated as "skip to the next page" rather
    /// than failing the whole insert.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        pool: &Arc<BufferPool>,
        tuple: Tuple,
    ) -> SmallResult<RecordId> {
        let npages = self.num_pages()?;
        for page_no in 0..npages {
            let has_room = match pool.get_page(tid, self, page_no, Permission::ReadOnly) {
                Ok(page_arc) => page_arc.lock().unwrap().num_empty_slots() > 0,
                Err(_) => continue,
            };
            if !has_room {
                continue;
            }
            match pool.get_page(tid, self, page_no, Permission::ReadWrite) {
                Ok(page_arc) => {
                    let mut page = page_arc.lock().unwrap();
                    if page.num_empty_slots() > 0 {
                        return page.insert_tuple(tuple);
                    }
                }
                Err(_) => continue,
            }
        }
        let page_no = self.allocate_page()?;
        let page_arc = pool.get_page(tid, self, page_no, Permission::ReadWrite)?;
        let mut page = page_arc.lock().unwrap();
        page.insert_tuple(tuple)
    }

    /// Delete the tuple named by `rid`.
    pub fn delete_tuple(&self, tid: TransactionId, pool: &Arc<BufferPool>, rid: RecordId) -> SmallResult {
        let page_arc = pool.get_page(tid, self, rid.page_no, Permission::ReadWrite)?;
        let mut page = page_arc.lock().unwrap();
        page.delete_tuple(&rid)
    }
}
