use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use log::debug;

use crate::config::EngineConfig;
use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::heap_file::HeapFile;
use crate::page::HeapPage;
use crate::page_id::PageKey;

/// The kind of access a transaction wants on a page.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

/// Generated by `BufferPool::begin_transaction`. Unlike the teacher's
/// process-global `AtomicU32`, the counter backing this lives on the
/// `BufferPool` instance, so two engines in the same process (as happens
/// routinely in tests) never share id space.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TransactionId(pub u64);

/// Per-page read/write lock state. `std::sync::RwLock`'s guards are scoped to
/// a single statement and can't be held across the many separate
/// `get_page` calls one transaction makes over its lifetime, so page-level
/// two-phase locking is built directly on `Mutex` + `Condvar` instead.
struct LatchState {
    readers: HashSet<TransactionId>,
    writer: Option<TransactionId>,
}

struct PageLatch {
    state: Mutex<LatchState>,
    cond: Condvar,
}

impl PageLatch {
    fn new() -> PageLatch {
        PageLatch {
            state: Mutex::new(LatchState {
                readers: HashSet::new(),
                writer: None,
            }),
            cond: Condvar::new(),
        }
    }

    /// Block until `tid` holds `perm` on this page, or return `Deadlock` once
    /// `timeout` elapses. A transaction that already holds a read lock and
    /// asks for write is upgraded by dropping the read lock and waiting for
    /// exclusive access like any other writer; no other transaction can
    /// slip in a write in between because the drop and the wait happen
    /// under the same guard.
    fn acquire(&self, tid: TransactionId, perm: Permission, timeout: Duration) -> SmallResult {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();

        match perm {
            Permission::ReadOnly => {
                if state.writer == Some(tid) || state.readers.contains(&tid) {
                    return Ok(());
                }
                loop {
                    if state.writer.is_none() {
                        state.readers.insert(tid);
                        return Ok(());
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(SmallError::new(ErrorKind::Deadlock, "timed out acquiring read latch"));
                    }
                    let (guard, result) = self.cond.wait_timeout(state, deadline - now).unwrap();
                    state = guard;
                    if result.timed_out() && state.writer.is_some() {
                        return Err(SmallError::new(ErrorKind::Deadlock, "timed out acquiring read latch"));
                    }
                }
            }
            Permission::ReadWrite => {
                if state.writer == Some(tid) {
                    return Ok(());
                }
                if state.readers.contains(&tid) {
                    state.readers.remove(&tid);
                }
                loop {
                    if state.writer.is_none() && state.readers.is_empty() {
                        state.writer = Some(tid);
                        return Ok(());
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(SmallError::new(ErrorKind::Deadlock, "timed out acquiring write latch"));
                    }
                    let (guard, _) = self.cond.wait_timeout(state, deadline - now).unwrap();
                    state = guard;
                }
            }
        }
    }

    fn release(&self, tid: TransactionId) {
        let mut state = self.state.lock().unwrap();
        state.readers.remove(&tid);
        if state.writer == Some(tid) {
            state.writer = None;
        }
        self.cond.notify_all();
    }
}

/// The buffer pool: a bounded cache of heap pages shared by every
/// transaction, enforcing NO-STEAL (a dirty page is never evicted) and
/// FORCE (every page a transaction touched is flushed synchronously at
/// commit) durability.
pub struct BufferPool {
    config: EngineConfig,
    pages: Mutex<HashMap<PageKey, Arc<Mutex<HeapPage>>>>,
    latches: Mutex<HashMap<PageKey, Arc<PageLatch>>>,
    held_pages: Mutex<HashMap<TransactionId, HashSet<PageKey>>>,
    next_tid: AtomicU64,
}

impl BufferPool {
    pub fn new(config: EngineConfig) -> BufferPool {
        BufferPool {
            config,
            pages: Mutex::new(HashMap::new()),
            latches: Mutex::new(HashMap::new()),
            held_pages: Mutex::new(HashMap::new()),
            next_tid: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn begin_transaction(&self) -> TransactionId {
        let id = self.next_tid.fetch_add(1, Ordering::SeqCst);
        let tid = TransactionId(id);
        self.held_pages.lock().unwrap().insert(tid, HashSet::new());
        debug!("begin transaction {:?}", tid);
        tid
    }

    fn latch_for(&self, key: &PageKey) -> Arc<PageLatch> {
        let mut latches = self.latches.lock().unwrap();
        latches
            .entry(key.clone())
            .or_insert_with(|| Arc::new(PageLatch::new()))
            .clone()
    }

    /// Evict an arbitrary clean page to make room, if the pool is at
    /// capacity. Dirty pages are never chosen: with NO-STEAL, an
    /// uncommitted write must stay resident until its transaction commits
    /// or aborts.
    fn evict_if_needed(&self, pages: &mut HashMap<PageKey, Arc<Mutex<HeapPage>>>) -> SmallResult {
        if pages.len() < self.config.buffer_pool_capacity {
            return Ok(());
        }
        let victim = pages
            .iter()
            .find(|(_, page)| !page.lock().unwrap().dirty)
            .map(|(k, _)| k.clone());
        match victim {
            Some(k) => {
                pages.remove(&k);
                Ok(())
            }
            None => Err(SmallError::new(
                ErrorKind::PageFull,
                "buffer pool full of dirty pages with no clean page to evict",
            )),
        }
    }

    /// Fetch a page for `tid`, acquiring the lock `perm` requires before
    /// returning it. Blocks up to `EngineConfig::lock_timeout`.
    pub fn get_page(
        &self,
        tid: TransactionId,
        file: &HeapFile,
        page_no: u32,
        perm: Permission,
    ) -> SmallResult<Arc<Mutex<HeapPage>>> {
        let key = PageKey::new(file.path(), page_no);
        let latch = self.latch_for(&key);
        latch.acquire(tid, perm, self.config.lock_timeout)?;
        self.held_pages
            .lock()
            .unwrap()
            .entry(tid)
            .or_insert_with(HashSet::new)
            .insert(key.clone());

        let mut pages = self.pages.lock().unwrap();
        if !pages.contains_key(&key) {
            self.evict_if_needed(&mut pages)?;
            let page = file.read_page(page_no)?;
            pages.insert(key.clone(), Arc::new(Mutex::new(page)));
        }
        Ok(pages.get(&key).unwrap().clone())
    }

    /// Commit `tid`: flush every page it touched, then release its latches.
    pub fn commit_transaction(&self, tid: TransactionId) -> SmallResult {
        self.flush_pages_for(tid)?;
        self.release_all(tid);
        debug!("committed transaction {:?}", tid);
        Ok(())
    }

    /// Abort `tid`: drop the in-memory copy of every page it touched (so a
    /// later `get_page` re-reads the on-disk, unmodified version — this is
    /// NO-STEAL's complement: nothing was written through, so discarding
    /// the cache entry is enough to roll back), then release its latches.
    pub fn abort_transaction(&self, tid: TransactionId) {
        let held = self
            .held_pages
            .lock()
            .unwrap()
            .get(&tid)
            .cloned()
            .unwrap_or_default();
        let mut pages = self.pages.lock().unwrap();
        for key in &held {
            pages.remove(key);
        }
        drop(pages);
        self.release_all(tid);
        debug!("aborted transaction {:?}", tid);
    }

    fn flush_pages_for(&self, tid: TransactionId) -> SmallResult {
        let held = self
            .held_pages
            .lock()
            .unwrap()
            .get(&tid)
            .cloned()
            .unwrap_or_default();
        let pages = self.pages.lock().unwrap();
        for key in &held {
            if let Some(page) = pages.get(key) {
                page.lock().unwrap().flush(self.config.string_length)?;
            }
        }
        Ok(())
    }

    fn release_all(&self, tid: TransactionId) {
        let held = self
            .held_pages
            .lock()
            .unwrap()
            .remove(&tid)
            .unwrap_or_default();
        let latches = self.latches.lock().unwrap();
        for key in &held {
            if let Some(latch) = latches.get(key) {
                latch.release(tid);
            }
        }
    }

    /// Flush every dirty page, regardless of which transaction holds it.
    /// Used by tests to force durable state without a full commit.
    pub fn flush_all(&self) -> SmallResult {
        let pages = self.pages.lock().unwrap();
        for page in pages.values() {
            page.lock().unwrap().flush(self.config.string_length)?;
        }
        Ok(())
    }

    /// Drop every cached page. Used between unrelated test cases so one
    /// test's pages can never leak into the next.
    pub fn clear(&self) {
        self.pages.lock().unwrap().clear();
        self.latches.lock().unwrap().clear();
        self.held_pages.lock().unwrap().clear();
    }
}
