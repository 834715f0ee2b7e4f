use std::convert::TryInto;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bit_vec::BitVec;

use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::tuple::{RecordId, Tuple, TupleDesc};

/// Layout of a heap page on disk:
///
/// ```text
/// [ num_slots: u32 | num_used: u32 | occupancy bitmap (ceil(num_slots/8) bytes) | slot 0 | slot 1 | ... ]
/// ```
///
/// The bitmap gives every slot a stable identity across flush/reload: a
/// tuple's `RecordId.slot_no` is the bit index, not its position among the
/// non-empty slots. This is the redesign the ambiguous "consecutive
/// non-empty slots" layout needed (see the slot identity design note).
const HEADER_PREFIX_BYTES: usize = 8;

pub fn num_slots(page_size: usize, bytes_per_tuple: usize) -> usize {
    if bytes_per_tuple == 0 {
        return 0;
    }
    ((page_size - HEADER_PREFIX_BYTES) * 8) / (bytes_per_tuple * 8 + 1)
}

pub fn bitmap_bytes(slots: usize) -> usize {
    (slots + 7) / 8
}

pub fn header_bytes(slots: usize) -> usize {
    HEADER_PREFIX_BYTES + bitmap_bytes(slots)
}

pub struct HeapPage {
    pub page_no: u32,
    desc: TupleDesc,
    bytes_per_tuple: usize,
    page_size: usize,
    occupied: BitVec,
    slots: Vec<Option<Tuple>>,
    file_path: PathBuf,
    pub dirty: bool,
}

impl HeapPage {
    pub fn slot_count(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_slot_used(&self, slot_no: usize) -> bool {
        self.occupied.get(slot_no).unwrap_or(false)
    }

    pub fn num_empty_slots(&self) -> usize {
        self.occupied.iter().filter(|b| !b).count()
    }

    /// Construct a page with no tuples, ready to be written out.
    pub fn empty(
        file_path: &Path,
        page_no: u32,
        desc: &TupleDesc,
        page_size: usize,
        string_length: usize,
    ) -> HeapPage {
        let bytes_per_tuple = desc.bytes_per_tuple(string_length);
        let slots = num_slots(page_size, bytes_per_tuple);
        HeapPage {
            page_no,
            desc: desc.copy(),
            bytes_per_tuple,
            page_size,
            occupied: BitVec::from_elem(slots, false),
            slots: (0..slots).map(|_| None).collect(),
            file_path: file_path.to_path_buf(),
            dirty: false,
        }
    }

    /// Decode a page previously produced by `to_buffer`.
    pub fn from_buffer(
        file_path: &Path,
        page_no: u32,
        desc: &TupleDesc,
        page_size: usize,
        string_length: usize,
        buf: &[u8],
    ) -> SmallResult<HeapPage> {
        if buf.len() != page_size {
            return Err(SmallError::new(
                ErrorKind::MalformedData,
                "page buffer does not match configured page_size",
            ));
        }
        let bytes_per_tuple = desc.bytes_per_tuple(string_length);
        let slots = num_slots(page_size, bytes_per_tuple);
        let nslots_on_disk = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        if nslots_on_disk != slots {
            return Err(SmallError::new(
                ErrorKind::MalformedData,
                "page slot count does not match the configured schema",
            ));
        }
        let bmap_bytes = bitmap_bytes(slots);
        let bmap_start = HEADER_PREFIX_BYTES;
        let bitmap = BitVec::from_bytes(&buf[bmap_start..bmap_start + bmap_bytes]);
        let mut occupied = BitVec::from_elem(slots, false);
        for i in 0..slots {
            occupied.set(i, bitmap.get(i).unwrap_or(false));
        }

        let header_len = header_bytes(slots);
        let mut tuples: Vec<Option<Tuple>> = (0..slots).map(|_| None).collect();
        for i in 0..slots {
            if occupied[i] {
                let offset = header_len + i * bytes_per_tuple;
                let mut t = Tuple::read_from(buf, offset, desc, string_length)?;
                t.rid = Some(RecordId::new(page_no, i as u32));
                tuples[i] = Some(t);
            }
        }

        Ok(HeapPage {
            page_no,
            desc: desc.copy(),
            bytes_per_tuple,
            page_size,
            occupied,
            slots: tuples,
            file_path: file_path.to_path_buf(),
            dirty: false,
        })
    }

    /// Encode this page back into a `page_size`-byte buffer.
    pub fn to_buffer(&self, string_length: usize) -> SmallResult<Vec<u8>> {
        let slots = self.slot_count();
        let header_len = header_bytes(slots);
        let mut buf = vec![0u8; self.page_size];

        buf[0..4].copy_from_slice(&(slots as u32).to_le_bytes());
        let num_used = slots - self.num_empty_slots();
        buf[4..8].copy_from_slice(&(num_used as u32).to_le_bytes());

        let bmap_bytes = self.occupied.to_bytes();
        buf[HEADER_PREFIX_BYTES..HEADER_PREFIX_BYTES + bmap_bytes.len()].copy_from_slice(&bmap_bytes);

        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(t) = slot {
                let offset = header_len + i * self.bytes_per_tuple;
                let mut tuple_buf = Vec::with_capacity(self.bytes_per_tuple);
                t.write_to(&mut tuple_buf, string_length)?;
                buf[offset..offset + tuple_buf.len()].copy_from_slice(&tuple_buf);
            }
        }

        Ok(buf)
    }

    /// Insert `tuple` into the first empty slot. Fails with `TypeMismatch`
    /// if `tuple`'s schema does not match this page's, or `PageFull` if
    /// there is no empty slot.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> SmallResult<RecordId> {
        if tuple.desc != self.desc {
            return Err(SmallError::new(
                ErrorKind::TypeMismatch,
                "tuple schema does not match this page's schema",
            ));
        }
        let free = (0..self.slot_count()).find(|&i| !self.occupied[i]);
        let slot_no = free.ok_or_else(|| SmallError::new(ErrorKind::PageFull, "no empty slot in page"))?;
        let rid = RecordId::new(self.page_no, slot_no as u32);
        tuple.rid = Some(rid);
        self.slots[slot_no] = Some(tuple);
        self.occupied.set(slot_no, true);
        self.dirty = true;
        Ok(rid)
    }

    /// Clear the slot named by `rid.slot_no`. Fails with `TupleNotFound` if
    /// that slot is already empty.
    pub fn delete_tuple(&mut self, rid: &RecordId) -> SmallResult {
        let slot_no = rid.slot_no as usize;
        if slot_no >= self.slot_count() || !self.occupied[slot_no] {
            return Err(SmallError::new(
                ErrorKind::TupleNotFound,
                "slot is empty; nothing to delete",
            ));
        }
        self.slots[slot_no] = None;
        self.occupied.set(slot_no, false);
        self.dirty = true;
        Ok(())
    }

    pub fn iter_tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Reopen the backing file and overwrite this page's bytes in place.
    /// `HeapPage` stores only a path, never a handle back to its `HeapFile`
    /// or the owning `BufferPool`, so flushing never needs to walk up an
    /// ownership cycle.
    pub fn flush(&mut self, string_length: usize) -> SmallResult {
        if !self.dirty {
            return Ok(());
        }
        let buf = self.to_buffer(string_length)?;
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.file_path)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &format!("opening {:?}: {}", self.file_path, e)))?;
        file.seek(SeekFrom::Start((self.page_no as u64) * (self.page_size as u64)))
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        file.write_all(&buf)
            .map_err(|e| SmallError::new(ErrorKind::MalformedData, &e.to_string()))?;
        self.dirty = false;
        Ok(())
    }
}
