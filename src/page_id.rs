use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Identifies a single page within a single heap file. `BufferPool` keys its
/// cache on this; two `PageKey`s are equal iff they name the same file path
/// and page number, regardless of how the path was spelled.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PageKey {
    pub file_path: PathBuf,
    pub page_no: u32,
}

impl PageKey {
    pub fn new(file_path: &Path, page_no: u32) -> PageKey {
        PageKey {
            file_path: file_path.to_path_buf(),
            page_no,
        }
    }

    /// A stable hash of this key, independent of process layout; used as a
    /// shard/bucket key and in the debug `Display` below.
    pub fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.file_path.hash(&mut hasher);
        self.page_no.hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Debug for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "PageKey({}, page {}, {})",
            self.file_path.display(),
            self.page_no,
            hex::encode(self.hash_value().to_be_bytes()),
        )
    }
}
