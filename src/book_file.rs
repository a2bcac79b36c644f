// Fixed-record Polyglot book files.
//
// A book is a flat array of 16-byte big-endian records sorted by position
// key. Small books are copied into memory on open; larger ones are read
// record by record from the file.

use std::env;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::BookFileConfig;
use crate::error::BookError;

pub const RECORD_SIZE: usize = 16;

/// Directory searched first for relative book names.
pub const BOOK_DIR_ENV: &str = "CHESSBOOK_DIR";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookRecord {
    pub key: u64,
    /// Packed move: bits 0-5 destination, 6-11 origin, 12-14 promotion.
    pub mv: u16,
    pub weight: u16,
    pub count: u16,
    pub learn: u16,
}

impl BookRecord {
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut key = [0u8; 8];
        key.copy_from_slice(&bytes[0..8]);
        Self {
            key: u64::from_be_bytes(key),
            mv: u16::from_be_bytes([bytes[8], bytes[9]]),
            weight: u16::from_be_bytes([bytes[10], bytes[11]]),
            count: u16::from_be_bytes([bytes[12], bytes[13]]),
            learn: u16::from_be_bytes([bytes[14], bytes[15]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..8].copy_from_slice(&self.key.to_be_bytes());
        out[8..10].copy_from_slice(&self.mv.to_be_bytes());
        out[10..12].copy_from_slice(&self.weight.to_be_bytes());
        out[12..14].copy_from_slice(&self.count.to_be_bytes());
        out[14..16].copy_from_slice(&self.learn.to_be_bytes());
        out
    }
}

/// In-memory copy of a whole book file.
#[derive(Debug)]
pub struct BookBuffer {
    bytes: Box<[u8]>,
}

impl BookBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / RECORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn record(&self, index: usize) -> Option<BookRecord> {
        let start = index.checked_mul(RECORD_SIZE)?;
        let chunk = self.bytes.get(start..start.checked_add(RECORD_SIZE)?)?;
        Some(BookRecord::from_bytes(chunk.try_into().ok()?))
    }
}

#[derive(Debug, Default)]
enum Backing {
    #[default]
    Closed,
    Memory(BookBuffer),
    File(File),
}

#[derive(Debug, Default)]
pub struct BookStore {
    backing: Backing,
    len: usize,
    cursor: usize,
    path: Option<PathBuf>,
}

/// Absolute names are used as given. Relative names are looked up under the
/// override directory first, then under the default directory.
pub fn resolve_book_path(
    name: &Path,
    override_dir: Option<&Path>,
    default_dir: &Path,
) -> Option<PathBuf> {
    if name.is_absolute() {
        return Some(name.to_path_buf());
    }
    override_dir
        .into_iter()
        .chain(std::iter::once(default_dir))
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `name`, closing whatever was open before. On failure the store
    /// stays closed.
    pub fn open(&mut self, name: impl AsRef<Path>, config: &BookFileConfig) -> Result<(), BookError> {
        self.close();

        let name = name.as_ref();
        let override_dir = env::var_os(BOOK_DIR_ENV).map(PathBuf::from);
        let result = match resolve_book_path(name, override_dir.as_deref(), &config.default_dir) {
            Some(path) => self.open_resolved(&path, config.memory_limit_records()),
            None => Err(BookError::unavailable(name, "not found")),
        };

        if let Err(e) = &result {
            warn!("{e}");
            self.close();
        }
        result
    }

    fn open_resolved(&mut self, path: &Path, memory_limit: usize) -> Result<(), BookError> {
        let mut file = File::open(path).map_err(|e| BookError::unavailable(path, e.to_string()))?;
        let size = file
            .metadata()
            .map_err(|e| BookError::unavailable(path, e.to_string()))?
            .len();

        if size == 0 {
            return Err(BookError::unavailable(path, "empty file"));
        }
        if size % RECORD_SIZE as u64 != 0 {
            return Err(BookError::unavailable(
                path,
                format!("size {size} is not a multiple of {RECORD_SIZE}"),
            ));
        }

        let len = usize::try_from(size / RECORD_SIZE as u64)
            .map_err(|_| BookError::unavailable(path, "too large"))?;

        if len < memory_limit {
            let mut bytes = Vec::with_capacity(len * RECORD_SIZE);
            file.read_to_end(&mut bytes)
                .map_err(|e| BookError::unavailable(path, e.to_string()))?;
            self.backing = Backing::Memory(BookBuffer::new(bytes));
        } else {
            self.backing = Backing::File(file);
        }

        self.len = len;
        self.cursor = 0;
        self.path = Some(path.to_path_buf());
        info!(
            "opened book '{}': {} records ({})",
            path.display(),
            len,
            if self.is_in_memory() { "in memory" } else { "on disk" }
        );
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backing, Backing::Closed)
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.backing, Backing::Memory(_))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads record `index` and leaves the cursor on the record after it.
    pub fn read_record(&mut self, index: usize) -> Result<BookRecord, BookError> {
        let len = self.len;
        let record = match &mut self.backing {
            Backing::Closed => return Err(BookError::Closed),
            Backing::Memory(buffer) => buffer
                .record(index)
                .ok_or(BookError::RecordOutOfRange { index, len })?,
            Backing::File(file) => {
                if index >= len {
                    return Err(BookError::RecordOutOfRange { index, len });
                }
                let mut bytes = [0u8; RECORD_SIZE];
                file.seek(SeekFrom::Start((index * RECORD_SIZE) as u64))?;
                file.read_exact(&mut bytes)?;
                BookRecord::from_bytes(&bytes)
            }
        };
        self.cursor = index + 1;
        Ok(record)
    }

    /// Reads the record under the cursor, `None` past the end.
    pub fn next_record(&mut self) -> Result<Option<BookRecord>, BookError> {
        if self.cursor >= self.len {
            return Ok(None);
        }
        self.read_record(self.cursor).map(Some)
    }

    /// Index of the first record with `record.key >= key`.
    pub fn lower_bound(&mut self, key: u64) -> Result<usize, BookError> {
        let (mut left, mut right) = (0, self.len);
        while left < right {
            let mid = left + (right - left) / 2;
            if self.read_record(mid)?.key < key {
                left = mid + 1;
            } else {
                right = mid;
            }
        }
        Ok(left)
    }

    /// First index of the run of records carrying `key`, or `len()` when the
    /// book has no such record.
    pub fn find_leftmost(&mut self, key: u64) -> usize {
        let found = self.lower_bound(key).and_then(|index| {
            if index >= self.len {
                return Ok(self.len);
            }
            let record = self.read_record(index)?;
            Ok(if record.key == key { index } else { self.len })
        });
        match found {
            Ok(index) => index,
            Err(e) => {
                debug!("book search for {key:016x} failed: {e}");
                self.len
            }
        }
    }

    /// Drops the file handle and buffer. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(path) = self.path.take() {
            debug!("closing book '{}'", path.display());
        }
        self.backing = Backing::Closed;
        self.len = 0;
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{record, write_book};
    use tempfile::tempdir;

    fn config(memory_limit_mb: usize) -> BookFileConfig {
        BookFileConfig {
            memory_limit_mb,
            ..BookFileConfig::default()
        }
    }

    fn sample() -> Vec<BookRecord> {
        vec![
            record(10, 1, 5),
            record(20, 2, 5),
            record(20, 3, 7),
            record(20, 4, 1),
            record(30, 5, 9),
            record(40, 6, 2),
        ]
    }

    #[test]
    fn record_codec_is_big_endian() {
        let rec = BookRecord {
            key: 0x0102030405060708,
            mv: 0x090a,
            weight: 0x0b0c,
            count: 0x0d0e,
            learn: 0x0f10,
        };
        let bytes = rec.to_bytes();
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(BookRecord::from_bytes(&bytes), rec);
    }

    #[test]
    fn memory_and_file_backing_agree() {
        let dir = tempdir().unwrap();
        let path = write_book(dir.path(), "small.bin", &sample());

        let mut in_memory = BookStore::new();
        in_memory.open(&path, &config(64)).unwrap();
        assert!(in_memory.is_in_memory());

        let mut on_disk = BookStore::new();
        on_disk.open(&path, &config(0)).unwrap();
        assert!(on_disk.is_available());
        assert!(!on_disk.is_in_memory());

        assert_eq!(in_memory.len(), 6);
        assert_eq!(on_disk.len(), 6);
        for i in 0..6 {
            assert_eq!(in_memory.read_record(i).unwrap(), on_disk.read_record(i).unwrap());
        }
        assert!(matches!(
            on_disk.read_record(6),
            Err(BookError::RecordOutOfRange { index: 6, len: 6 })
        ));
        assert!(in_memory.read_record(6).is_err());
    }

    #[test]
    fn find_leftmost_returns_first_of_run() {
        let dir = tempdir().unwrap();
        let path = write_book(dir.path(), "book.bin", &sample());
        for limit in [0, 64] {
            let mut store = BookStore::new();
            store.open(&path, &config(limit)).unwrap();
            assert_eq!(store.find_leftmost(10), 0);
            assert_eq!(store.find_leftmost(20), 1);
            assert_eq!(store.find_leftmost(30), 4);
            assert_eq!(store.find_leftmost(40), 5);
            // absent keys report one past the end
            assert_eq!(store.find_leftmost(5), 6);
            assert_eq!(store.find_leftmost(25), 6);
            assert_eq!(store.find_leftmost(99), 6);
            assert_eq!(store.lower_bound(25).unwrap(), 4);
        }
    }

    #[test]
    fn cursor_follows_reads() {
        let dir = tempdir().unwrap();
        let path = write_book(dir.path(), "book.bin", &sample());
        let mut store = BookStore::new();
        store.open(&path, &config(0)).unwrap();

        assert_eq!(store.read_record(1).unwrap().mv, 2);
        assert_eq!(store.next_record().unwrap().map(|r| r.mv), Some(3));
        assert_eq!(store.next_record().unwrap().map(|r| r.mv), Some(4));
        store.read_record(5).unwrap();
        assert_eq!(store.next_record().unwrap(), None);
    }

    #[test]
    fn empty_and_misaligned_files_are_unavailable() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.bin");
        std::fs::write(&empty, b"").unwrap();
        let odd = dir.path().join("odd.bin");
        std::fs::write(&odd, [0u8; 17]).unwrap();

        let mut store = BookStore::new();
        assert!(matches!(
            store.open(&empty, &config(64)),
            Err(BookError::Unavailable { .. })
        ));
        assert!(!store.is_available());
        assert!(store.open(&odd, &config(64)).is_err());
        assert!(!store.is_available());
        assert!(store.open(dir.path().join("missing.bin"), &config(64)).is_err());
        assert_eq!(store.find_leftmost(1), 0);
        assert!(matches!(store.read_record(0), Err(BookError::Closed)));
    }

    #[test]
    fn reopen_replaces_previous_book() {
        let dir = tempdir().unwrap();
        let first = write_book(dir.path(), "first.bin", &sample());
        let second = write_book(dir.path(), "second.bin", &[record(7, 1, 1)]);

        let mut store = BookStore::new();
        store.open(&first, &config(64)).unwrap();
        store.open(&second, &config(64)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.path(), Some(second.as_path()));

        // failed reopen leaves the store closed
        assert!(store.open(dir.path().join("nope.bin"), &config(64)).is_err());
        assert!(!store.is_available());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let mut store = BookStore::new();
        store.close();
        store.close();
        assert!(!store.is_available());

        let dir = tempdir().unwrap();
        let path = write_book(dir.path(), "book.bin", &sample());
        store.open(&path, &config(64)).unwrap();
        store.close();
        store.close();
        assert!(!store.is_available());
        assert!(store.path().is_none());
    }

    #[test]
    fn relative_names_use_override_then_default_dir() {
        let override_dir = tempdir().unwrap();
        let default_dir = tempdir().unwrap();
        write_book(default_dir.path(), "a.bin", &sample());
        write_book(default_dir.path(), "b.bin", &sample());
        let b_override = write_book(override_dir.path(), "b.bin", &sample());

        assert_eq!(
            resolve_book_path(Path::new("a.bin"), Some(override_dir.path()), default_dir.path()),
            Some(default_dir.path().join("a.bin"))
        );
        assert_eq!(
            resolve_book_path(Path::new("b.bin"), Some(override_dir.path()), default_dir.path()),
            Some(b_override.clone())
        );
        assert_eq!(
            resolve_book_path(Path::new("c.bin"), Some(override_dir.path()), default_dir.path()),
            None
        );
        assert_eq!(
            resolve_book_path(&b_override, None, default_dir.path()),
            Some(b_override.clone())
        );
    }

    #[test]
    fn opens_relative_name_from_env_dir() {
        let dir = tempdir().unwrap();
        write_book(dir.path(), "env-only-book.bin", &sample());
        let config = BookFileConfig {
            default_dir: dir.path().join("missing"),
            ..BookFileConfig::default()
        };

        // SAFETY: other tests only open absolute paths or names missing here
        unsafe { env::set_var(BOOK_DIR_ENV, dir.path()) };
        let mut store = BookStore::new();
        let opened = store.open("env-only-book.bin", &config);
        unsafe { env::remove_var(BOOK_DIR_ENV) };

        opened.unwrap();
        assert_eq!(store.path(), Some(dir.path().join("env-only-book.bin").as_path()));
        assert_eq!(store.len(), 6);
    }
}
