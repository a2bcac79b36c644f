use std::path::{Path, PathBuf};

use crate::book_file::BookRecord;

pub fn record(key: u64, mv: u16, weight: u16) -> BookRecord {
    BookRecord {
        key,
        mv,
        weight,
        ..BookRecord::default()
    }
}

/// Packs a book move the way Polyglot files store it: origin in bits 6-11,
/// destination in bits 0-5.
pub fn packed(from: u8, to: u8) -> u16 {
    (u16::from(from) << 6) | u16::from(to)
}

/// Writes `records` to `dir/name` after sorting them by key.
pub fn write_book(dir: &Path, name: &str, records: &[BookRecord]) -> PathBuf {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.key);
    let bytes: Vec<u8> = sorted.iter().flat_map(|r| r.to_bytes()).collect();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
