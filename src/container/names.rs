//! Name table lookups.
//!
//! A record is trusted only when all three of its fields agree with the
//! target: the hash narrows the search, then the length and the decoded text
//! must match exactly. Two different names can share a hash.

use crate::hash::name_hash;
use crate::utils::{be_u16_at, be_u32_at, find_all, utf16be_at};

/// Size of the fixed part of a name record (length + hash).
pub const NAME_HEADER_SIZE: usize = 6;

/// Find `target`'s record in the name table at `name_base`.
///
/// Scans `window` bytes for the big-endian hash of `target` and verifies
/// every hit. Returns the offset of the record's length field relative to
/// `name_base`, or [`None`] if no verified record exists in the window.
pub fn find_name(buf: &[u8], name_base: usize, target: &str, window: usize) -> Option<u32> {
    let hash = name_hash(target).to_be_bytes();
    let start = name_base.checked_add(2)?;
    let end = name_base.saturating_add(window);

    find_all(buf, &hash, start, end)
        .map(|hit| hit - 2)
        .find(|&record| is_record(buf, record, target))
        .and_then(|record| u32::try_from(record - name_base).ok())
}

/// Whether a name record for `target` starts at absolute offset `record`.
pub fn is_record(buf: &[u8], record: usize, target: &str) -> bool {
    let units = target.encode_utf16().count();
    if be_u16_at(buf, record).map(usize::from) != Some(units) {
        return false;
    }
    if be_u32_at(buf, record + 2) != Some(name_hash(target)) {
        return false;
    }
    utf16be_at(buf, record + NAME_HEADER_SIZE, units).as_deref() == Some(target)
}

/// Decode the name record at `name_offset` (relative to `name_base`).
///
/// Only the length and text are read; the hash is not checked.
pub fn read_name(buf: &[u8], name_base: usize, name_offset: u32) -> Option<String> {
    let record = name_base.checked_add(name_offset as usize)?;
    let units = be_u16_at(buf, record)? as usize;
    utf16be_at(buf, record + NAME_HEADER_SIZE, units)
}
