//! Positional index of the data table.
//!
//! Records are stored back to back, so one forward walk from the table
//! start recovers every record's offset without consulting names or the
//! tree. The walk stops at the first header that cannot be a record.

use super::Profile;
use super::data::{EntryKind, classify, read_entry};
use crate::utils::be_u32_at;

/// Upper bound on records indexed by one walk.
pub const MAX_INDEXED_ENTRIES: usize = 16384;

/// One record found by the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedEntry {
    /// Offset relative to the data table.
    pub offset: u32,
    /// The record's `TotalSize` field.
    pub byte_length: u32,
    /// Classification of the decoded payload. Undecodable records are
    /// [`EntryKind::Other`].
    pub kind: EntryKind,
}

/// Records of the data table in storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryIndex {
    entries: Vec<IndexedEntry>,
}

impl EntryIndex {
    /// All records in storage order.
    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record at `position`.
    pub fn get(&self, position: usize) -> Option<&IndexedEntry> {
        self.entries.get(position)
    }

    /// Position of the record starting at `offset`.
    ///
    /// Offsets are strictly increasing, so this is a binary search.
    pub fn position_of(&self, offset: u32) -> Option<usize> {
        self.entries
            .binary_search_by_key(&offset, |e| e.offset)
            .ok()
    }

    /// Record at `position + delta`, if in range.
    pub fn neighbour(&self, position: usize, delta: isize) -> Option<&IndexedEntry> {
        self.get(position.checked_add_signed(delta)?)
    }
}

/// Walk the data table at `data_base` and classify every record.
///
/// A `TotalSize` above [`Profile::max_entry_size`], or a record running past
/// the buffer, ends the walk. Empty records are indexed like any other.
pub fn build_index(buf: &[u8], data_base: usize, profile: &Profile) -> EntryIndex {
    let marker = profile.marker_bytes();
    let mut entries = Vec::new();
    let mut cursor = 0usize;

    while entries.len() < MAX_INDEXED_ENTRIES {
        let Ok(offset) = u32::try_from(cursor) else {
            break;
        };
        let Some(size) = be_u32_at(buf, data_base + cursor) else {
            break;
        };
        let end = data_base + cursor + 4 + size as usize;
        if size as usize > profile.max_entry_size || end > buf.len() {
            break;
        }

        let kind = match read_entry(buf, data_base, offset, profile.inflate_limit) {
            Ok(bytes) => classify(&bytes, marker),
            Err(_) => EntryKind::Other,
        };
        entries.push(IndexedEntry {
            offset,
            byte_length: size,
            kind,
        });
        cursor += 4 + size as usize;
    }

    log::debug!(
        "indexed {} data records from {data_base:#x} ({} documents)",
        entries.len(),
        entries.iter().filter(|e| e.kind == EntryKind::Json).count()
    );
    EntryIndex { entries }
}
