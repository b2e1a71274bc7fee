//! The resource container compiled into the host binary.
//!
//! The container has no header and no index pointing at it. It is three
//! tables laid down independently by the resource compiler, and their
//! positions inside the executable change from build to build. The
//! submodules find them from byte patterns alone and then read through
//! them.
//!
//! ## Name table
//! Back-to-back records, one per distinct path segment:
//! ```text
//! [0x00] Length          (u16 BE, UTF-16 code units)
//! [0x02] Hash            (u32 BE, see crate::hash)
//! [0x06] Text            (Length × u16 BE, UTF-16)
//! ```
//!
//! ## Tree table
//! Fixed-size nodes; node 0 is the unnamed root.
//! ```text
//! [0x00] NameOffset      (u32 BE, relative to the name table)
//! [0x04] Flags           (u16 BE; 0x01 zlib, 0x02 directory, 0x04 zstd)
//! directory:
//! [0x06] ChildCount      (u32 BE)
//! [0x0A] FirstChild      (u32 BE, node index)
//! file:
//! [0x06] Territory       (u16 BE)
//! [0x08] Language        (u16 BE)
//! [0x0A] DataOffset      (u32 BE, relative to the data table)
//! [0x0E] LastModified    (u64 BE, only in 22-byte nodes)
//! ```
//!
//! ## Data table
//! ```text
//! [0x00] TotalSize       (u32 BE)
//! [0x04] Payload         (TotalSize bytes: raw, zlib, or
//!                         u32 BE uncompressed length + zlib)
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`locate`] | Finds the three table bases |
//! | [`names`]  | Finds a name record by (length, hash, text) |
//! | [`tree`]   | Maps a name offset to a data offset |
//! | [`data`]   | Reads and decodes one data record |
//! | [`index`]  | One forward walk over every data record |

pub mod data;
pub mod index;
pub mod locate;
pub mod names;
pub mod tree;

use serde::{Deserialize, Serialize};

pub use data::{EntryKind, classify, read_entry};
pub use index::{EntryIndex, IndexedEntry, build_index};
pub use locate::locate;
pub use names::find_name;
pub use tree::{TreeNode, TreeTable};

/// Offsets of the three container tables inside a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureLocation {
    /// Start of node 0 (the root).
    pub tree_base: usize,
    /// Start of the first name record.
    pub name_base: usize,
    /// Start of the first data record.
    pub data_base: usize,
    /// Tree node stride: [`tree::NODE_SIZE`] or [`tree::NODE_SIZE_V2`].
    pub node_size: usize,
}

impl StructureLocation {
    /// The tree table described by this location.
    pub fn tree(&self) -> TreeTable {
        TreeTable {
            base: self.tree_base,
            node_size: self.node_size,
        }
    }
}

/// Tunables describing what the host's catalog looks like inside the
/// container, and how far to search for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Name of the catalog's root directory. It must be the first record of
    /// the name table.
    pub anchor: String,
    /// Substring every catalog document contains.
    pub marker: String,
    /// File used to pin down the data table. Defaults to the first catalog
    /// slot's file.
    pub probe_file: Option<String>,
    /// Bytes searched for the anchor, from the start of the binary.
    pub anchor_window: usize,
    /// Bytes searched for a name record, from the name table start.
    pub name_window: usize,
    /// Bytes searched backward from the name table for the root node.
    pub tree_window: usize,
    /// Bytes searched on either side of the name table for the data table.
    pub data_window: usize,
    /// Largest child count accepted for the root node.
    pub max_root_children: u32,
    /// Smallest child count accepted for the catalog directory.
    pub min_slot_children: u32,
    /// Largest child count accepted for the catalog directory.
    pub max_slot_children: u32,
    /// Data records larger than this end the sequential walk.
    pub max_entry_size: usize,
    /// Largest decompressed entry accepted.
    pub inflate_limit: usize,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            anchor: "samplemaps".to_owned(),
            marker: "\"tilesetId\"".to_owned(),
            probe_file: None,
            anchor_window: 48 << 20,
            name_window: 1 << 20,
            tree_window: 1 << 20,
            data_window: 48 << 20,
            max_root_children: 16,
            min_slot_children: 1,
            max_slot_children: 512,
            max_entry_size: 16 << 20,
            inflate_limit: 64 << 20,
        }
    }
}

impl Profile {
    /// The document marker as bytes.
    #[inline]
    pub fn marker_bytes(&self) -> &[u8] {
        self.marker.as_bytes()
    }
}
