//! Tree table access.
//!
//! Nodes are fixed-size records addressed by index. Children of a directory
//! occupy the contiguous index range `first_child .. first_child +
//! child_count`, so the extent of the whole tree follows from its
//! directories.

use crate::utils::{be_u16_at, be_u32_at};

/// Node stride written by older resource compilers.
pub const NODE_SIZE: usize = 14;
/// Node stride when each node carries a modification timestamp.
pub const NODE_SIZE_V2: usize = 22;
/// Upper bound on nodes visited by any walk.
pub const MAX_TREE_NODES: usize = 1024;

/// Node flag: payload is zlib-compressed.
pub const FLAG_COMPRESSED: u16 = 0x01;
/// Node flag: node is a directory.
pub const FLAG_DIRECTORY: u16 = 0x02;
/// Node flag: payload is Zstandard-compressed.
pub const FLAG_COMPRESSED_ZSTD: u16 = 0x04;

/// One decoded tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNode {
    Directory {
        name_offset: u32,
        child_count: u32,
        first_child: u32,
    },
    File {
        name_offset: u32,
        flags: u16,
        territory: u16,
        language: u16,
        /// Relative to the data table.
        data_offset: u32,
    },
}

impl TreeNode {
    /// Offset of this node's name record, relative to the name table.
    pub fn name_offset(&self) -> u32 {
        match *self {
            TreeNode::Directory { name_offset, .. } | TreeNode::File { name_offset, .. } => {
                name_offset
            }
        }
    }
}

/// A tree table at a known position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeTable {
    /// Absolute offset of node 0.
    pub base: usize,
    /// Node stride in bytes.
    pub node_size: usize,
}

impl TreeTable {
    /// Decode node `index`, or [`None`] if it lies outside `buf`.
    pub fn node(&self, buf: &[u8], index: usize) -> Option<TreeNode> {
        let at = index
            .checked_mul(self.node_size)
            .and_then(|o| o.checked_add(self.base))?;
        read_node(buf, at)
    }

    /// Number of nodes reachable from the root, capped at
    /// [`MAX_TREE_NODES`].
    pub fn node_count(&self, buf: &[u8]) -> usize {
        let mut count = 1usize;
        let mut i = 0usize;
        while i < count && i < MAX_TREE_NODES {
            match self.node(buf, i) {
                Some(TreeNode::Directory {
                    child_count,
                    first_child,
                    ..
                }) => {
                    let end = (first_child as usize).saturating_add(child_count as usize);
                    count = count.max(end).min(MAX_TREE_NODES);
                }
                Some(TreeNode::File { .. }) => {}
                None => return i,
            }
            i += 1;
        }
        count
    }

    /// Find the file node named by `name_offset` and return its data offset.
    ///
    /// Directories are skipped. [`None`] if no file in the tree has that
    /// name offset.
    pub fn resolve(&self, buf: &[u8], name_offset: u32) -> Option<u32> {
        (0..self.node_count(buf))
            .filter_map(|i| self.node(buf, i))
            .find_map(|node| match node {
                TreeNode::File {
                    name_offset: n,
                    data_offset,
                    ..
                } if n == name_offset => Some(data_offset),
                _ => None,
            })
    }
}

/// Decode the node starting at absolute offset `at`.
///
/// Only the first 14 bytes are read; a trailing timestamp is ignored.
pub fn read_node(buf: &[u8], at: usize) -> Option<TreeNode> {
    let name_offset = be_u32_at(buf, at)?;
    let flags = be_u16_at(buf, at + 4)?;
    if flags & FLAG_DIRECTORY != 0 {
        Some(TreeNode::Directory {
            name_offset,
            child_count: be_u32_at(buf, at + 6)?,
            first_child: be_u32_at(buf, at + 10)?,
        })
    } else {
        Some(TreeNode::File {
            name_offset,
            flags,
            territory: be_u16_at(buf, at + 6)?,
            language: be_u16_at(buf, at + 8)?,
            data_offset: be_u32_at(buf, at + 10)?,
        })
    }
}

/// Resolve `name_offset` through the tree at `tree_base`.
///
/// Convenience over [`TreeTable::resolve`] for the common 14-byte stride.
pub fn resolve_data_offset(buf: &[u8], tree_base: usize, name_offset: u32) -> Option<u32> {
    TreeTable {
        base: tree_base,
        node_size: NODE_SIZE,
    }
    .resolve(buf, name_offset)
}
