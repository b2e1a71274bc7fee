//! Structure discovery.
//!
//! Nothing in the binary points at the container, so each table is found
//! from evidence that only a genuine table would produce:
//!
//! 1. **Names**: the UTF-16BE text of [`Profile::anchor`], preceded by a
//!    matching length and hash. The anchor is the first name record, so its
//!    record start is the name table start.
//! 2. **Tree**: searching backward from the names, a root directory node
//!    (`name_offset == 0`, first child 1) whose first child is a directory
//!    with a catalog-sized child count. The node stride is detected here.
//! 3. **Data**: the probe file is resolved to a data offset `d`. Every zlib
//!    header near the names is a guess at where the probe's payload starts.
//!    A guess is kept when the payload inflates cleanly, contains
//!    [`Profile::marker`], and walking records from the implied table start
//!    lands exactly on `d` (any earlier document would pass the first two
//!    checks on its own).
//!
//! Every stage is fail-soft: a stage that finds nothing makes [`locate`]
//! return [`None`].

use super::data::{EntryKind, classify, read_entry};
use super::names::{NAME_HEADER_SIZE, find_name, is_record};
use super::tree::{NODE_SIZE, NODE_SIZE_V2, TreeNode, TreeTable, read_node};
use super::{Profile, StructureLocation};
use crate::compression::zlib;
use crate::utils::{be_u32_at, find_all, utf16be};

/// Record prefixes tried in front of a zlib header: the size field alone,
/// or the size field plus an uncompressed-length field.
const PAYLOAD_PREFIXES: [usize; 2] = [4, 8];

/// Upper bound on records stepped over when checking a table start.
const MAX_BOUNDARY_STEPS: usize = 1 << 16;

/// Find all three tables in `buf`.
///
/// `probe_file` names a catalog document used to verify the data table
/// start; it must be stored compressed.
pub fn locate(buf: &[u8], profile: &Profile, probe_file: &str) -> Option<StructureLocation> {
    let Some(name_base) = find_name_base(buf, profile) else {
        log::warn!("anchor {:?} not found in {} bytes", profile.anchor, buf.len());
        return None;
    };
    log::debug!("name table at {name_base:#x}");

    let Some(tree) = find_tree(buf, name_base, profile) else {
        log::warn!("no root node within {:#x} bytes before {name_base:#x}", profile.tree_window);
        return None;
    };
    log::debug!("tree table at {:#x} ({}-byte nodes)", tree.base, tree.node_size);

    let Some(data_base) = find_data_base(buf, name_base, tree, profile, probe_file) else {
        log::warn!("could not verify data table using {probe_file:?}");
        return None;
    };
    log::debug!("data table at {data_base:#x}");

    Some(StructureLocation {
        tree_base: tree.base,
        name_base,
        data_base,
        node_size: tree.node_size,
    })
}

/// Find the name table start from the anchor record.
pub fn find_name_base(buf: &[u8], profile: &Profile) -> Option<usize> {
    let anchor = &profile.anchor;
    if anchor.is_empty() {
        return None;
    }
    let text = utf16be(anchor);
    find_all(buf, &text, NAME_HEADER_SIZE, profile.anchor_window)
        .map(|hit| hit - NAME_HEADER_SIZE)
        .find(|&record| is_record(buf, record, anchor))
}

/// Find the root node searching backward from `name_base`.
pub fn find_tree(buf: &[u8], name_base: usize, profile: &Profile) -> Option<TreeTable> {
    let lowest = name_base.saturating_sub(profile.tree_window);
    let highest = name_base.checked_sub(NODE_SIZE)?;

    (lowest..=highest).rev().find_map(|base| {
        if !is_root(buf, base, profile) {
            return None;
        }
        [NODE_SIZE, NODE_SIZE_V2]
            .into_iter()
            .map(|node_size| TreeTable { base, node_size })
            .find(|table| is_catalog_dir(table.node(buf, 1), profile))
    })
}

fn is_root(buf: &[u8], at: usize, profile: &Profile) -> bool {
    matches!(
        read_node(buf, at),
        Some(TreeNode::Directory { name_offset: 0, child_count, first_child: 1 })
            if (1..=profile.max_root_children).contains(&child_count)
    )
}

fn is_catalog_dir(node: Option<TreeNode>, profile: &Profile) -> bool {
    matches!(
        node,
        Some(TreeNode::Directory { child_count, first_child, .. })
            if first_child > 1
                && (profile.min_slot_children..=profile.max_slot_children).contains(&child_count)
    )
}

/// Find the data table start by speculatively decoding the probe file.
pub fn find_data_base(
    buf: &[u8],
    name_base: usize,
    tree: TreeTable,
    profile: &Profile,
    probe_file: &str,
) -> Option<usize> {
    let name_offset = find_name(buf, name_base, probe_file, profile.name_window)?;
    let data_offset = tree.resolve(buf, name_offset)?;
    log::debug!("probe {probe_file:?} at data offset {data_offset:#x}");

    let from = name_base.saturating_sub(profile.data_window);
    let to = name_base.saturating_add(profile.data_window);
    let marker = profile.marker_bytes();

    zlib::ZLIB_MAGIC
        .iter()
        .flat_map(|magic| find_all(buf, magic, from, to))
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .flat_map(|hit| {
            PAYLOAD_PREFIXES
                .iter()
                .filter_map(move |prefix| hit.checked_sub(prefix + data_offset as usize))
        })
        .find(|&base| {
            read_entry(buf, base, data_offset, profile.inflate_limit)
                .is_ok_and(|bytes| classify(&bytes, marker) == EntryKind::Json)
                && is_record_boundary(buf, base, data_offset, profile)
        })
}

/// Whether stepping over records from `base` lands exactly on `data_offset`.
fn is_record_boundary(buf: &[u8], base: usize, data_offset: u32, profile: &Profile) -> bool {
    let target = data_offset as usize;
    let mut cursor = 0usize;
    for _ in 0..MAX_BOUNDARY_STEPS {
        if cursor >= target {
            return cursor == target;
        }
        match be_u32_at(buf, base + cursor) {
            Some(size) if size as usize <= profile.max_entry_size => cursor += 4 + size as usize,
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::name_hash;

    fn name_record(text: &str) -> Vec<u8> {
        let mut out = (text.encode_utf16().count() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(&name_hash(text).to_be_bytes());
        out.extend(utf16be(text));
        out
    }

    fn dir(name: u32, count: u32, first: u32) -> Vec<u8> {
        let mut n = name.to_be_bytes().to_vec();
        n.extend_from_slice(&0x0002u16.to_be_bytes());
        n.extend_from_slice(&count.to_be_bytes());
        n.extend_from_slice(&first.to_be_bytes());
        n
    }

    #[test]
    fn anchor_needs_a_valid_record() {
        let profile = Profile::default();
        // Bare text without a record header.
        let mut buf = vec![0u8; 16];
        buf.extend(utf16be("samplemaps"));
        assert_eq!(find_name_base(&buf, &profile), None);

        let genuine = buf.len();
        buf.extend(name_record("samplemaps"));
        assert_eq!(find_name_base(&buf, &profile), Some(genuine));
    }

    #[test]
    fn tree_search_skips_non_catalog_roots() {
        let profile = Profile::default();
        let mut buf = vec![0u8; 8];
        // A root-shaped node whose first child is a file.
        buf.extend(dir(0, 1, 1));
        buf.extend_from_slice(&[0, 0, 0, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let real = buf.len();
        buf.extend(dir(0, 1, 1));
        buf.extend(dir(0, 3, 2));
        let name_base = buf.len() + 10;
        buf.resize(name_base, 0xEE);

        let tree = find_tree(&buf, name_base, &profile).unwrap();
        assert_eq!(tree, TreeTable { base: real, node_size: NODE_SIZE });
    }

    #[test]
    fn tree_search_is_bounded_by_window() {
        let profile = Profile { tree_window: 16, ..Profile::default() };
        let mut buf = dir(0, 1, 1);
        buf.extend(dir(0, 3, 2));
        buf.resize(128, 0xEE);
        assert_eq!(find_tree(&buf, 128, &profile), None);
        assert!(find_tree(&buf, 40, &Profile::default()).is_some());
    }
}
