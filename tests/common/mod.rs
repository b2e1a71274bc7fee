//! Builds synthetic host binaries with an embedded resource container.
//!
//! Layout produced by [`ContainerBuilder::build`]:
//! ```text
//! junk | data table | junk | tree table | junk | name table | junk
//! ```
//! The tree holds a root directory, the catalog directory, and one leaf per
//! [`ContainerBuilder::file`] call.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use samplekit::catalog::{Catalog, CatalogSlot, ResolverConfig};
use samplekit::hash::name_hash;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// How a data record's payload is stored.
#[derive(Debug, Clone)]
pub enum Payload {
    Raw(Vec<u8>),
    /// Bare zlib stream.
    Zlib(Vec<u8>),
    /// u32 BE uncompressed length followed by a zlib stream.
    Prefixed(Vec<u8>),
    /// zlib magic followed by garbage.
    Corrupt,
}

impl Payload {
    fn encode(&self) -> Vec<u8> {
        match self {
            Payload::Raw(b) => b.clone(),
            Payload::Zlib(b) => zlib(b),
            Payload::Prefixed(b) => {
                let mut out = (b.len() as u32).to_be_bytes().to_vec();
                out.extend(zlib(b));
                out
            }
            Payload::Corrupt => vec![0x78, 0x9C, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x11],
        }
    }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// A map document carrying the default marker.
pub fn document(width: u32, height: u32, tileset: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "width": width,
        "height": height,
        "tilesetId": tileset,
        "data": vec![0; (width * height) as usize],
    }))
    .unwrap()
}

/// A small fake PNG.
pub fn png(seed: u8) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    out.extend_from_slice(b"\x00\x00\x00\x0DIHDR");
    out.extend(std::iter::repeat_n(seed, 32));
    out
}

pub fn name_record(text: &str, hash: u32) -> Vec<u8> {
    let mut out = (text.encode_utf16().count() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(&hash.to_be_bytes());
    out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    out
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub bytes: Vec<u8>,
    pub tree_base: usize,
    pub name_base: usize,
    pub data_base: usize,
    /// Data offset of every record, in table order.
    pub data_offsets: Vec<u32>,
    /// Decoded content of every record, in table order.
    pub contents: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    anchor: String,
    records: Vec<Payload>,
    files: Vec<(String, usize)>,
    extra_names: Vec<(String, u32)>,
    node_size: usize,
}

impl ContainerBuilder {
    pub fn new(anchor: &str) -> Self {
        Self {
            anchor: anchor.to_owned(),
            records: Vec::new(),
            files: Vec::new(),
            extra_names: Vec::new(),
            node_size: 14,
        }
    }

    /// Emit 22-byte tree nodes.
    pub fn wide_nodes(mut self) -> Self {
        self.node_size = 22;
        self
    }

    /// Append a data record; returns its position in the table.
    pub fn record(&mut self, payload: Payload) -> usize {
        self.records.push(payload);
        self.records.len() - 1
    }

    /// Add a tree leaf named `name` pointing at record `position`.
    pub fn file(&mut self, name: &str, position: usize) -> &mut Self {
        self.files.push((name.to_owned(), position));
        self
    }

    /// Add a name record with an arbitrary hash, placed before the files'
    /// names.
    pub fn raw_name(&mut self, text: &str, hash: u32) -> &mut Self {
        self.extra_names.push((text.to_owned(), hash));
        self
    }

    pub fn build(&self) -> Fixture {
        let mut bytes = vec![0xEE; 64];

        let data_base = bytes.len();
        let mut data_offsets = Vec::new();
        let mut contents = Vec::new();
        for payload in &self.records {
            data_offsets.push((bytes.len() - data_base) as u32);
            let encoded = payload.encode();
            bytes.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
            bytes.extend(encoded);
            contents.push(match payload {
                Payload::Raw(b) | Payload::Zlib(b) | Payload::Prefixed(b) => b.clone(),
                Payload::Corrupt => Vec::new(),
            });
        }
        // An oversized header ends the data table walk.
        bytes.extend_from_slice(&[0xFF; 4]);
        bytes.extend_from_slice(&[0xEE; 28]);

        // Names: anchor first, extras, then files.
        let mut names = name_record(&self.anchor, name_hash(&self.anchor));
        for (text, hash) in &self.extra_names {
            names.extend(name_record(text, *hash));
        }
        let mut file_name_offsets = Vec::new();
        for (name, _) in &self.files {
            file_name_offsets.push(names.len() as u32);
            names.extend(name_record(name, name_hash(name)));
        }

        let tree_base = bytes.len();
        let mut nodes = vec![
            node_dir(0, 1, 1),
            node_dir(0, self.files.len() as u32, 2),
        ];
        for ((_, position), name_offset) in self.files.iter().zip(&file_name_offsets) {
            nodes.push(node_file(*name_offset, 0x01, data_offsets[*position]));
        }
        for node in nodes {
            bytes.extend_from_slice(&node);
            bytes.resize(bytes.len() + self.node_size - 14, 0);
        }
        bytes.extend_from_slice(&[0xEE; 16]);

        let name_base = bytes.len();
        bytes.extend(names);
        bytes.extend_from_slice(&[0xEE; 64]);

        Fixture {
            bytes,
            tree_base,
            name_base,
            data_base,
            data_offsets,
            contents,
        }
    }
}

fn node_dir(name: u32, count: u32, first: u32) -> Vec<u8> {
    let mut n = name.to_be_bytes().to_vec();
    n.extend_from_slice(&0x0002u16.to_be_bytes());
    n.extend_from_slice(&count.to_be_bytes());
    n.extend_from_slice(&first.to_be_bytes());
    n
}

fn node_file(name: u32, flags: u16, data: u32) -> Vec<u8> {
    let mut n = name.to_be_bytes().to_vec();
    n.extend_from_slice(&flags.to_be_bytes());
    n.extend_from_slice(&[0, 0, 0, 0]);
    n.extend_from_slice(&data.to_be_bytes());
    n
}

/// Catalog of `SlotNNN.doc` files numbered `1..=count`.
pub fn slot_catalog(count: u32) -> Catalog {
    let slots = (1..=count)
        .map(|n| CatalogSlot {
            number: n,
            name: format!("Slot {n}"),
            category: if n % 2 == 0 { "even" } else { "odd" }.to_owned(),
            file_name: format!("Slot{n:03}.doc"),
            preview_name: None,
        })
        .collect();
    Catalog::new(slots).unwrap()
}

pub fn slot_config(count: u32) -> ResolverConfig {
    ResolverConfig::new(slot_catalog(count))
}
