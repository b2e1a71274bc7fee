//! Catalog resolution over a discovered container.
//!
//! [`MapResolver`] is the entry point for callers. It owns one *session* per
//! configured binary. A session memoizes, each exactly once:
//!
//! * the loaded [`ResourceBinary`],
//! * the [`StructureLocation`] (or its absence),
//! * the sequential [`EntryIndex`] of the data table,
//! * the [`ExtractedAssets`] for the whole catalog.
//!
//! Changing the binary path or calling [`MapResolver::clear_cache`] swaps in
//! a fresh session, so nothing computed against one binary is ever paired
//! with another.
//!
//! ## Resolution order
//! For each slot, in catalog order:
//!
//! 1. **Direct**: name record → tree leaf → data record. Accepted if it is a
//!    JSON object containing the document marker.
//! 2. **Adjacent**: the tree leaf exists but holds something else (usually
//!    the preview image stored beside the document). The records at index
//!    positions `+1, -1, +2, -2` around it are tried.
//! 3. **Unclaimed**: the slot has no tree leaf at all. The first document in
//!    the data table that no other slot has claimed is taken.
//!
//! Direct results are claimed for every slot before any adjacent probe runs,
//! and unclaimed recovery runs last.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;

use crate::binary::{ResourceBinary, find_binary};
use crate::catalog::{CatalogSlot, ResolverConfig};
use crate::container::{
    EntryIndex, EntryKind, Profile, StructureLocation, build_index, classify, find_name, locate,
    read_entry,
};

/// Index deltas probed around a tree leaf that holds the wrong content.
const DOCUMENT_PROBES: [isize; 4] = [1, -1, 2, -2];
/// Index deltas probed around a document for its preview image.
const PREVIEW_PROBES: [isize; 4] = [-1, 1, -2, 2];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Which step of the resolution order produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Direct,
    Adjacent,
    Unclaimed,
}

/// A slot's document and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub document: Value,
    /// Offset of the document's record, relative to the data table.
    pub data_offset: u32,
    pub strategy: Strategy,
}

/// Everything learned about one slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotResolution {
    /// Data offset of the slot file's tree leaf, if it has one.
    pub tree_offset: Option<u32>,
    pub document: Option<ResolvedDocument>,
}

/// Resolution results for a whole catalog, keyed by slot number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedAssets {
    slots: BTreeMap<u32, SlotResolution>,
}

impl ExtractedAssets {
    /// Everything known about slot `number`.
    pub fn slot(&self, number: u32) -> Option<&SlotResolution> {
        self.slots.get(&number)
    }

    /// The decoded document of slot `number`.
    pub fn document(&self, number: u32) -> Option<&Value> {
        self.slots
            .get(&number)?
            .document
            .as_ref()
            .map(|d| &d.document)
    }

    /// Number of slots with a document.
    pub fn resolved_count(&self) -> usize {
        self.slots.values().filter(|s| s.document.is_some()).count()
    }
}

/// One row of the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub tileset_id: Option<i64>,
}

impl CatalogEntry {
    fn new(slot: &CatalogSlot, document: Option<&Value>) -> Self {
        let dimension = |key: &str| {
            document?
                .get(key)?
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
        };
        Self {
            id: slot.number,
            name: slot.name.clone(),
            category: slot.category.clone(),
            width: dimension("width"),
            height: dimension("height"),
            tileset_id: document.and_then(|d| d.get("tilesetId")?.as_i64()),
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    /// Environment, configured search paths, platform defaults.
    Search,
    Path(PathBuf),
    Memory(Arc<ResourceBinary>),
}

#[derive(Debug)]
struct Session {
    source: Source,
    binary: OnceLock<Option<Arc<ResourceBinary>>>,
    location: OnceLock<Option<StructureLocation>>,
    index: OnceLock<EntryIndex>,
    assets: OnceLock<ExtractedAssets>,
}

impl Session {
    fn new(source: Source) -> Self {
        Self {
            source,
            binary: OnceLock::new(),
            location: OnceLock::new(),
            index: OnceLock::new(),
            assets: OnceLock::new(),
        }
    }
}

/// Memoizing front end over the container readers.
///
/// All methods take `&self`; the resolver is `Send + Sync` and discovery runs
/// once per session even when first requested from several threads.
#[derive(Debug)]
pub struct MapResolver {
    config: ResolverConfig,
    session: RwLock<Arc<Session>>,
    discoveries: AtomicUsize,
}

impl MapResolver {
    /// Resolver that searches for the binary on first use.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_source(config, Source::Search)
    }

    /// Resolver reading the binary at `path`.
    pub fn with_binary_path(config: ResolverConfig, path: impl Into<PathBuf>) -> Self {
        Self::with_source(config, Source::Path(path.into()))
    }

    /// Resolver over an image already in memory.
    pub fn from_binary(config: ResolverConfig, binary: ResourceBinary) -> Self {
        Self::with_source(config, Source::Memory(Arc::new(binary)))
    }

    fn with_source(config: ResolverConfig, source: Source) -> Self {
        Self {
            config,
            session: RwLock::new(Arc::new(Session::new(source))),
            discoveries: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Use the binary at `path` from now on, dropping every cached result.
    pub fn set_binary_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::info!("binary path set to {}", path.display());
        self.replace_session(|_| Source::Path(path));
    }

    /// Drop every cached result; the next access rediscovers the container.
    pub fn clear_cache(&self) {
        self.replace_session(Source::clone);
    }

    /// Whether the container was found in the current binary.
    ///
    /// Runs discovery if it has not run yet.
    pub fn is_available(&self) -> bool {
        self.location().is_some()
    }

    /// The discovered table offsets.
    pub fn location(&self) -> Option<StructureLocation> {
        let session = self.session();
        self.discovered(&session).map(|(_, loc)| loc)
    }

    /// How many structure discoveries this resolver has run.
    pub fn discovery_count(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }

    /// Path of the loaded binary, if it came from disk.
    pub fn binary_path(&self) -> Option<PathBuf> {
        let session = self.session();
        self.binary(&session)?.path().map(PathBuf::from)
    }

    /// Listing of every catalog slot; sizes and tileset are filled in only
    /// for resolved slots.
    pub fn list(&self) -> Vec<CatalogEntry> {
        let session = self.session();
        let assets = self.assets(&session);
        self.config
            .catalog
            .iter()
            .map(|slot| CatalogEntry::new(slot, assets.document(slot.number)))
            .collect()
    }

    /// The decoded document of slot `number`.
    pub fn map_data(&self, number: u32) -> Option<Value> {
        let session = self.session();
        self.assets(&session).document(number).cloned()
    }

    /// Everything learned about slot `number`.
    pub fn slot_resolution(&self, number: u32) -> Option<SlotResolution> {
        let session = self.session();
        self.assets(&session).slot(number).cloned()
    }

    /// PNG preview of slot `number`.
    ///
    /// Tried in order: the slot's own preview file, whatever the slot's
    /// document leaf points at, then the records around the resolved
    /// document.
    pub fn preview(&self, number: u32) -> Option<Vec<u8>> {
        let slot = self.config.catalog.get(number)?;
        let session = self.session();
        let (buf, loc) = self.discovered(&session)?;
        let profile = &self.config.profile;
        let png = |offset: u32| {
            read_entry(buf, loc.data_base, offset, profile.inflate_limit)
                .ok()
                .filter(|bytes| classify(bytes, profile.marker_bytes()) == EntryKind::Png)
        };

        if let Some(name) = &slot.preview_name
            && let Some(offset) = leaf_offset(buf, &loc, profile, name)
            && let Some(bytes) = png(offset)
        {
            return Some(bytes);
        }

        let resolution = self.assets(&session).slot(number)?;
        if let Some(bytes) = resolution.tree_offset.and_then(&png) {
            return Some(bytes);
        }

        let document_offset = resolution.document.as_ref()?.data_offset;
        let index = self.index(&session, buf, &loc);
        let position = index.position_of(document_offset)?;
        PREVIEW_PROBES
            .iter()
            .filter_map(|&delta| index.neighbour(position, delta))
            .filter(|entry| entry.kind == EntryKind::Png)
            .find_map(|entry| png(entry.offset))
    }

    fn session(&self) -> Arc<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a fresh session whose source is derived from the current one,
    /// all under a single write lock.
    fn replace_session(&self, next: impl FnOnce(&Source) -> Source) {
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        let source = next(&current.source);
        *current = Arc::new(Session::new(source));
    }

    fn binary<'s>(&self, session: &'s Session) -> Option<&'s ResourceBinary> {
        session
            .binary
            .get_or_init(|| {
                let loaded = match &session.source {
                    Source::Memory(binary) => return Some(Arc::clone(binary)),
                    Source::Path(path) => ResourceBinary::open(path),
                    Source::Search => find_binary(
                        None,
                        &self.config.search_paths,
                        Some(self.config.app_name.as_str()),
                    )
                    .and_then(ResourceBinary::open),
                };
                loaded
                    .inspect_err(|e| log::warn!("sample maps unavailable: {e}"))
                    .ok()
                    .map(Arc::new)
            })
            .as_deref()
    }

    fn discovered<'s>(&self, session: &'s Session) -> Option<(&'s [u8], StructureLocation)> {
        let buf = self.binary(session)?.bytes();
        let location = session.location.get_or_init(|| {
            let probe = self.config.probe_file()?;
            self.discoveries.fetch_add(1, Ordering::SeqCst);
            locate(buf, &self.config.profile, probe)
        });
        location.map(|loc| (buf, loc))
    }

    fn index<'s>(&self, session: &'s Session, buf: &[u8], loc: &StructureLocation) -> &'s EntryIndex {
        session
            .index
            .get_or_init(|| build_index(buf, loc.data_base, &self.config.profile))
    }

    fn assets<'s>(&self, session: &'s Session) -> &'s ExtractedAssets {
        session.assets.get_or_init(|| {
            let Some((buf, loc)) = self.discovered(session) else {
                return ExtractedAssets::default();
            };
            let index = self.index(session, buf, &loc);
            resolve_catalog(buf, &loc, index, &self.config)
        })
    }
}

/// Resolve every slot of `config.catalog`.
pub fn resolve_catalog(
    buf: &[u8],
    loc: &StructureLocation,
    index: &EntryIndex,
    config: &ResolverConfig,
) -> ExtractedAssets {
    let profile = &config.profile;
    let mut slots = BTreeMap::new();
    let mut claimed = HashSet::new();

    for slot in config.catalog.iter() {
        let tree_offset = leaf_offset(buf, loc, profile, &slot.file_name);
        let document = tree_offset.and_then(|offset| {
            let document = load_document(buf, loc, profile, offset)?;
            claimed.insert(offset);
            Some(ResolvedDocument {
                document,
                data_offset: offset,
                strategy: Strategy::Direct,
            })
        });
        slots.insert(
            slot.number,
            SlotResolution {
                tree_offset,
                document,
            },
        );
    }

    for slot in config.catalog.iter() {
        let Some(resolution) = slots.get_mut(&slot.number) else {
            continue;
        };
        if resolution.document.is_some() {
            continue;
        }
        let candidates: Vec<u32> = match resolution.tree_offset {
            Some(offset) => index
                .position_of(offset)
                .map(|position| {
                    DOCUMENT_PROBES
                        .iter()
                        .filter_map(|&delta| index.neighbour(position, delta))
                        .filter(|e| e.kind == EntryKind::Json)
                        .map(|e| e.offset)
                        .collect()
                })
                .unwrap_or_default(),
            // Recovered after every adjacent probe has had its turn.
            None => continue,
        };
        resolution.document =
            claim_first(buf, loc, profile, candidates, &mut claimed, Strategy::Adjacent);
        if resolution.document.is_none() {
            log::debug!("slot {} ({}): leaf holds no document", slot.number, slot.file_name);
        }
    }

    for slot in config.catalog.iter() {
        let Some(resolution) = slots.get_mut(&slot.number) else {
            continue;
        };
        if resolution.tree_offset.is_some() || resolution.document.is_some() {
            continue;
        }
        let candidates: Vec<u32> = index
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Json)
            .map(|e| e.offset)
            .collect();
        resolution.document =
            claim_first(buf, loc, profile, candidates, &mut claimed, Strategy::Unclaimed);
        if resolution.document.is_none() {
            log::debug!("slot {} ({}): not in tree, nothing left to claim", slot.number, slot.file_name);
        }
    }

    let assets = ExtractedAssets { slots };
    log::info!(
        "resolved {} of {} catalog slots",
        assets.resolved_count(),
        config.catalog.len()
    );
    assets
}

fn claim_first(
    buf: &[u8],
    loc: &StructureLocation,
    profile: &Profile,
    candidates: Vec<u32>,
    claimed: &mut HashSet<u32>,
    strategy: Strategy,
) -> Option<ResolvedDocument> {
    let (data_offset, document) = candidates
        .into_iter()
        .filter(|offset| !claimed.contains(offset))
        .find_map(|offset| Some((offset, load_document(buf, loc, profile, offset)?)))?;
    claimed.insert(data_offset);
    Some(ResolvedDocument {
        document,
        data_offset,
        strategy,
    })
}

/// Data offset of `file_name`'s tree leaf.
fn leaf_offset(buf: &[u8], loc: &StructureLocation, profile: &Profile, file_name: &str) -> Option<u32> {
    let name_offset = find_name(buf, loc.name_base, file_name, profile.name_window)?;
    loc.tree().resolve(buf, name_offset)
}

/// Decode the record at `offset` as a catalog document.
fn load_document(buf: &[u8], loc: &StructureLocation, profile: &Profile, offset: u32) -> Option<Value> {
    let bytes = read_entry(buf, loc.data_base, offset, profile.inflate_limit).ok()?;
    if classify(&bytes, profile.marker_bytes()) != EntryKind::Json {
        return None;
    }
    let text = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    serde_json::from_slice::<Value>(text)
        .ok()
        .filter(Value::is_object)
}
