//! The fixed list of sample maps the host ships.
//!
//! Slots are configuration, not something read from the binary. A catalog
//! can be built in code ([`Catalog::numbered`]) or loaded from JSON together
//! with the rest of a [`ResolverConfig`].
//!
//! ## JSON form
//! ```json
//! {
//!   "app_name": "MapEditor",
//!   "catalog": [
//!     { "number": 1, "name": "Meadow", "category": "field",
//!       "file_name": "Map001.json", "preview_name": "Map001.png" }
//!   ],
//!   "profile": { "anchor": "samplemaps" }
//! }
//! ```
//! Every key except `catalog` is optional.

use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::container::Profile;
use crate::{Error, Result};

/// Largest catalog accepted.
pub const MAX_SLOTS: usize = 128;

/// Host application name used when a configuration does not give one.
pub const DEFAULT_APP_NAME: &str = "MapEditor";

/// Slot count of the stock catalog.
pub const DEFAULT_SLOT_COUNT: u32 = 104;

/// One logical catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSlot {
    /// Slot number, unique within the catalog.
    pub number: u32,
    /// Display name.
    pub name: String,
    pub category: String,
    /// Document file name inside the catalog directory.
    pub file_name: String,
    /// Preview image file name, if the host stores one under its own name.
    #[serde(default)]
    pub preview_name: Option<String>,
}

/// Ordered, validated list of slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CatalogSlot>", into = "Vec<CatalogSlot>")]
pub struct Catalog {
    slots: Vec<CatalogSlot>,
}

impl Catalog {
    /// Validate and wrap `slots`, keeping their order.
    ///
    /// Slot numbers and file names must be unique, and there may be at most
    /// [`MAX_SLOTS`] slots.
    pub fn new(slots: Vec<CatalogSlot>) -> Result<Self> {
        if slots.len() > MAX_SLOTS {
            return Err(Error::Parse("catalog has too many slots"));
        }
        let mut numbers = HashSet::new();
        let mut files = HashSet::new();
        for slot in &slots {
            if !numbers.insert(slot.number) {
                return Err(Error::Parse("duplicate slot number"));
            }
            if slot.file_name.is_empty() || !files.insert(slot.file_name.as_str()) {
                return Err(Error::Parse("missing or duplicate slot file name"));
            }
        }
        Ok(Self { slots })
    }

    /// Slots `1..=count` named `Map{n:03}.json` with `Map{n:03}.png`
    /// previews.
    pub fn numbered(count: u32, category: &str) -> Self {
        let slots = (1..=count.min(MAX_SLOTS as u32))
            .map(|n| CatalogSlot {
                number: n,
                name: format!("Sample Map {n}"),
                category: category.to_owned(),
                file_name: format!("Map{n:03}.json"),
                preview_name: Some(format!("Map{n:03}.png")),
            })
            .collect();
        Self { slots }
    }

    /// Slot with number `number`.
    pub fn get(&self, number: u32) -> Option<&CatalogSlot> {
        self.slots.iter().find(|s| s.number == number)
    }

    /// Slots in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl TryFrom<Vec<CatalogSlot>> for Catalog {
    type Error = Error;

    fn try_from(slots: Vec<CatalogSlot>) -> Result<Self> {
        Catalog::new(slots)
    }
}

impl From<Catalog> for Vec<CatalogSlot> {
    fn from(catalog: Catalog) -> Self {
        catalog.slots
    }
}

/// Everything a [`crate::resolver::MapResolver`] needs besides the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub catalog: Catalog,
    #[serde(default)]
    pub profile: Profile,
    /// Extra places to look for the host binary, tried in order.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    /// Host application name used to derive default install locations.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl ResolverConfig {
    /// Configuration with the default profile and no search paths.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            profile: Profile::default(),
            search_paths: Vec::new(),
            app_name: default_app_name(),
        }
    }

    /// Load a configuration from JSON.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// File used to verify the data table: the profile's override, else the
    /// first slot's document.
    pub fn probe_file(&self) -> Option<&str> {
        self.profile
            .probe_file
            .as_deref()
            .or_else(|| self.catalog.iter().next().map(|s| s.file_name.as_str()))
    }
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_owned()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new(Catalog::numbered(DEFAULT_SLOT_COUNT, "sample"))
    }
}
