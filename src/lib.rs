//! **samplekit** - locate and decode the sample maps a host application
//! compiles into its executable.
//!
//! The maps live in a resource container (name, tree and data tables) that
//! the host's build embeds with no published index. samplekit finds the
//! tables from byte patterns, then resolves a fixed catalog of map slots to
//! their JSON documents and preview images.
//!
//! # Modules
//! | Module | Role |
//! |--------|------|
//! | [`hash`]        | Name-table hash |
//! | [`container`]   | Table discovery and record readers |
//! | [`compression`] | zlib (and optionally Zstandard) payloads |
//! | [`binary`]      | Loading the host executable |
//! | [`catalog`]     | Slot list and resolver configuration |
//! | [`resolver`]    | Memoized catalog resolution |
//!
//! # Example
//! ```no_run
//! use samplekit::catalog::ResolverConfig;
//! use samplekit::resolver::MapResolver;
//!
//! let resolver = MapResolver::with_binary_path(ResolverConfig::default(), "/opt/MapEditor/mapeditor");
//! for entry in resolver.list() {
//!     println!("{:>3} {} {:?}x{:?}", entry.id, entry.name, entry.width, entry.height);
//! }
//! ```

pub mod binary;
pub mod catalog;
pub mod compression;
pub mod container;
pub mod error;
pub mod hash;
pub mod resolver;
pub(crate) mod utils;

pub use error::{Error, Result};
