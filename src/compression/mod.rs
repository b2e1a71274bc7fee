//! Decompression backends for container payloads.
//!
//! The resource compiler compresses large entries with zlib; newer builds
//! may use Zstandard instead. zlib is always available. Zstandard is gated
//! behind the `zstd` Cargo feature:
//!
//! ```toml
//! [dependencies]
//! samplekit = { version = "0.1", features = ["zstd"] }
//! ```
//!
//! ## Submodules
//!
//! | Module | Algorithm | Magic |
//! |--------|-----------|-------|
//! | [`zlib`] | zlib (RFC 1950) | `78 01`, `78 5E`, `78 9C`, `78 DA` |
//! | [`zstd`] | Zstandard frame | `28 B5 2F FD` |
//!
//! Both decoders refuse to produce more than the caller's output limit, so a
//! misaligned guess during structure discovery cannot balloon memory.

pub mod zlib;

#[cfg(feature = "zstd")]
pub mod zstd;
