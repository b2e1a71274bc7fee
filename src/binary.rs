//! The host executable and where to find it.
//!
//! The binary is read into memory once and never modified. Lookup order is
//! an explicit path, then the [`BINARY_ENV`] environment variable, then the
//! caller's search paths, then [`default_locations`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable naming the host binary.
pub const BINARY_ENV: &str = "SAMPLEKIT_BINARY";

/// An executable image held in memory.
#[derive(Debug, Clone)]
pub struct ResourceBinary {
    bytes: Vec<u8>,
    path: Option<PathBuf>,
}

impl ResourceBinary {
    /// Wrap bytes already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, path: None }
    }

    /// Read the whole file at `path`.
    ///
    /// Returns [`Error::BinaryUnavailable`] if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            log::warn!("cannot read {}: {e}", path.display());
            Error::BinaryUnavailable(Some(path.to_path_buf()))
        })?;
        log::debug!("loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            bytes,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Where the image was read from, if it came from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Conventional install locations of `app` on this platform.
pub fn default_locations(app: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();

    #[cfg(target_os = "windows")]
    for var in ["ProgramFiles", "ProgramFiles(x86)", "LOCALAPPDATA"] {
        if let Some(root) = std::env::var_os(var) {
            let root = PathBuf::from(root);
            out.push(root.join(app).join(format!("{app}.exe")));
            if var == "LOCALAPPDATA" {
                out.push(root.join("Programs").join(app).join(format!("{app}.exe")));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let bundle = format!("{app}.app/Contents/MacOS/{app}");
        out.push(Path::new("/Applications").join(&bundle));
        if let Some(home) = std::env::var_os("HOME") {
            out.push(PathBuf::from(home).join("Applications").join(&bundle));
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        let lower = app.to_lowercase();
        out.push(Path::new("/usr/bin").join(&lower));
        out.push(Path::new("/usr/local/bin").join(&lower));
        out.push(Path::new("/opt").join(app).join(&lower));
        if let Some(home) = std::env::var_os("HOME") {
            out.push(PathBuf::from(home).join(".local/bin").join(&lower));
        }
    }

    out
}

/// Pick the binary to load.
///
/// `explicit` wins outright (even if it does not exist, so a bad setting is
/// reported rather than silently replaced). Otherwise the first existing
/// candidate from the environment, `search`, and the defaults for `app`.
pub fn find_binary(explicit: Option<&Path>, search: &[PathBuf], app: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(Error::BinaryUnavailable(Some(path.to_path_buf())))
        };
    }

    candidates(search, app)
        .into_iter()
        .find(|p| p.is_file())
        .ok_or(Error::BinaryUnavailable(None))
}

/// Every implicit location tried when no explicit path is set, in order:
/// [`BINARY_ENV`], `search`, then [`default_locations`] for `app`.
pub fn candidates(search: &[PathBuf], app: Option<&str>) -> Vec<PathBuf> {
    let from_env = std::env::var_os(BINARY_ENV).map(PathBuf::from);
    let defaults = app.map(default_locations).unwrap_or_default();

    from_env
        .into_iter()
        .chain(search.iter().cloned())
        .chain(defaults)
        .collect()
}
