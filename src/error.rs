//! Library-wide error and result types.
//!
//! Only the internal decoding steps return these. The resolver surface in
//! [`crate::resolver`] turns every failure into an absent value.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result alias used throughout samplekit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
#[derive(Debug)]
pub enum Error {
    /// No host binary was configured and none of the default locations
    /// exist, or the configured one could not be read.
    BinaryUnavailable(Option<PathBuf>),
    /// An offset or size field would read outside the buffer.
    InvalidRange,
    /// A structural constraint was violated (message describes which one).
    Parse(&'static str),
    /// zlib inflation failed.
    Zlib(io::Error),
    /// Zstandard decompression failed.
    #[cfg(feature = "zstd")]
    Zstd(io::Error),
    /// A decoded document was not valid JSON.
    Json(serde_json::Error),
    /// An underlying I/O operation failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BinaryUnavailable(Some(p)) => {
                write!(f, "host binary unavailable: {}", p.display())
            }
            Error::BinaryUnavailable(None) => write!(f, "no host binary found"),
            Error::InvalidRange => write!(f, "invalid offset or size"),
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::Zlib(e) => write!(f, "zlib decompression failed: {e}"),
            #[cfg(feature = "zstd")]
            Error::Zstd(e) => write!(f, "zstd decompression failed: {e}"),
            Error::Json(e) => write!(f, "invalid document: {e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Zlib(e) | Error::Io(e) => Some(e),
            #[cfg(feature = "zstd")]
            Error::Zstd(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
