//! Error type shared by the srclink core.
//!
//! Path resolution failures are not errors (they surface as `None`), and
//! checksum mismatches are reported through [`crate::verify::MissingFiles`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SrcLinkError {
    /// A remote URL or template did not match the shape a provider expects.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The same source file carries two different checksums inside one symbol file.
    #[error("conflicting checksums for '{path}' in symbol file: {first} vs {second}")]
    ExtractionIntegrity {
        path: String,
        first: String,
        second: String,
    },

    /// The source index could not be generated (e.g. malformed revision).
    #[error("cannot generate source index: {0}")]
    IndexGeneration(String),

    #[error("PDB error: {1} ({0})")]
    Pdb(&'static str, #[source] pdb::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SrcLinkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SrcLinkError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SrcLinkError>;
