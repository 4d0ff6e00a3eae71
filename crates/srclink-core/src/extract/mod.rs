//! Source file checksums recorded inside a symbol file.
//!
//! Two strategies exist and a symbol file uses exactly one of them:
//! - a listing produced by an external tool (paths only, no checksums);
//! - the `/src/files/` entries of the PDB name-to-stream directory, whose
//!   88-byte payloads end with the MD5 digest of the compiled file.

mod listing;
mod pdb_streams;
mod records;

pub use listing::parse_srctool_listing;
pub use pdb_streams::PdbStreamDirectory;
pub use records::{aggregate_checksums, ChecksumMap, ChecksumRecord};

use crate::error::Result;

/// Named streams carrying source checksums contain this segment.
pub const SOURCE_FILE_MARKER: &str = "/src/files/";

/// Only checksum streams of exactly this size are understood.
pub const CHECKSUM_STREAM_LEN: usize = 88;

/// The digest occupies the last 16 bytes of a checksum stream.
const DIGEST_OFFSET: usize = CHECKSUM_STREAM_LEN - 16;

/// Read access to the name-to-stream directory of a symbol file.
pub trait StreamDirectory {
    /// Names of all named streams, in directory order.
    fn stream_names(&mut self) -> Result<Vec<String>>;

    /// Full contents of the named stream.
    fn read_stream(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// Extract `(path, checksum)` records from the stream directory.
///
/// Streams whose length is not [`CHECKSUM_STREAM_LEN`] are skipped: older
/// and foreign formats share the marker and are expected to show up.
pub fn extract_checksums<D: StreamDirectory + ?Sized>(dir: &mut D) -> Result<Vec<ChecksumRecord>> {
    let mut records = Vec::new();
    for name in dir.stream_names()? {
        let Some(pos) = name.find(SOURCE_FILE_MARKER) else {
            continue;
        };
        let file_path = &name[pos + SOURCE_FILE_MARKER.len()..];
        let bytes = dir.read_stream(&name)?;
        if bytes.len() != CHECKSUM_STREAM_LEN {
            tracing::debug!(
                "skipping stream '{}' of {} bytes (expected {})",
                name,
                bytes.len(),
                CHECKSUM_STREAM_LEN
            );
            continue;
        }
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&bytes[DIGEST_OFFSET..]);
        records.push(ChecksumRecord {
            file_path: file_path.to_string(),
            checksum: Some(digest),
        });
    }
    Ok(records)
}
