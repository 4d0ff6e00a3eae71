//! Reconcile checksums recorded in a symbol file with the files on disk.
//!
//! Matching is by checksum value: a recorded checksum is satisfied when any
//! candidate file hashes to it, whatever that file is called. A renamed but
//! unmodified file therefore still verifies.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::checksum::md5_path;
use crate::extract::ChecksumMap;
use crate::path_resolver::resolve_file_path;

/// Generated markup files never round-trip by content and are not reported.
const IGNORED_EXTENSION: &str = ".xaml";

/// Unmatched files: canonical on-disk path to the checksum recorded for it.
pub type MissingFiles = BTreeMap<PathBuf, String>;

/// Checksums of a candidate file set: digest to the first file hashing to it.
#[derive(Debug, Default)]
pub struct FileChecksumIndex {
    by_digest: HashMap<String, PathBuf>,
    hashed: usize,
}

impl FileChecksumIndex {
    /// Hash every candidate. Files that cannot be read are logged and left
    /// out, so whatever they would have matched is reported as missing.
    pub fn build<P: AsRef<Path>>(files: &[P]) -> Self {
        let mut index = Self::default();
        for file in files {
            let file = file.as_ref();
            match md5_path(file) {
                Ok(digest) => {
                    index.hashed += 1;
                    index
                        .by_digest
                        .entry(digest)
                        .or_insert_with(|| file.to_path_buf());
                }
                Err(err) => tracing::warn!("cannot hash candidate file: {}", err),
            }
        }
        index
    }

    /// The candidate whose content hashes to `checksum_hex`, if any.
    pub fn file_with_checksum(&self, checksum_hex: &str) -> Option<&Path> {
        self.by_digest
            .get(&checksum_hex.to_ascii_lowercase())
            .map(PathBuf::as_path)
    }

    /// Number of candidates that could be hashed.
    pub fn len(&self) -> usize {
        self.hashed
    }

    pub fn is_empty(&self) -> bool {
        self.hashed == 0
    }
}

/// Report every recorded checksum that no candidate file reproduces.
///
/// With no candidate set, every record carrying a checksum is reported.
/// Records without a checksum have nothing to verify and are skipped.
/// Reported paths are resolved to their on-disk capitalization; records
/// whose path cannot be resolved are dropped.
pub fn verify_checksums<P: AsRef<Path>>(
    extracted: &ChecksumMap,
    candidates: Option<&[P]>,
) -> MissingFiles {
    let actual = candidates.map(FileChecksumIndex::build);
    let mut missing = MissingFiles::new();

    for (file, checksum) in extracted.iter() {
        let Some(checksum) = checksum else {
            continue;
        };
        if let Some(matched) = actual
            .as_ref()
            .and_then(|index| index.file_with_checksum(checksum))
        {
            tracing::debug!("'{}' verified by '{}'", file, matched.display());
            continue;
        }
        if is_ignored(file) {
            continue;
        }
        let Some(path) = resolve_file_path(file) else {
            tracing::debug!("dropping unresolvable file '{}' from report", file);
            continue;
        };
        missing.insert(path, checksum.to_ascii_lowercase());
    }

    missing
}

pub(crate) fn is_ignored(file: &str) -> bool {
    file.to_ascii_lowercase().ends_with(IGNORED_EXTENSION)
}
