//! Per-file aggregation of extracted checksum records.

use std::collections::BTreeMap;

use crate::checksum::{hex_eq, to_hex};
use crate::error::{Result, SrcLinkError};

/// One source file referenced by a symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRecord {
    pub file_path: String,
    /// MD5 digest recorded at compile time; absent for tool-provided listings.
    pub checksum: Option<[u8; 16]>,
}

impl ChecksumRecord {
    pub fn checksum_hex(&self) -> Option<String> {
        self.checksum.as_ref().map(|c| to_hex(c))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    file_path: String,
    checksum_hex: Option<String>,
}

/// Extracted checksums keyed by file path, compared case-insensitively.
///
/// Iteration is ordered by the lower-cased path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumMap {
    entries: BTreeMap<String, Entry>,
}

impl ChecksumMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `file_path`.
    ///
    /// Repeated occurrences must agree on their checksum. An absent checksum
    /// never conflicts; a later present one fills it in.
    pub fn insert(&mut self, file_path: &str, checksum_hex: Option<String>) -> Result<()> {
        let key = file_path.to_lowercase();
        let Some(existing) = self.entries.get_mut(&key) else {
            self.entries.insert(
                key,
                Entry {
                    file_path: file_path.to_string(),
                    checksum_hex,
                },
            );
            return Ok(());
        };
        let Some(second) = checksum_hex else {
            return Ok(());
        };
        if let Some(first) = &existing.checksum_hex {
            if hex_eq(first, &second) {
                return Ok(());
            }
            return Err(SrcLinkError::ExtractionIntegrity {
                path: existing.file_path.clone(),
                first: first.clone(),
                second,
            });
        }
        existing.checksum_hex = Some(second);
        Ok(())
    }

    /// Checksum recorded for `file_path`; `None` if the file is unknown,
    /// `Some(None)` if it is known without a checksum.
    pub fn get(&self, file_path: &str) -> Option<Option<&str>> {
        self.entries
            .get(&file_path.to_lowercase())
            .map(|e| e.checksum_hex.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .values()
            .map(|e| (e.file_path.as_str(), e.checksum_hex.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fold extracted records into a [`ChecksumMap`], rejecting conflicting checksums.
pub fn aggregate_checksums<I>(records: I) -> Result<ChecksumMap>
where
    I: IntoIterator<Item = ChecksumRecord>,
{
    let mut map = ChecksumMap::new();
    for record in records {
        map.insert(&record.file_path, record.checksum_hex())?;
    }
    Ok(map)
}
