//! Source listings produced by an external tool (e.g. `srctool -r`).

use super::ChecksumRecord;
use crate::path_resolver::resolve_file_path;

/// Turn tool output (one path per line) into checksum-less records.
///
/// Each line is resolved to its on-disk capitalization; blank lines and
/// lines that do not name an existing file (summaries, stale paths) are
/// dropped.
pub fn parse_srctool_listing(output: &str) -> Vec<ChecksumRecord> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let resolved = resolve_file_path(line)?;
            Some(ChecksumRecord {
                file_path: resolved.to_string_lossy().into_owned(),
                checksum: None,
            })
        })
        .collect()
}
