//! Verify command: report PDB checksums that no source file on disk matches.

use anyhow::{Context, Result};
use srclink_core::extract::ChecksumMap;
use srclink_core::linker::{extract_file_checksums, verify_recorded_files, SymbolFileJob};
use srclink_core::verify::{verify_checksums, MissingFiles};
use std::path::{Path, PathBuf};

pub fn run_verify(pdb: &Path, sources: &[PathBuf]) -> Result<()> {
    let checksums = extract_file_checksums(&SymbolFileJob::new(pdb))
        .with_context(|| format!("reading {}", pdb.display()))?;
    let missing = missing_files(&checksums, sources);

    if missing.is_empty() {
        println!("All {} source file(s) match.", checksums.len());
        return Ok(());
    }
    println!("{:<34} {}", "EXPECTED MD5", "FILE");
    for (path, checksum) in &missing {
        println!("{:<34} {}", checksum, path.display());
    }
    anyhow::bail!("{} source file(s) do not match {}", missing.len(), pdb.display())
}

/// Without explicit sources, the files the PDB records are the candidates.
fn missing_files(checksums: &ChecksumMap, sources: &[PathBuf]) -> MissingFiles {
    if sources.is_empty() {
        verify_recorded_files(checksums)
    } else {
        verify_checksums(checksums, Some(sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srclink_core::checksum::md5_path;
    use srclink_core::path_resolver::resolve_file_path;
    use std::fs;

    #[test]
    fn recorded_paths_are_the_default_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("Good.cs");
        let stale = dir.path().join("Stale.cs");
        fs::write(&good, b"class Good {}").unwrap();
        fs::write(&stale, b"class Stale {}").unwrap();
        let good = resolve_file_path(good.to_str().unwrap()).unwrap();
        let stale = resolve_file_path(stale.to_str().unwrap()).unwrap();

        let mut checksums = ChecksumMap::new();
        checksums
            .insert(good.to_str().unwrap(), Some(md5_path(&good).unwrap()))
            .unwrap();
        checksums
            .insert(stale.to_str().unwrap(), Some("2".repeat(32)))
            .unwrap();

        let missing = missing_files(&checksums, &[]);
        assert_eq!(missing.keys().collect::<Vec<_>>(), vec![&stale]);

        let missing = missing_files(&checksums, &[stale.clone()]);
        assert_eq!(missing.len(), 2);
    }
}
