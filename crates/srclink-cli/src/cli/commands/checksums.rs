//! Checksums command: list the source files a PDB records.

use anyhow::{Context, Result};
use srclink_core::linker::{extract_file_checksums, SymbolFileJob};
use std::path::Path;

/// Print `<md5>  <path>` per referenced file; `-` when the PDB carries no digest.
pub fn run_checksums(pdb: &Path) -> Result<()> {
    let checksums = extract_file_checksums(&SymbolFileJob::new(pdb))
        .with_context(|| format!("reading {}", pdb.display()))?;
    if checksums.is_empty() {
        println!("No source checksums in {}.", pdb.display());
        return Ok(());
    }
    for (path, checksum) in checksums.iter() {
        println!("{}  {}", checksum.unwrap_or("-"), path);
    }
    Ok(())
}
