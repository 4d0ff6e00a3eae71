//! `srclink link-pdb` – index one symbol file.

use anyhow::{Context, Result};
use srclink_core::config::SrcLinkConfig;
use srclink_core::linker::{link_symbol_file, SymbolFileJob};
use std::fs;
use std::path::Path;

use super::options::{errors_as_warnings, link_options, read_source_list, revision, select_provider};
use crate::cli::LinkArgs;

pub fn run_link_pdb(
    cfg: &SrcLinkConfig,
    pdb: &Path,
    args: &LinkArgs,
    sources: Option<&Path>,
    srctool_output: Option<&Path>,
) -> Result<()> {
    let provider = select_provider(args)?;
    let revision = revision(args)?;
    let options = link_options(cfg, args)?;

    let mut job = SymbolFileJob::new(pdb);
    if let Some(list) = sources {
        job.compilables = Some(read_source_list(list, &options.repository_root)?);
    }
    if let Some(output) = srctool_output {
        let listing = fs::read_to_string(output)
            .with_context(|| format!("reading listing {}", output.display()))?;
        job.srctool_listing = Some(listing);
    }

    match link_symbol_file(&job, &provider, &revision, &options) {
        Ok(outcome) => {
            println!(
                "Indexed {} file(s) into {}",
                outcome.indexed_files,
                outcome.srcsrv_path.display()
            );
            for (path, checksum) in &outcome.missing {
                println!("  MISSING {}  {}", checksum, path.display());
            }
            Ok(())
        }
        Err(e) if errors_as_warnings(cfg, args) => {
            tracing::warn!("pdb '{}' not indexed: {}", pdb.display(), e);
            println!("WARNING {}: {}", pdb.display(), e);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("indexing {}", pdb.display())),
    }
}
