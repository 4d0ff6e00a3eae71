//! `srclink link` – index every symbol file under a directory.

use anyhow::{Context, Result};
use srclink_core::batch::{link_all, BatchSummary};
use srclink_core::config::SrcLinkConfig;
use srclink_core::linker::SymbolFileJob;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::options::{errors_as_warnings, link_options, revision, select_provider};
use crate::cli::LinkArgs;

pub async fn run_link(
    cfg: &SrcLinkConfig,
    pdb_dir: &Path,
    args: &LinkArgs,
    jobs: Option<usize>,
) -> Result<()> {
    let provider = select_provider(args)?;
    let revision = revision(args)?;
    let options = link_options(cfg, args)?;

    let pdbs = find_symbol_files(pdb_dir)?;
    if pdbs.is_empty() {
        println!("No pdb files found under {}.", pdb_dir.display());
        return Ok(());
    }
    tracing::info!(
        "indexing {} pdb(s) with {} remote, revision {}",
        pdbs.len(),
        provider.name(),
        revision
    );

    let jobs_list = pdbs.into_iter().map(SymbolFileJob::new).collect();
    let summary = link_all(
        jobs_list,
        Arc::new(provider),
        Arc::from(revision.as_str()),
        Arc::new(options),
        jobs.unwrap_or(cfg.jobs),
    )
    .await;

    report(&summary, errors_as_warnings(cfg, args))
}

/// Print the batch result; fail unless every pdb succeeded or failures are warnings.
pub(super) fn report(summary: &BatchSummary, errors_as_warnings: bool) -> Result<()> {
    println!(
        "All pdbs are done. {} of {} succeeded",
        summary.succeeded(),
        summary.attempted
    );
    for failed in &summary.failed {
        println!("  FAILED {}: {}", failed.pdb_path.display(), failed.error);
    }
    if !summary.is_success() && !errors_as_warnings {
        anyhow::bail!(
            "{} of {} pdb(s) failed",
            summary.failed.len(),
            summary.attempted
        );
    }
    Ok(())
}

/// Every `*.pdb` below `dir` (any extension case), sorted.
pub(super) fn find_symbol_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries =
            fs::read_dir(&current).with_context(|| format!("listing {}", current.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("listing {}", current.display()))?
                .path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdb"))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}
