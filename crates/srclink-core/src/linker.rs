//! Per-symbol-file pipeline: extract checksums, verify them, render the
//! source index and hand it off as `<pdb>.srcsrv`.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SrcLinkError};
use crate::extract::{
    aggregate_checksums, extract_checksums, parse_srctool_listing, ChecksumMap,
    PdbStreamDirectory,
};
use crate::path_resolver::resolve_file_path;
use crate::provider::Provider;
use crate::srcsrv::{build_source_index, DownloadStrategy, LineEnding, SourceIndexContext};
use crate::verify::{is_ignored, verify_checksums, MissingFiles};

/// Settings shared by every symbol file of a run.
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Local checkout root; index entries are relative to it.
    pub repository_root: PathBuf,
    pub download_with_powershell: bool,
    pub skip_verify: bool,
    pub line_ending: LineEnding,
}

/// One symbol file to index.
#[derive(Debug, Clone, Default)]
pub struct SymbolFileJob {
    pub pdb_path: PathBuf,
    /// Source files the build compiled into this PDB. `None` indexes every
    /// file the PDB itself references.
    pub compilables: Option<Vec<PathBuf>>,
    /// Output of an external source-listing tool. When present it replaces
    /// reading the PDB stream directory.
    pub srctool_listing: Option<String>,
}

impl SymbolFileJob {
    pub fn new(pdb_path: impl Into<PathBuf>) -> Self {
        Self {
            pdb_path: pdb_path.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkOutcome {
    pub srcsrv_path: PathBuf,
    pub indexed_files: usize,
    pub missing: MissingFiles,
}

/// Where the index for `pdb_path` is written: the same path plus `.srcsrv`.
pub fn srcsrv_path_for(pdb_path: &Path) -> PathBuf {
    let mut name = OsString::from(pdb_path.as_os_str());
    name.push(".srcsrv");
    PathBuf::from(name)
}

/// Read the per-file checksums of `job`, from the tool listing if one was
/// supplied and from the PDB stream directory otherwise.
pub fn extract_file_checksums(job: &SymbolFileJob) -> Result<ChecksumMap> {
    match &job.srctool_listing {
        Some(listing) => aggregate_checksums(parse_srctool_listing(listing)),
        None => {
            let mut dir = PdbStreamDirectory::open(&job.pdb_path)?;
            aggregate_checksums(extract_checksums(&mut dir)?)
        }
    }
}

/// Files referenced by the PDB that exist on disk, in on-disk capitalization.
pub fn indexable_files(checksums: &ChecksumMap) -> Vec<PathBuf> {
    let files: BTreeSet<PathBuf> = checksums
        .iter()
        .filter(|(file, _)| !is_ignored(file))
        .filter_map(|(file, _)| resolve_file_path(file))
        .collect();
    files.into_iter().collect()
}

/// Verify the recorded checksums against the recorded files themselves.
pub fn verify_recorded_files(checksums: &ChecksumMap) -> MissingFiles {
    let files = indexable_files(checksums);
    verify_checksums(checksums, Some(&files[..]))
}

/// Strip `root` from the front of `local`, ignoring ASCII case. The root
/// must end on a path segment boundary; paths outside it are returned
/// unchanged.
pub fn relative_to_root(local: &str, root: &Path) -> String {
    let is_separator = |c: char| c == '/' || c == '\\';
    let root = root.to_string_lossy();
    if root.is_empty() {
        return local.to_string();
    }
    let root = root.trim_end_matches(is_separator);
    match local.get(..root.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(root) => {
            let rest = &local[root.len()..];
            if rest.is_empty() || rest.starts_with(is_separator) {
                rest.to_string()
            } else {
                local.to_string()
            }
        }
        _ => local.to_string(),
    }
}

/// Build the index context for `local_paths` under `provider`.
pub fn index_context(
    provider: &Provider,
    revision: &str,
    local_paths: &[PathBuf],
    options: &LinkOptions,
) -> SourceIndexContext {
    let template = provider.raw_url_template();
    let mut ctx = SourceIndexContext::new(revision, template);
    ctx.download_strategy =
        DownloadStrategy::for_template(template, options.download_with_powershell);
    ctx.dialect = provider.dialect();
    ctx.host_metadata = provider.host_metadata();
    ctx.line_ending = options.line_ending;
    ctx.paths = local_paths
        .iter()
        .map(|local| {
            let local = local.to_string_lossy().into_owned();
            let relative = relative_to_root(&local, &options.repository_root);
            let relative = provider.relative_path_for_url(&relative);
            (local, relative)
        })
        .collect();
    ctx
}

/// Read the PDB checksums, pick the files to index and verify them.
fn checked_local_paths(
    job: &SymbolFileJob,
    options: &LinkOptions,
) -> Result<(Vec<PathBuf>, MissingFiles)> {
    let checksums = extract_file_checksums(job)?;
    tracing::debug!(
        "pdb '{}' references {} source file(s)",
        job.pdb_path.display(),
        checksums.len()
    );

    let local_paths = match &job.compilables {
        Some(compilables) => compilables.clone(),
        None => indexable_files(&checksums),
    };

    let missing = if options.skip_verify {
        MissingFiles::new()
    } else {
        tracing::info!("verifying pdb file");
        verify_checksums(&checksums, Some(&local_paths[..]))
    };
    Ok((local_paths, missing))
}

/// Run the whole pipeline for one symbol file.
pub fn link_symbol_file(
    job: &SymbolFileJob,
    provider: &Provider,
    revision: &str,
    options: &LinkOptions,
) -> Result<LinkOutcome> {
    tracing::info!("handling pdb '{}'", job.pdb_path.display());

    fs::metadata(&job.pdb_path).map_err(|e| SrcLinkError::io(&job.pdb_path, e))?;
    let (local_paths, missing) = match &job.compilables {
        Some(compilables) if options.skip_verify => (compilables.clone(), MissingFiles::new()),
        _ => checked_local_paths(job, options)?,
    };
    for (file, checksum) in &missing {
        tracing::warn!(
            "missing file '{}' or checksum '{}' did not match",
            file.display(),
            checksum
        );
    }

    let ctx = index_context(provider, revision, &local_paths, options);
    let bytes = build_source_index(&ctx)?;

    let srcsrv_path = srcsrv_path_for(&job.pdb_path);
    fs::write(&srcsrv_path, &bytes).map_err(|e| SrcLinkError::io(&srcsrv_path, e))?;
    tracing::debug!(
        "created source server link file '{}'",
        srcsrv_path.display()
    );

    Ok(LinkOutcome {
        srcsrv_path,
        indexed_files: ctx.paths.len(),
        missing,
    })
}
