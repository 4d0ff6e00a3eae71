//! Turn command-line flags plus config into core link settings.

use anyhow::{Context, Result};
use srclink_core::config::SrcLinkConfig;
use srclink_core::linker::LinkOptions;
use srclink_core::provider::{FixedRevision, Provider, RevisionSource};
use srclink_core::srcsrv::LineEnding;
use std::path::{Path, PathBuf};

use crate::cli::LinkArgs;

/// Flags win over config; a flag can only switch a setting on.
pub fn link_options(cfg: &SrcLinkConfig, args: &LinkArgs) -> Result<LinkOptions> {
    let repository_root = match &args.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("current directory")?,
    };
    let line_ending = if args.lf {
        LineEnding::Lf
    } else {
        cfg.line_ending.unwrap_or_default()
    };
    Ok(LinkOptions {
        repository_root,
        download_with_powershell: args.powershell || cfg.download_with_powershell,
        skip_verify: args.skip_verify || cfg.skip_verify,
        line_ending,
    })
}

pub fn errors_as_warnings(cfg: &SrcLinkConfig, args: &LinkArgs) -> bool {
    args.errors_as_warnings || cfg.errors_as_warnings
}

/// Detect the provider for `--url`, honoring `--backslashes` for plain HTTP remotes.
pub fn select_provider(args: &LinkArgs) -> Result<Provider> {
    let provider = Provider::detect(&args.url)
        .with_context(|| format!("no provider accepts '{}'", args.url))?;
    if !args.backslashes {
        return Ok(provider);
    }
    match provider {
        Provider::CustomUrl { .. } => Ok(Provider::custom_url(&args.url, true)?),
        other => {
            tracing::warn!(
                "--backslashes ignored for {} remote '{}'",
                other.name(),
                args.url
            );
            Ok(other)
        }
    }
}

pub fn revision(args: &LinkArgs) -> Result<String> {
    Ok(FixedRevision(args.commit.clone()).current_revision()?)
}

/// Read a compiled-source list: one path per line, blank lines skipped,
/// relative entries taken against `base`.
pub fn read_source_list(list: &Path, base: &Path) -> Result<Vec<PathBuf>> {
    let data = std::fs::read_to_string(list)
        .with_context(|| format!("reading source list {}", list.display()))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| base.join(line))
        .collect())
}
