use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::srcsrv::LineEnding;

/// Global configuration loaded from `~/.config/srclink/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrcLinkConfig {
    /// Maximum number of symbol files processed concurrently.
    pub jobs: usize,
    /// Emit a PowerShell download command instead of a bare URL for HTTP remotes.
    pub download_with_powershell: bool,
    /// Skip comparing PDB checksums against the source files on disk.
    pub skip_verify: bool,
    /// Report failures but exit successfully.
    pub errors_as_warnings: bool,
    /// Line terminator of generated indexes: "crlf" (default) or "lf".
    #[serde(default)]
    pub line_ending: Option<LineEnding>,
}

impl Default for SrcLinkConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            download_with_powershell: false,
            skip_verify: false,
            errors_as_warnings: false,
            line_ending: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("srclink")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SrcLinkConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<SrcLinkConfig> {
    if !path.exists() {
        let default_cfg = SrcLinkConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: SrcLinkConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = SrcLinkConfig::default();
        assert_eq!(cfg.jobs, 4);
        assert!(!cfg.download_with_powershell);
        assert!(!cfg.skip_verify);
        assert!(!cfg.errors_as_warnings);
        assert!(cfg.line_ending.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = SrcLinkConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SrcLinkConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.jobs, cfg.jobs);
        assert_eq!(parsed.skip_verify, cfg.skip_verify);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            jobs = 8
            download_with_powershell = true
            skip_verify = true
            errors_as_warnings = true
            line_ending = "lf"
        "#;
        let cfg: SrcLinkConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.jobs, 8);
        assert!(cfg.download_with_powershell);
        assert!(cfg.skip_verify);
        assert!(cfg.errors_as_warnings);
        assert_eq!(cfg.line_ending, Some(LineEnding::Lf));
    }

    #[test]
    fn load_or_init_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.jobs, 4);

        fs::write(&path, "jobs = 2\ndownload_with_powershell = false\nskip_verify = false\nerrors_as_warnings = true\n").unwrap();
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg.jobs, 2);
        assert!(cfg.errors_as_warnings);
    }
}
