//! Hosting backends: which raw URL template a remote maps to, and how its
//! index entries must be shaped.
//!
//! A provider is picked once from the configured remote and reused for
//! every symbol file in the run.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Result, SrcLinkError};
use crate::srcsrv::{
    IndexDialect, PATH_PLACEHOLDER, REVISION_PLACEHOLDER, TFS_COLLECTION, TFS_REPO,
    TFS_TEAM_PROJECT,
};

/// User-facing placeholders accepted in remote URLs.
const USER_REVISION_PLACEHOLDER: &str = "{revision}";
const USER_FILENAME_PLACEHOLDER: &str = "{filename}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Plain `git://` remote; sources are fetched with `git archive`.
    GitDaemon { raw_url: String },
    /// github.com web remote, served through raw.githubusercontent.com.
    GitHub {
        owner: String,
        repository: String,
        raw_url: String,
    },
    /// Visual Studio Team Services / Azure DevOps collection.
    TeamServices {
        collection_url: String,
        project: String,
        repository: String,
        raw_url: String,
    },
    /// Any other HTTP(S) remote.
    CustomUrl { raw_url: String, backslashes: bool },
}

impl Provider {
    /// Try every backend in turn and return the first that accepts `url`.
    pub fn detect(url: &str) -> Result<Provider> {
        if url.trim().is_empty() {
            return Err(SrcLinkError::Configuration("remote URL is empty".to_string()));
        }
        if url.to_ascii_lowercase().starts_with("git://") {
            return Self::git_daemon(url);
        }
        if let Ok(provider) = Self::github(url) {
            return Ok(provider);
        }
        if let Ok(provider) = Self::team_services(url) {
            return Ok(provider);
        }
        Self::custom_url(url, false)
    }

    /// `git://host/path/{revision}/{filename}`.
    pub fn git_daemon(url: &str) -> Result<Provider> {
        let matches = Regex::new(r"^(?i)git://.+")
            .map(|re| re.is_match(url))
            .unwrap_or(false);
        if !matches {
            return Err(SrcLinkError::Configuration(format!(
                "'{}' is not a git:// remote",
                url
            )));
        }
        let raw_url = rewrite_placeholders(url)?.ok_or_else(|| {
            SrcLinkError::Configuration(format!(
                "git remote '{}' needs both {} and {} placeholders",
                url, USER_REVISION_PLACEHOLDER, USER_FILENAME_PLACEHOLDER
            ))
        })?;
        Ok(Provider::GitDaemon { raw_url })
    }

    /// `https://github.com/<owner>/<repository>[.git]`.
    pub fn github(url: &str) -> Result<Provider> {
        let caps = Regex::new(
            r"^(?i)(?:https?://)?(?:www\.)?github\.com/(?P<owner>[^/]+)/(?P<repo>[^/?#]+?)(?:\.git)?/?$",
        )
        .ok()
        .and_then(|re| re.captures(url))
        .ok_or_else(|| {
            SrcLinkError::Configuration(format!("'{}' is not a GitHub repository URL", url))
        })?;
        let owner = caps["owner"].to_string();
        let repository = caps["repo"].to_string();
        let raw_url = format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            owner, repository, REVISION_PLACEHOLDER, PATH_PLACEHOLDER
        );
        Ok(Provider::GitHub {
            owner,
            repository,
            raw_url,
        })
    }

    /// `https://<account>.visualstudio.com/<project>/_git/<repository>` or
    /// `https://dev.azure.com/<account>/<project>/_git/<repository>`.
    pub fn team_services(url: &str) -> Result<Provider> {
        let patterns = [
            r"^(?i)(?P<collection>https://[a-z0-9\-]+\.visualstudio\.com/)(?P<project>[^/]+)/_git/(?P<repo>[^/?#]+?)/?$",
            r"^(?i)(?P<collection>https://dev\.azure\.com/[a-z0-9\-]+/)(?P<project>[^/]+)/_git/(?P<repo>[^/?#]+?)/?$",
        ];
        let caps = patterns
            .iter()
            .find_map(|p| Regex::new(p).ok().and_then(|re| re.captures(url)))
            .ok_or_else(|| {
                SrcLinkError::Configuration(format!(
                    "'{}' is not a Team Services repository URL",
                    url
                ))
            })?;
        let collection_url = caps["collection"].to_string();
        let project = caps["project"].to_string();
        let repository = caps["repo"].to_string();
        let raw_url = format!(
            "{}{}/_apis/git/repositories/{}/items?api-version=1.0&versionType=commit&version={}&scopePath={}",
            collection_url, project, repository, REVISION_PLACEHOLDER, PATH_PLACEHOLDER
        );
        Ok(Provider::TeamServices {
            collection_url,
            project,
            repository,
            raw_url,
        })
    }

    /// Any `http`/`https` remote. A bare base URL becomes
    /// `<base>/{revision}/{filename}`.
    pub fn custom_url(url: &str, backslashes: bool) -> Result<Provider> {
        let parsed = url::Url::parse(url).map_err(|e| {
            SrcLinkError::Configuration(format!("'{}' is not a valid URL: {}", url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SrcLinkError::Configuration(format!(
                "unsupported scheme '{}' in '{}'",
                parsed.scheme(),
                url
            )));
        }
        let raw_url = match rewrite_placeholders(url)? {
            Some(raw_url) => raw_url,
            None => format!(
                "{}/{}/{}",
                url.trim_end_matches('/'),
                REVISION_PLACEHOLDER,
                PATH_PLACEHOLDER
            ),
        };
        Ok(Provider::CustomUrl {
            raw_url,
            backslashes,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::GitDaemon { .. } => "git daemon",
            Provider::GitHub { .. } => "GitHub",
            Provider::TeamServices { .. } => "Team Services",
            Provider::CustomUrl { .. } => "custom URL",
        }
    }

    /// Template with one `{0}` (revision) and one `%var2%` (file path).
    pub fn raw_url_template(&self) -> &str {
        match self {
            Provider::GitDaemon { raw_url }
            | Provider::GitHub { raw_url, .. }
            | Provider::TeamServices { raw_url, .. }
            | Provider::CustomUrl { raw_url, .. } => raw_url,
        }
    }

    pub fn uses_backslashes(&self) -> bool {
        matches!(
            self,
            Provider::CustomUrl {
                backslashes: true,
                ..
            }
        )
    }

    pub fn dialect(&self) -> IndexDialect {
        match self {
            Provider::TeamServices { .. } => IndexDialect::TeamFoundation,
            _ => IndexDialect::Generic,
        }
    }

    pub fn host_metadata(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        if let Provider::TeamServices {
            collection_url,
            project,
            repository,
            ..
        } = self
        {
            data.insert(TFS_COLLECTION.to_string(), collection_url.clone());
            data.insert(TFS_TEAM_PROJECT.to_string(), project.clone());
            data.insert(TFS_REPO.to_string(), repository.clone());
        }
        data
    }

    /// Shape a repository-relative path for an index entry: every separator
    /// turned into the provider's preferred one, leading separators removed.
    pub fn relative_path_for_url(&self, relative: &str) -> String {
        let normalized = if self.uses_backslashes() {
            relative.replace('/', "\\")
        } else {
            relative.replace('\\', "/")
        };
        normalized
            .trim_start_matches(|c| c == '/' || c == '\\')
            .to_string()
    }
}

/// Rewrite user placeholders into template placeholders.
///
/// Returns `Ok(None)` when the URL carries no placeholder at all, and an
/// error unless each placeholder then appears exactly once.
fn rewrite_placeholders(url: &str) -> Result<Option<String>> {
    let raw_url = url
        .replace(USER_REVISION_PLACEHOLDER, REVISION_PLACEHOLDER)
        .replace(USER_FILENAME_PLACEHOLDER, PATH_PLACEHOLDER);
    let revisions = raw_url.matches(REVISION_PLACEHOLDER).count();
    let paths = raw_url.matches(PATH_PLACEHOLDER).count();
    match (revisions, paths) {
        (0, 0) => Ok(None),
        (1, 1) => Ok(Some(raw_url)),
        _ => Err(SrcLinkError::Configuration(format!(
            "'{}' must contain exactly one {} and one {} placeholder",
            url, USER_REVISION_PLACEHOLDER, USER_FILENAME_PLACEHOLDER
        ))),
    }
}

/// Supplies the revision recorded in every index of the run.
pub trait RevisionSource {
    fn current_revision(&self) -> Result<String>;
}

/// A revision handed in by the caller (e.g. `--commit`).
#[derive(Debug, Clone)]
pub struct FixedRevision(pub String);

impl RevisionSource for FixedRevision {
    fn current_revision(&self) -> Result<String> {
        let revision = self.0.trim();
        if revision.is_empty() {
            return Err(SrcLinkError::Configuration("no revision supplied".to_string()));
        }
        Ok(revision.to_string())
    }
}
