//! Source server index generation.
//!
//! The generated block is embedded into the PDB by an external tool and read
//! back by debuggers, both of which parse these exact tokens. Layout, `*`
//! delimiters and trailing tokens must not drift.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SrcLinkError};

/// Host metadata keys understood by the Team Foundation dialect.
pub const TFS_COLLECTION: &str = "TFS_COLLECTION";
pub const TFS_TEAM_PROJECT: &str = "TFS_TEAM_PROJECT";
pub const TFS_REPO: &str = "TFS_REPO";

/// Placeholder replaced by the revision in a raw URL template.
pub const REVISION_PLACEHOLDER: &str = "{0}";
/// Placeholder the debugger replaces by the entry's relative path.
pub const PATH_PLACEHOLDER: &str = "%var2%";

const SHORT_REVISION_LEN: usize = 8;

/// How the debugger obtains a file in the generic dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadStrategy {
    /// No command; the debugger fetches `%RAWURL%` itself.
    #[default]
    DirectHttp,
    /// `git archive` the whole revision, unzip it, delete the archive.
    GitArchive,
    /// Download the single file with a PowerShell one-liner.
    PowershellDownload,
}

impl DownloadStrategy {
    /// `git://` remotes can only be archived; everything else is HTTP.
    pub fn for_template(raw_url_template: &str, download_with_powershell: bool) -> Self {
        if raw_url_template.to_ascii_lowercase().starts_with("git://") {
            DownloadStrategy::GitArchive
        } else if download_with_powershell {
            DownloadStrategy::PowershellDownload
        } else {
            DownloadStrategy::DirectHttp
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexDialect {
    #[default]
    Generic,
    /// `tf.exe git view` extraction against a Team Foundation collection.
    TeamFoundation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Crlf,
    Lf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Everything needed to render the index of one symbol file.
#[derive(Debug, Clone)]
pub struct SourceIndexContext {
    pub revision: String,
    pub raw_url_template: String,
    /// `(local path, relative path)` pairs, emitted in order.
    pub paths: Vec<(String, String)>,
    pub download_strategy: DownloadStrategy,
    pub dialect: IndexDialect,
    pub host_metadata: BTreeMap<String, String>,
    /// Written to the `DATETIME=` line of the Team Foundation dialect.
    pub timestamp: NaiveDateTime,
    pub line_ending: LineEnding,
}

impl SourceIndexContext {
    pub fn new(revision: impl Into<String>, raw_url_template: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            raw_url_template: raw_url_template.into(),
            paths: Vec::new(),
            download_strategy: DownloadStrategy::default(),
            dialect: IndexDialect::default(),
            host_metadata: BTreeMap::new(),
            timestamp: chrono::Local::now().naive_local(),
            line_ending: LineEnding::default(),
        }
    }
}

/// First eight characters of the revision; shorter or non-hex input is an error.
pub fn short_revision(revision: &str) -> Result<&str> {
    match revision.get(..SHORT_REVISION_LEN) {
        Some(short) if short.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(short),
        _ => Err(SrcLinkError::IndexGeneration(format!(
            "revision '{}' must start with {} hex characters",
            revision, SHORT_REVISION_LEN
        ))),
    }
}

/// Render the index block for `ctx` in its dialect.
pub fn build_source_index(ctx: &SourceIndexContext) -> Result<Vec<u8>> {
    if ctx.revision.trim().is_empty() {
        return Err(SrcLinkError::IndexGeneration("revision is empty".to_string()));
    }
    let text = match ctx.dialect {
        IndexDialect::Generic => render_generic(ctx)?,
        IndexDialect::TeamFoundation => render_team_foundation(ctx)?,
    };
    Ok(text.into_bytes())
}

struct Lines {
    out: String,
    eol: &'static str,
}

impl Lines {
    fn new(line_ending: LineEnding) -> Self {
        Self {
            out: String::new(),
            eol: line_ending.as_str(),
        }
    }

    fn push(&mut self, line: impl AsRef<str>) {
        self.out.push_str(line.as_ref());
        self.out.push_str(self.eol);
    }
}

fn render_generic(ctx: &SourceIndexContext) -> Result<String> {
    if ctx.raw_url_template.trim().is_empty() {
        return Err(SrcLinkError::IndexGeneration(
            "raw URL template is empty".to_string(),
        ));
    }
    let raw_url = ctx
        .raw_url_template
        .replace(REVISION_PLACEHOLDER, &ctx.revision);

    let mut w = Lines::new(ctx.line_ending);
    w.push("SRCSRV: ini ------------------------------------------------");
    w.push("VERSION=2");
    w.push("SRCSRV: variables ------------------------------------------");
    w.push(format!("RAWURL={}", raw_url));
    w.push(format!("GITREVISION={}", ctx.revision));

    match ctx.download_strategy {
        DownloadStrategy::GitArchive => {
            w.push("TRGFILE=%fnbksl%(%targ%\\%GITREVISION%\\%var2%)");
            w.push("TMPZIP=%fnbksl%(%targ%\\%fnfile%(%var2%)).zip");
            w.push("SRCSRVTRG=%TRGFILE%");
            w.push("CMDGITARCHIVE=git.exe archive --format zip --remote %RAWURL% -o \"%TMPZIP%\"");
            w.push(
                "CMDUNZIP=powershell invoke-command -scriptblock {}; \
                 Add-Type -AssemblyName System.IO.Compression.FileSystem; \
                 [System.IO.Compression.ZipFile]::ExtractToDirectory('%TMPZIP%', '%targ%\\%GITREVISION%');",
            );
            // The trailing quote closes the `cmd /c "` below.
            w.push("CMDDELZIP=del \"%TMPZIP%\"\"");
            w.push("SRCSRVCMD=cmd /c \"%CMDGITARCHIVE% && %CMDUNZIP% && %CMDDELZIP%");
        }
        DownloadStrategy::PowershellDownload => {
            w.push("TRGFILE=%fnbksl%(%targ%%var2%)");
            w.push("SRCSRVTRG=%TRGFILE%");
            w.push(
                "SRCSRVCMD=powershell invoke-command -scriptblock \
                 {param($url='%RAWURL%', $output='%TRGFILE%'); \
                 (New-Object System.Net.WebClient).DownloadFile($url, $output)}",
            );
        }
        DownloadStrategy::DirectHttp => {
            let parsed = url::Url::parse(&ctx.raw_url_template).map_err(|e| {
                SrcLinkError::IndexGeneration(format!(
                    "raw URL template '{}' is not a URL: {}",
                    ctx.raw_url_template, e
                ))
            })?;
            w.push(format!("SRCSRVVERCTRL={}", parsed.scheme()));
            w.push("SRCSRVTRG=%RAWURL%");
        }
    }

    w.push("SRCSRV: source files ---------------------------------------");
    for (local, relative) in &ctx.paths {
        w.push(format!("{}*{}", local, relative));
    }
    w.push("SRCSRV: end ------------------------------------------------");
    Ok(w.out)
}

fn render_team_foundation(ctx: &SourceIndexContext) -> Result<String> {
    let short = short_revision(&ctx.revision)?;

    let mut w = Lines::new(ctx.line_ending);
    w.push("SRCSRV: ini ------------------------------------------------");
    w.push("VERSION=3");
    w.push("INDEXVERSION=2");
    w.push("VERCTRL=Team Foundation Server");
    w.push(format!(
        "DATETIME={}",
        ctx.timestamp.format("%a %b %I:%M:%S %Y")
    ));
    w.push("INDEXER=TFSTB");
    w.push("SRCSRV: variables ------------------------------------------");
    w.push("TFS_EXTRACT_TARGET=%targ%\\%var5%\\%fnvar%(%var6%)\\%fnbksl%(%var7%)");
    w.push(
        "TFS_EXTRACT_CMD=tf.exe git view /collection:%fnvar%(%var2%) \
         /teamproject:\"%fnvar%(%var3%)\" /repository:\"%fnvar%(%var4%)\" \
         /commitId:%fnvar%(%var5%) /path:\"%var7%\" /output:%SRCSRVTRG% %fnvar%(%var8%)",
    );
    for key in [TFS_COLLECTION, TFS_TEAM_PROJECT, TFS_REPO] {
        if let Some(value) = ctx.host_metadata.get(key) {
            w.push(format!("{}={}", key, value));
        }
    }
    w.push(format!("TFS_COMMIT={}", ctx.revision));
    w.push(format!("TFS_SHORT_COMMIT={}", short));
    w.push("TFS_APPLY_FILTERS=/applyfilters");
    w.push("SRCSRVVERCTRL=git");
    w.push("SRCSRVERRDESC=access");
    w.push("SRCSRVERRVAR=var2");
    w.push("SRCSRVTRG=%TFS_EXTRACT_TARGET%");
    w.push("SRCSRVCMD=%TFS_EXTRACT_CMD%");
    w.push("SRCSRV: source files ---------------------------------------");
    for (local, relative) in &ctx.paths {
        w.push(format!(
            "{}*TFS_COLLECTION*TFS_TEAM_PROJECT*TFS_REPO*TFS_COMMIT*TFS_SHORT_COMMIT*{}*TFS_APPLY_FILTERS",
            local, relative
        ));
    }
    w.push("SRCSRV: end ------------------------------------------------");
    Ok(w.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn two_files(mut ctx: SourceIndexContext) -> SourceIndexContext {
        ctx.paths = vec![
            ("C:/src/a.cs".to_string(), "a.cs".to_string()),
            ("C:/src/b.cs".to_string(), "sub/b.cs".to_string()),
        ];
        ctx
    }

    fn render(ctx: &SourceIndexContext) -> String {
        String::from_utf8(build_source_index(ctx).unwrap()).unwrap()
    }

    #[test]
    fn generic_direct_http_layout() {
        let ctx = two_files(SourceIndexContext::new("deadbeef", "https://host/{0}/%var2%"));
        let expected = "SRCSRV: ini ------------------------------------------------\r\n\
                        VERSION=2\r\n\
                        SRCSRV: variables ------------------------------------------\r\n\
                        RAWURL=https://host/deadbeef/%var2%\r\n\
                        GITREVISION=deadbeef\r\n\
                        SRCSRVVERCTRL=https\r\n\
                        SRCSRVTRG=%RAWURL%\r\n\
                        SRCSRV: source files ---------------------------------------\r\n\
                        C:/src/a.cs*a.cs\r\n\
                        C:/src/b.cs*sub/b.cs\r\n\
                        SRCSRV: end ------------------------------------------------\r\n";
        assert_eq!(render(&ctx), expected);
    }

    #[test]
    fn generic_entries_sit_between_header_and_terminator() {
        let ctx = two_files(SourceIndexContext::new("deadbeef", "https://host/{0}/%var2%"));
        let text = render(&ctx);
        let lines: Vec<&str> = text.split("\r\n").collect();
        let start = lines
            .iter()
            .position(|l| l.starts_with("SRCSRV: source files"))
            .unwrap();
        let end = lines.iter().position(|l| l.starts_with("SRCSRV: end")).unwrap();
        let entries = &lines[start + 1..end];
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("*a.cs"));
        assert!(entries[1].ends_with("*sub/b.cs"));
        assert_eq!(end, lines.len() - 2);
    }

    #[test]
    fn git_archive_layout() {
        let mut ctx = SourceIndexContext::new("0123456789abcdef", "git://example.org/repo.git");
        ctx.download_strategy = DownloadStrategy::GitArchive;
        ctx.paths = vec![("/src/a.c".to_string(), "a.c".to_string())];
        let text = render(&ctx);
        assert!(text.contains("RAWURL=git://example.org/repo.git\r\n"));
        assert!(text.contains("TRGFILE=%fnbksl%(%targ%\\%GITREVISION%\\%var2%)\r\n"));
        assert!(text.contains("TMPZIP=%fnbksl%(%targ%\\%fnfile%(%var2%)).zip\r\n"));
        assert!(text.contains(
            "CMDGITARCHIVE=git.exe archive --format zip --remote %RAWURL% -o \"%TMPZIP%\"\r\n"
        ));
        assert!(text.contains(
            "CMDUNZIP=powershell invoke-command -scriptblock {}; Add-Type -AssemblyName \
             System.IO.Compression.FileSystem; [System.IO.Compression.ZipFile]::\
             ExtractToDirectory('%TMPZIP%', '%targ%\\%GITREVISION%');\r\n"
        ));
        assert!(text.contains("CMDDELZIP=del \"%TMPZIP%\"\"\r\n"));
        assert!(text.contains("SRCSRVCMD=cmd /c \"%CMDGITARCHIVE% && %CMDUNZIP% && %CMDDELZIP%\r\n"));
        assert!(!text.contains("SRCSRVVERCTRL"));
    }

    #[test]
    fn powershell_layout() {
        let mut ctx = SourceIndexContext::new("deadbeef", "https://host/{0}/%var2%");
        ctx.download_strategy = DownloadStrategy::PowershellDownload;
        let text = render(&ctx);
        assert!(text.contains("TRGFILE=%fnbksl%(%targ%%var2%)\r\nSRCSRVTRG=%TRGFILE%\r\n"));
        assert!(text.contains(
            "SRCSRVCMD=powershell invoke-command -scriptblock {param($url='%RAWURL%', \
             $output='%TRGFILE%'); (New-Object System.Net.WebClient).DownloadFile($url, $output)}\r\n"
        ));
    }

    #[test]
    fn strategy_follows_template_scheme() {
        assert_eq!(
            DownloadStrategy::for_template("git://host/r.git", true),
            DownloadStrategy::GitArchive
        );
        assert_eq!(
            DownloadStrategy::for_template("https://host/{0}/%var2%", true),
            DownloadStrategy::PowershellDownload
        );
        assert_eq!(
            DownloadStrategy::for_template("https://host/{0}/%var2%", false),
            DownloadStrategy::DirectHttp
        );
    }

    #[test]
    fn team_foundation_layout() {
        let mut ctx = two_files(SourceIndexContext::new("abcdef1234567890", ""));
        ctx.dialect = IndexDialect::TeamFoundation;
        ctx.timestamp = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap();
        ctx.host_metadata
            .insert(TFS_COLLECTION.to_string(), "https://acme.visualstudio.com/".to_string());
        ctx.host_metadata
            .insert(TFS_TEAM_PROJECT.to_string(), "Tools".to_string());
        ctx.host_metadata.insert(TFS_REPO.to_string(), "linker".to_string());
        let text = render(&ctx);
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[1], "VERSION=3");
        assert_eq!(lines[2], "INDEXVERSION=2");
        assert_eq!(lines[3], "VERCTRL=Team Foundation Server");
        assert_eq!(lines[4], "DATETIME=Tue Mar 02:07:09 2024");
        assert_eq!(lines[5], "INDEXER=TFSTB");
        assert!(lines.contains(&"TFS_COLLECTION=https://acme.visualstudio.com/"));
        assert!(lines.contains(&"TFS_TEAM_PROJECT=Tools"));
        assert!(lines.contains(&"TFS_REPO=linker"));
        assert!(lines.contains(&"TFS_COMMIT=abcdef1234567890"));
        assert!(lines.contains(&"TFS_SHORT_COMMIT=abcdef12"));
        assert!(lines.contains(
            &"C:/src/b.cs*TFS_COLLECTION*TFS_TEAM_PROJECT*TFS_REPO*TFS_COMMIT*TFS_SHORT_COMMIT*sub/b.cs*TFS_APPLY_FILTERS"
        ));
        assert_eq!(lines[lines.len() - 2], "SRCSRV: end ------------------------------------------------");
    }

    #[test]
    fn team_foundation_omits_absent_metadata() {
        let mut ctx = SourceIndexContext::new("abcdef1234567890", "");
        ctx.dialect = IndexDialect::TeamFoundation;
        ctx.host_metadata.insert(TFS_REPO.to_string(), "linker".to_string());
        let text = render(&ctx);
        assert!(!text.contains("TFS_COLLECTION="));
        assert!(!text.contains("TFS_TEAM_PROJECT="));
        assert!(text.contains("\r\nTFS_REPO=linker\r\nTFS_COMMIT=abcdef1234567890\r\n"));
    }

    #[test]
    fn short_revision_rejects_short_input() {
        for rev in ["", "a", "abcdef1"] {
            assert!(matches!(
                short_revision(rev),
                Err(SrcLinkError::IndexGeneration(_))
            ));
        }
        assert_eq!(short_revision("abcdef12").unwrap(), "abcdef12");
        assert!(short_revision("zzzzzzzzzz").is_err());
    }

    #[test]
    fn team_foundation_fails_on_short_revision() {
        let mut ctx = two_files(SourceIndexContext::new("abc1234", ""));
        ctx.dialect = IndexDialect::TeamFoundation;
        assert!(matches!(
            build_source_index(&ctx),
            Err(SrcLinkError::IndexGeneration(_))
        ));
    }

    #[test]
    fn empty_revision_is_rejected_in_every_dialect() {
        let ctx = SourceIndexContext::new("", "https://host/{0}/%var2%");
        assert!(build_source_index(&ctx).is_err());
        let mut tfs = ctx.clone();
        tfs.dialect = IndexDialect::TeamFoundation;
        assert!(build_source_index(&tfs).is_err());
    }

    #[test]
    fn lf_output_has_no_carriage_returns() {
        let mut ctx = two_files(SourceIndexContext::new("deadbeef", "https://host/{0}/%var2%"));
        ctx.line_ending = LineEnding::Lf;
        let text = render(&ctx);
        assert!(!text.contains('\r'));
        assert_eq!(text.lines().count(), 11);
    }

    #[test]
    fn crlf_output_is_consistent() {
        let mut ctx = two_files(SourceIndexContext::new("abcdef1234567890", ""));
        ctx.dialect = IndexDialect::TeamFoundation;
        let text = render(&ctx);
        assert_eq!(text.matches('\n').count(), text.matches("\r\n").count());
    }

    #[test]
    fn output_is_deterministic() {
        let ctx = two_files(SourceIndexContext::new("deadbeef", "https://host/{0}/%var2%"));
        assert_eq!(
            build_source_index(&ctx).unwrap(),
            build_source_index(&ctx).unwrap()
        );
    }
}
