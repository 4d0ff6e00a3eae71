//! CLI for srclink.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use srclink_core::{config, logging};
use std::path::PathBuf;

use commands::{run_checksums, run_link, run_link_pdb, run_verify};

/// Top-level CLI for srclink.
#[derive(Debug, Parser)]
#[command(name = "srclink")]
#[command(
    about = "srclink: embed source-server indexes that point PDB sources at a remote repository",
    long_about = None
)]
pub struct Cli {
    /// Write the log to this file instead of the XDG state directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by the indexing commands.
#[derive(Debug, Clone, Args)]
pub struct LinkArgs {
    /// Remote repository URL: git://, GitHub, Team Services or any HTTP(S) base URL.
    #[arg(long, short = 'u')]
    pub url: String,

    /// Commit recorded in every index.
    #[arg(long, short = 'c')]
    pub commit: String,

    /// Local checkout root that index entries are relative to (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Download sources with a PowerShell command instead of a bare URL.
    #[arg(long)]
    pub powershell: bool,

    /// Do not compare PDB checksums against the source files on disk.
    #[arg(long)]
    pub skip_verify: bool,

    /// Report failures but exit successfully.
    #[arg(long)]
    pub errors_as_warnings: bool,

    /// Use backslashes in index paths (plain HTTP remotes only).
    #[arg(long)]
    pub backslashes: bool,

    /// Terminate index lines with LF instead of CRLF.
    #[arg(long)]
    pub lf: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Index every *.pdb under a directory.
    Link {
        /// Directory searched recursively for symbol files.
        pdb_dir: PathBuf,

        #[command(flatten)]
        link: LinkArgs,

        /// Index up to N symbol files concurrently (default from config).
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,
    },

    /// Index a single symbol file, optionally against its compiled source list.
    LinkPdb {
        /// Symbol file to index.
        pdb: PathBuf,

        #[command(flatten)]
        link: LinkArgs,

        /// File listing the compiled sources, one path per line.
        #[arg(long, value_name = "FILE")]
        sources: Option<PathBuf>,

        /// Saved output of a source-listing tool, used instead of reading the PDB streams.
        #[arg(long, value_name = "FILE")]
        srctool_output: Option<PathBuf>,
    },

    /// Print the source files and checksums recorded in a symbol file.
    Checksums {
        /// Symbol file to read.
        pdb: PathBuf,
    },

    /// Compare a symbol file's checksums with source files on disk.
    Verify {
        /// Symbol file to read.
        pdb: PathBuf,

        /// Candidate source files (default: the files the PDB records, as found on disk).
        sources: Vec<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let logged = match &cli.log_file {
            Some(path) => logging::init_logging_to_file(path),
            None => logging::init_logging(),
        };
        if let Err(e) = logged {
            logging::init_logging_stderr();
            tracing::warn!("log file unavailable, logging to stderr: {:#}", e);
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Link {
                pdb_dir,
                link,
                jobs,
            } => run_link(&cfg, &pdb_dir, &link, jobs).await?,
            CliCommand::LinkPdb {
                pdb,
                link,
                sources,
                srctool_output,
            } => run_link_pdb(&cfg, &pdb, &link, sources.as_deref(), srctool_output.as_deref())?,
            CliCommand::Checksums { pdb } => run_checksums(&pdb)?,
            CliCommand::Verify { pdb, sources } => run_verify(&pdb, &sources)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
