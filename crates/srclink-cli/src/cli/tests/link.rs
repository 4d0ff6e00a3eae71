//! Tests for link and link-pdb subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_link_defaults() {
    match parse(&[
        "srclink",
        "link",
        "out/bin",
        "--url",
        "https://github.com/acme/app",
        "--commit",
        "0123456789abcdef",
    ]) {
        CliCommand::Link {
            pdb_dir,
            link,
            jobs,
        } => {
            assert_eq!(pdb_dir, Path::new("out/bin"));
            assert_eq!(link.url, "https://github.com/acme/app");
            assert_eq!(link.commit, "0123456789abcdef");
            assert!(link.base_dir.is_none());
            assert!(!link.powershell);
            assert!(!link.skip_verify);
            assert!(!link.errors_as_warnings);
            assert!(!link.backslashes);
            assert!(!link.lf);
            assert!(jobs.is_none());
        }
        _ => panic!("expected Link"),
    }
}

#[test]
fn cli_parse_link_all_flags() {
    match parse(&[
        "srclink",
        "link",
        "bin",
        "-u",
        "https://sources.example.com/app",
        "-c",
        "deadbeefcafe",
        "--base-dir",
        "/src/app",
        "--powershell",
        "--skip-verify",
        "--errors-as-warnings",
        "--backslashes",
        "--lf",
        "-j",
        "8",
    ]) {
        CliCommand::Link { link, jobs, .. } => {
            assert_eq!(link.base_dir.as_deref(), Some(Path::new("/src/app")));
            assert!(link.powershell);
            assert!(link.skip_verify);
            assert!(link.errors_as_warnings);
            assert!(link.backslashes);
            assert!(link.lf);
            assert_eq!(jobs, Some(8));
        }
        _ => panic!("expected Link with flags"),
    }
}

#[test]
fn cli_parse_link_requires_url_and_commit() {
    assert!(Cli::try_parse_from(["srclink", "link", "bin", "--commit", "abc"]).is_err());
    assert!(Cli::try_parse_from(["srclink", "link", "bin", "--url", "git://h/r"]).is_err());
}

#[test]
fn cli_parse_link_pdb() {
    match parse(&[
        "srclink",
        "link-pdb",
        "App.pdb",
        "--url",
        "git://git.example.com/app/{revision}/{filename}",
        "--commit",
        "0123456789abcdef",
        "--sources",
        "obj/sources.txt",
        "--srctool-output",
        "obj/srctool.txt",
    ]) {
        CliCommand::LinkPdb {
            pdb,
            link,
            sources,
            srctool_output,
        } => {
            assert_eq!(pdb, Path::new("App.pdb"));
            assert_eq!(link.url, "git://git.example.com/app/{revision}/{filename}");
            assert_eq!(sources.as_deref(), Some(Path::new("obj/sources.txt")));
            assert_eq!(srctool_output.as_deref(), Some(Path::new("obj/srctool.txt")));
        }
        _ => panic!("expected LinkPdb"),
    }
}

#[test]
fn cli_parse_global_log_file() {
    let cli = Cli::try_parse_from([
        "srclink",
        "link",
        "bin",
        "--url",
        "https://github.com/acme/app",
        "--commit",
        "0123456789abcdef",
        "--log-file",
        "/tmp/srclink.log",
    ])
    .unwrap();
    assert_eq!(cli.log_file.as_deref(), Some(Path::new("/tmp/srclink.log")));
}
