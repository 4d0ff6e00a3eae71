//! On-disk checkout with a few source files and placeholder symbol files.

use std::fs;
use std::path::PathBuf;

use srclink_core::path_resolver::resolve_dir_path;
use tempfile::TempDir;

pub struct SourceTree {
    _dir: TempDir,
    pub root: PathBuf,
}

impl SourceTree {
    /// `App/Program.cs`, `App/Views/Main.xaml`, `Lib/Math.cs`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = resolve_dir_path(dir.path()).unwrap();
        for (rel, body) in [
            ("App/Program.cs", "class Program {}"),
            ("App/Views/Main.xaml", "<Window/>"),
            ("Lib/Math.cs", "static class Math {}"),
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, body).unwrap();
        }
        fs::create_dir_all(root.join("bin")).unwrap();
        Self { _dir: dir, root }
    }

    pub fn file(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write a symbol file placeholder under `bin/`.
    pub fn symbol_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.join("bin").join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Tool listing naming `rels`, one absolute path per line.
    pub fn listing(&self, rels: &[&str]) -> String {
        rels.iter()
            .map(|rel| format!("{}\r\n", self.root.join(rel).display()))
            .collect()
    }
}
