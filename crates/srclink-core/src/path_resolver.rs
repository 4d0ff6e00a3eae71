//! Recover the on-disk capitalization of a path.
//!
//! Compilers record source paths with whatever casing the build system
//! passed in. Source server entries are compared against the repository
//! layout, so each segment is replaced by the name the file system actually
//! stores. Every failure (unlistable directory, missing child, malformed
//! input) yields `None`; nothing here touches the file system beyond
//! listing directories.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

/// Resolve `path` (a file) to its canonical on-disk capitalization.
pub fn resolve_file_path(path: &str) -> Option<PathBuf> {
    if path.is_empty() || path.contains('\0') {
        tracing::debug!("cannot resolve malformed path {:?}", path);
        return None;
    }
    let path = Path::new(path);
    let name = path.file_name()?;
    let dir = path.parent()?;
    let resolved_dir = resolve_dir_path(dir)?;
    let child = list_matching_child(&resolved_dir, name, EntryKind::File)?;
    Some(resolved_dir.join(child))
}

/// Resolve a directory to its canonical on-disk capitalization, parent first.
///
/// A drive-style root (`X:`) is lower-cased instead of being queried.
pub fn resolve_dir_path(dir: &Path) -> Option<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Some(PathBuf::new());
    }
    let Some(parent) = dir.parent() else {
        return Some(root_name(dir));
    };
    let name = dir.file_name()?;
    let resolved_parent = resolve_dir_path(parent)?;
    let child = list_matching_child(&resolved_parent, name, EntryKind::Dir)?;
    Some(resolved_parent.join(child))
}

fn root_name(root: &Path) -> PathBuf {
    match root.to_str() {
        Some(s) if is_drive_root(s) => PathBuf::from(s.to_ascii_lowercase()),
        _ => root.to_path_buf(),
    }
}

fn is_drive_root(s: &str) -> bool {
    let b = s.as_bytes();
    match b.len() {
        2 => b[0].is_ascii_alphabetic() && b[1] == b':',
        3 => b[0].is_ascii_alphabetic() && b[1] == b':' && (b[2] == b'\\' || b[2] == b'/'),
        _ => false,
    }
}

fn list_matching_child(dir: &Path, name: &OsStr, kind: EntryKind) -> Option<OsString> {
    let listed = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    match find_child(listed, name, kind) {
        Ok(Some(child)) => Some(child),
        Ok(None) => {
            tracing::debug!(
                "no entry matching {:?} in {}",
                name,
                listed.display()
            );
            None
        }
        Err(err) => {
            tracing::debug!("cannot list {}: {}", listed.display(), err);
            None
        }
    }
}

/// Pick the child of `dir` whose name matches `name` case-insensitively.
/// An exact match wins; otherwise the smallest matching name is returned so
/// the result does not depend on directory iteration order.
fn find_child(dir: &Path, name: &OsStr, kind: EntryKind) -> io::Result<Option<OsString>> {
    let wanted = name.to_string_lossy().to_lowercase();
    let mut best: Option<OsString> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let entry_name = entry.file_name();
        if entry_name.to_string_lossy().to_lowercase() != wanted {
            continue;
        }
        let is_dir = entry.path().is_dir();
        if is_dir != (kind == EntryKind::Dir) {
            continue;
        }
        if entry_name == name {
            return Ok(Some(entry_name));
        }
        best = match best {
            Some(current) if current <= entry_name => Some(current),
            _ => Some(entry_name),
        };
    }
    Ok(best)
}
