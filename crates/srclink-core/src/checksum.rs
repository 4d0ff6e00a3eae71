//! Content checksums of candidate source files.
//!
//! Compilers record an MD5 digest of every source file in the PDB; the same
//! digest is computed here so the two can be compared as lowercase hex.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, SrcLinkError};

const BUF_SIZE: usize = 64 * 1024;

/// Compute the MD5 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded.
pub fn md5_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).map_err(|e| SrcLinkError::io(path, e))?;
    let mut ctx = md5::Context::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf).map_err(|e| SrcLinkError::io(path, e))?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
    }
    Ok(format!("{:x}", ctx.compute()))
}

/// Render raw digest bytes the way every comparison in this crate expects.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Hex digests compare case-insensitively.
pub fn hex_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
