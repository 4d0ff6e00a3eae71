//! [`StreamDirectory`] over a real PDB file, backed by the `pdb` crate.

use std::fs::File;
use std::path::Path;

use pdb::PDB;

use super::StreamDirectory;
use crate::error::{Result, SrcLinkError};

pub struct PdbStreamDirectory<'s, S> {
    pdb: PDB<'s, S>,
}

impl PdbStreamDirectory<'static, File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| SrcLinkError::io(path, e))?;
        let pdb = PDB::open(file).map_err(|e| SrcLinkError::Pdb("PDB::open", e))?;
        Ok(Self { pdb })
    }
}

impl<'s, S: pdb::Source<'s> + 's> StreamDirectory for PdbStreamDirectory<'s, S> {
    fn stream_names(&mut self) -> Result<Vec<String>> {
        let info = self
            .pdb
            .pdb_information()
            .map_err(|e| SrcLinkError::Pdb("pdb_information", e))?;
        let names = info
            .stream_names()
            .map_err(|e| SrcLinkError::Pdb("stream_names", e))?;
        Ok(names
            .iter()
            .map(|n| String::from_utf8_lossy(n.name.as_bytes()).into_owned())
            .collect())
    }

    fn read_stream(&mut self, name: &str) -> Result<Vec<u8>> {
        let stream = self
            .pdb
            .named_stream(name.as_bytes())
            .map_err(|e| SrcLinkError::Pdb("named_stream", e))?;
        Ok(stream.as_slice().to_vec())
    }
}
