use crate::index::Index;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

/// Human-readable sidecar describing the persisted index.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u64,
    pub avg_doc_len: f64,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    pub fn index_file(&self) -> PathBuf {
        self.root.join("index.bin")
    }
    pub fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
    /// Whether a persisted index is present at this root.
    pub fn exists(&self) -> bool {
        self.index_file().is_file()
    }
}

/// Serialize the whole index. bincode round-trips f64 values bit-exactly,
/// so re-scoring a loaded index reproduces in-memory rankings.
pub fn to_bytes(index: &Index) -> Result<Vec<u8>> {
    Ok(bincode::serialize(index)?)
}

pub fn from_bytes(bytes: &[u8]) -> Result<Index> {
    let index: Index = bincode::deserialize(bytes)?;
    index.validate()?;
    Ok(index)
}

pub fn save_index(paths: &IndexPaths, index: &Index) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.index_file())?;
    f.write_all(&to_bytes(index)?)?;
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<Index> {
    tracing::info!(path = %paths.index_file().display(), "loading persisted index");
    let mut f = File::open(paths.index_file())
        .with_context(|| format!("opening index file {}", paths.index_file().display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    from_bytes(&buf)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())
        .with_context(|| format!("opening meta file {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
