//! Snapshot writer for symbols.bin (bincode payload behind a fixed header)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::index::SymbolIndex;
use crate::models::{SymbolEntry, SymbolKind};

/// Magic bytes: "DXSI"
pub const MAGIC: &[u8; 4] = b"DXSI";
/// Snapshot format version
pub const VERSION: u32 = 1;
/// magic(4) + version(4) + count(8) + checksum(8) + schema(8)
pub const HEADER_SIZE: usize = 32;

/// Hash of the snapshot-critical sources, computed by build.rs
pub fn schema_hash() -> u64 {
    u64::from_str_radix(env!("SNAPSHOT_SCHEMA_HASH"), 16).unwrap_or(0)
}

/// First 8 bytes of the blake3 hash of the payload
pub fn checksum(payload: &[u8]) -> u64 {
    let hash = blake3::hash(payload);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Serializable symbol record
///
/// bincode is not self-describing, so unlike [`SymbolEntry`] no field here
/// is ever skipped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub name: String,
    pub anchor_id: String,
    pub source_file: String,
    pub kind: String, // SymbolKind as string for simplicity
    pub document: Option<String>,
}

impl From<&SymbolEntry> for SnapshotEntry {
    fn from(entry: &SymbolEntry) -> Self {
        Self {
            name: entry.name.clone(),
            anchor_id: entry.anchor_id.clone(),
            source_file: entry.source_file.clone(),
            kind: entry.kind.to_string(),
            document: entry.document.clone(),
        }
    }
}

impl From<SnapshotEntry> for SymbolEntry {
    fn from(entry: SnapshotEntry) -> Self {
        let kind = entry
            .kind
            .parse()
            .unwrap_or_else(|_| SymbolKind::Unknown(entry.kind.clone()));
        Self {
            name: entry.name,
            anchor_id: entry.anchor_id,
            source_file: entry.source_file,
            kind,
            document: entry.document,
        }
    }
}

/// Writes an index snapshot to symbols.bin
pub struct SymbolWriter {
    entries: Vec<SnapshotEntry>,
}

impl SymbolWriter {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a symbol to the writer
    pub fn add(&mut self, entry: &SymbolEntry) {
        self.entries.push(SnapshotEntry::from(entry));
    }

    /// Add every entry of an index, in index order
    pub fn add_index(&mut self, index: &SymbolIndex) {
        for entry in index.entries() {
            self.add(entry);
        }
    }

    /// Write the snapshot, replacing any existing file atomically
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let payload = bincode::serialize(&self.entries)
            .context("Failed to serialize symbols with bincode")?;

        let tmp_path = path.with_extension("bin.tmp");
        if let Err(e) = self.write_to(&tmp_path, path, &payload) {
            if tmp_path.exists() {
                if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                    log::warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
                }
            }
            return Err(e);
        }

        log::debug!("Wrote {} symbols to {:?}", self.entries.len(), path);

        Ok(())
    }

    /// Write header and payload to `tmp_path`, then move it over `path`
    fn write_to(&self, tmp_path: &Path, path: &Path, payload: &[u8]) -> Result<()> {
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;

            file.write_all(MAGIC)?;
            file.write_all(&VERSION.to_le_bytes())?;
            file.write_all(&(self.entries.len() as u64).to_le_bytes())?;
            file.write_all(&checksum(payload).to_le_bytes())?;
            file.write_all(&schema_hash().to_le_bytes())?;
            file.write_all(payload)
                .context("Failed to write symbol data")?;
            file.sync_all()?;
        }

        std::fs::rename(tmp_path, path)
            .with_context(|| format!("Failed to move snapshot into place at {}", path.display()))
    }

    /// Get number of symbols
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SymbolWriter {
    fn default() -> Self {
        Self::new()
    }
}
