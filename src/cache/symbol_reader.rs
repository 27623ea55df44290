//! Snapshot reader for symbols.bin

use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use crate::cache::symbol_writer::{checksum, schema_hash, SnapshotEntry, HEADER_SIZE, MAGIC, VERSION};
use crate::index::{IndexedSymbol, SymbolIndex};
use crate::models::SymbolEntry;

/// Reads an index snapshot using memory-mapped I/O
pub struct SymbolReader {
    _file: File,
    mmap: Mmap,
    symbol_count: u64,
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

impl SymbolReader {
    /// Open and memory-map symbols.bin, validating its header and checksum
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .with_context(|| format!("Failed to open symbols file: {}", path.display()))?;

        // Memory-map the file
        let mmap = unsafe {
            Mmap::map(&file)
                .context("Failed to memory-map symbols file")?
        };

        if mmap.len() < HEADER_SIZE {
            anyhow::bail!(
                "symbols.bin is too small (expected at least {} bytes for header)",
                HEADER_SIZE
            );
        }

        if &mmap[0..4] != MAGIC {
            anyhow::bail!("Invalid symbols.bin file (wrong magic bytes)");
        }

        let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);
        if version != VERSION {
            anyhow::bail!("Unsupported symbols.bin version: {}", version);
        }

        let symbol_count = read_u64(&mmap, 8);
        let stored_checksum = read_u64(&mmap, 16);
        let stored_schema = read_u64(&mmap, 24);

        if stored_schema != schema_hash() {
            anyhow::bail!(
                "symbols.bin was written by an incompatible build (schema {:016x}, expected {:016x}). \
                 Run 'dxs index' to rebuild it.",
                stored_schema,
                schema_hash()
            );
        }

        if checksum(&mmap[HEADER_SIZE..]) != stored_checksum {
            anyhow::bail!("symbols.bin is corrupted (checksum mismatch). Run 'dxs index' to rebuild it.");
        }

        log::debug!(
            "Opened symbols.bin: version={}, symbols={}",
            version,
            symbol_count
        );

        Ok(Self {
            _file: file,
            mmap,
            symbol_count,
        })
    }

    /// Number of symbols recorded in the header
    pub fn len(&self) -> usize {
        self.symbol_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_count == 0
    }

    /// Read all entries from the snapshot, in stored order
    pub fn read_all(&self) -> Result<Vec<SymbolEntry>> {
        let stored: Vec<SnapshotEntry> = bincode::deserialize(&self.mmap[HEADER_SIZE..])
            .context("Failed to deserialize symbols from bincode")?;

        if stored.len() as u64 != self.symbol_count {
            anyhow::bail!(
                "symbols.bin header promises {} symbols but payload holds {}",
                self.symbol_count,
                stored.len()
            );
        }

        Ok(stored.into_iter().map(SymbolEntry::from).collect())
    }

    /// Rebuild the in-memory index from the snapshot
    pub fn read_index(&self) -> Result<SymbolIndex> {
        let mut symbols: Vec<IndexedSymbol> =
            self.read_all()?.into_iter().map(IndexedSymbol::new).collect();
        // from_sorted requires sort_cmp order
        symbols.sort_by(|a, b| a.sort_cmp(b));
        Ok(SymbolIndex::from_sorted(symbols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::symbol_writer::SymbolWriter;
    use crate::indexer::IndexBuilder;
    use crate::models::SymbolKind;
    use tempfile::TempDir;

    fn sample_index() -> SymbolIndex {
        IndexBuilder::default()
            .build(vec![
                SymbolEntry::new("c128lib_Asl16", "math-global.asm", "a9e42e35", SymbolKind::Function)
                    .with_document("../math-global_8asm.html"),
                SymbolEntry::new("Cmp16", "mem.asm", "a8eecc5c", SymbolKind::Function),
                SymbolEntry::new("cia.asm", "cia.asm", "", SymbolKind::File),
            ])
            .index
    }

    #[test]
    fn test_read_back_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("symbols.bin");
        let index = sample_index();

        let mut writer = SymbolWriter::new();
        writer.add_index(&index);
        writer.write(&path).unwrap();

        let reader = SymbolReader::open(&path).unwrap();
        assert_eq!(reader.len(), 3);
        assert_eq!(reader.read_index().unwrap(), index);
    }

    #[test]
    fn test_rejects_corruption() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("symbols.bin");

        let mut writer = SymbolWriter::new();
        writer.add_index(&sample_index());
        writer.write(&path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let err = SymbolReader::open(&path).err().unwrap();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_rejects_wrong_magic_and_short_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("symbols.bin");

        std::fs::write(&path, b"DXSI").unwrap();
        assert!(SymbolReader::open(&path).is_err());

        std::fs::write(&path, [0u8; 40]).unwrap();
        let err = SymbolReader::open(&path).err().unwrap();
        assert!(err.to_string().contains("magic"));
    }
}
