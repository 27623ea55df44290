//! Cache management
//!
//! The cache module handles the `.dxsearch/` directory structure:
//! - `symbols.bin`: Index snapshot (header + bincode payload)
//! - `stats.json`: Statistics of the last build (JSON)
//! - `config.toml`: Index and query settings (TOML text)

pub mod symbol_reader;
pub mod symbol_writer;

pub use symbol_reader::SymbolReader;
pub use symbol_writer::SymbolWriter;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::index::SymbolIndex;
use crate::models::IndexStats;

/// Default cache directory name
pub const CACHE_DIR: &str = ".dxsearch";

/// File names within the cache directory
pub const SYMBOLS_BIN: &str = "symbols.bin";
pub const STATS_JSON: &str = "stats.json";
pub const CONFIG_TOML: &str = "config.toml";

/// Manages the dxsearch cache directory
pub struct CacheManager {
    cache_path: PathBuf,
}

impl CacheManager {
    /// Create a new cache manager for the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        let cache_path = root.as_ref().join(CACHE_DIR);
        Self { cache_path }
    }

    /// Initialize the cache directory structure if it doesn't exist
    pub fn init(&self) -> Result<()> {
        log::info!("Initializing cache at {:?}", self.cache_path);

        if !self.cache_path.exists() {
            std::fs::create_dir_all(&self.cache_path)
                .with_context(|| format!("Failed to create {}", self.cache_path.display()))?;
        }

        self.init_config_toml()?;

        Ok(())
    }

    /// Write config.toml with defaults unless one exists
    fn init_config_toml(&self) -> Result<()> {
        let config_path = self.cache_path.join(CONFIG_TOML);

        if config_path.exists() {
            return Ok(());
        }

        std::fs::write(&config_path, config::DEFAULT_CONFIG_TOML)
            .context("Failed to write config.toml")?;

        log::debug!("Created default config.toml");
        Ok(())
    }

    /// Check if an index snapshot exists
    pub fn exists(&self) -> bool {
        self.cache_path.join(SYMBOLS_BIN).exists()
    }

    /// Get the path to the cache directory
    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    /// Load config.toml (defaults when missing)
    pub fn config(&self) -> Result<Config> {
        config::load_config(&self.cache_path)
    }

    /// Persist an index snapshot
    pub fn write_snapshot(&self, index: &SymbolIndex) -> Result<()> {
        let mut writer = SymbolWriter::new();
        writer.add_index(index);
        writer.write(self.cache_path.join(SYMBOLS_BIN))
    }

    /// Load the persisted index snapshot
    pub fn read_snapshot(&self) -> Result<SymbolIndex> {
        if !self.exists() {
            anyhow::bail!("Index not found. Run 'dxs index <PATH>' to build it first.");
        }

        let reader = SymbolReader::open(self.cache_path.join(SYMBOLS_BIN))?;
        let index = reader.read_index()?;
        log::info!("Loaded index snapshot with {} symbols", index.len());
        Ok(index)
    }

    /// Size of symbols.bin in bytes
    pub fn snapshot_size(&self) -> Result<u64> {
        let path = self.cache_path.join(SYMBOLS_BIN);
        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        Ok(metadata.len())
    }

    /// Save build statistics
    pub fn write_stats(&self, stats: &IndexStats) -> Result<()> {
        let json = serde_json::to_string_pretty(stats)
            .context("Failed to serialize index stats")?;
        std::fs::write(self.cache_path.join(STATS_JSON), json)
            .context("Failed to write stats.json")?;
        Ok(())
    }

    /// Statistics of the last build
    ///
    /// Falls back to recomputing from the snapshot when stats.json is missing.
    pub fn stats(&self) -> Result<IndexStats> {
        let stats_path = self.cache_path.join(STATS_JSON);

        if stats_path.exists() {
            let content = std::fs::read_to_string(&stats_path)
                .context("Failed to read stats.json")?;
            return serde_json::from_str(&content).context("Failed to parse stats.json");
        }

        log::debug!("No stats.json found, recomputing from snapshot");
        let mut stats = self.read_snapshot()?.stats();
        stats.index_size_bytes = self.snapshot_size()?;
        Ok(stats)
    }

    /// Remove the entire cache directory
    pub fn clear(&self) -> Result<()> {
        log::warn!("Clearing cache at {:?}", self.cache_path);

        if self.cache_path.exists() {
            std::fs::remove_dir_all(&self.cache_path)?;
        }

        Ok(())
    }
}
