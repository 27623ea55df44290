//! Shared helpers for integration tests
//!
//! `tests/fixtures/html` is a slice of real Doxygen output for c128lib: the
//! `all` and `functions` payloads for the letter `c`.

#![allow(dead_code)]

use dxsearch::{CacheManager, IndexStats, Indexer, QueryEngine, SearchResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Records in the two fixture payloads
pub const FIXTURE_RECORDS: usize = 120;
/// Distinct (name, file, anchor) triples among them
pub const FIXTURE_SYMBOLS: usize = 75;

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/html")
}

/// Index the fixtures into a fresh cache directory
pub fn index_fixtures() -> (TempDir, IndexStats) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let stats = index_into(temp.path(), &[fixture_dir()]);
    (temp, stats)
}

pub fn index_into(root: &Path, inputs: &[PathBuf]) -> IndexStats {
    let cache = CacheManager::new(root);
    let config = cache.config().expect("Failed to load config");
    let indexer = Indexer::new(cache, config.index);
    let (stats, _report) = indexer.index(inputs).expect("Failed to index");
    stats
}

/// Query engine over the snapshot stored under `root`
pub fn engine(root: &Path) -> QueryEngine {
    let index = CacheManager::new(root)
        .read_snapshot()
        .expect("Failed to read snapshot");
    QueryEngine::new(Arc::new(index))
}

pub fn names(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.name.as_str()).collect()
}
