//! Index builder and indexing pipeline
//!
//! [`IndexBuilder`] validates symbol records, drops duplicates and groups the
//! rest into sorted shards. [`Indexer`] drives the whole pipeline: discover
//! input files, parse them in parallel, build, and persist the snapshot.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use crate::cache::CacheManager;
use crate::error::IndexError;
use crate::index::{IndexedSymbol, SymbolIndex};
use crate::models::{IndexConfig, IndexStats, SymbolEntry};
use crate::sources::{self, SourceRecords};

/// A record the builder refused, with the reason
#[derive(Debug, Clone, Serialize)]
pub struct RejectedEntry {
    pub entry: SymbolEntry,
    pub error: String,
}

/// Outcome of a build: what was kept, skipped and collapsed
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Entries stored in the index
    pub accepted: usize,
    /// Records skipped as malformed
    pub rejected: Vec<RejectedEntry>,
    /// Records dropped because an identical (name, file, anchor) was kept
    pub duplicates: usize,
}

/// A freshly built index plus its report
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub index: SymbolIndex,
    pub report: BuildReport,
}

/// Builds a [`SymbolIndex`] from symbol records
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    extra_name_chars: Vec<char>,
    max_name_len: usize,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}

impl IndexBuilder {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            extra_name_chars: config.extra_name_chars.chars().collect(),
            max_name_len: config.max_name_len,
        }
    }

    /// Check a record's name against the identifier charset
    pub fn validate(&self, entry: &SymbolEntry) -> Result<(), IndexError> {
        let name = entry.name.as_str();

        if name.is_empty() {
            return Err(IndexError::malformed(name, "name is empty"));
        }

        if name.len() > self.max_name_len {
            return Err(IndexError::malformed(
                name,
                format!("name exceeds {} bytes", self.max_name_len),
            ));
        }

        if let Some(bad) = name
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !self.extra_name_chars.contains(c))
        {
            return Err(IndexError::malformed(
                name,
                format!("character {:?} is not allowed in symbol names", bad),
            ));
        }

        Ok(())
    }

    /// Build an index, skipping and reporting malformed records
    ///
    /// The result depends only on the set of records, not on their order.
    pub fn build(&self, entries: impl IntoIterator<Item = SymbolEntry>) -> BuildOutput {
        let mut report = BuildReport::default();
        let mut symbols = Vec::new();

        for entry in entries {
            match self.validate(&entry) {
                Ok(()) => symbols.push(IndexedSymbol::new(entry)),
                Err(e) => {
                    log::warn!("Skipping record from {:?}: {}", entry.source_file, e);
                    report.rejected.push(RejectedEntry {
                        entry,
                        error: e.to_string(),
                    });
                }
            }
        }

        symbols.sort_by(|a, b| a.sort_cmp(b));

        // Identical tuples sort next to each other, so keeping the first of
        // each run keeps the smallest one regardless of input order
        let before = symbols.len();
        symbols.dedup_by(|later, kept| later.same_identity(kept));
        report.duplicates = before - symbols.len();
        report.accepted = symbols.len();

        if report.duplicates > 0 {
            log::debug!("Collapsed {} duplicate records", report.duplicates);
        }

        let index = SymbolIndex::from_sorted(symbols);
        log::info!(
            "Built index: {} symbols in {} shards ({} rejected, {} duplicates)",
            index.len(),
            index.shards().len(),
            report.rejected.len(),
            report.duplicates
        );

        BuildOutput { index, report }
    }
}

/// Manages the indexing process
pub struct Indexer {
    cache: CacheManager,
    config: IndexConfig,
}

impl Indexer {
    /// Create a new indexer with the given cache manager and config
    pub fn new(cache: CacheManager, config: IndexConfig) -> Self {
        Self { cache, config }
    }

    /// Parse every input, build the index and persist it
    pub fn index(&self, inputs: &[PathBuf]) -> Result<(IndexStats, BuildReport)> {
        let start = Instant::now();

        let files = sources::discover(inputs)?;
        if files.is_empty() {
            anyhow::bail!(
                "No symbol sources found in {:?}. Expected Doxygen search/*.js files or *.json listings.",
                inputs
            );
        }
        log::info!("Discovered {} symbol source files", files.len());

        let merged = merge_sources(self.parse_all(&files)?);
        log::info!(
            "Read {} symbol records ({} unreadable)",
            merged.entries.len(),
            merged.rejected.len()
        );

        let mut output = IndexBuilder::new(&self.config).build(merged.entries);
        output.report.duplicates += merged.shadowed;
        let mut rejected = merged.rejected;
        rejected.append(&mut output.report.rejected);
        output.report.rejected = rejected;

        self.cache.init()?;
        self.cache
            .write_snapshot(&output.index)
            .context("Failed to write index snapshot")?;

        let mut stats = output.index.stats();
        stats.rejected = output.report.rejected.len();
        stats.duplicates = output.report.duplicates;
        stats.index_size_bytes = self.cache.snapshot_size()?;
        stats.last_updated = chrono::Utc::now().to_rfc3339();
        self.cache.write_stats(&stats)?;

        log::info!("Indexing finished in {:?}", start.elapsed());
        Ok((stats, output.report))
    }

    /// Parse input files on a rayon pool, keeping discovery order in the output
    fn parse_all(&self, files: &[PathBuf]) -> Result<Vec<SourceRecords>> {
        let num_threads = if self.config.parallel_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.config.parallel_threads
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .context("Failed to create thread pool")?;

        let parsed: Vec<Result<SourceRecords>> =
            pool.install(|| files.par_iter().map(|path| sources::load(path)).collect());

        let mut records = Vec::with_capacity(files.len());
        for (path, result) in files.iter().zip(parsed) {
            let file_records =
                result.with_context(|| format!("Failed to read symbols from {}", path.display()))?;
            log::debug!(
                "  {} records from {} ({} unreadable)",
                file_records.entries.len(),
                path.display(),
                file_records.rejected.len()
            );
            for rejected in &file_records.rejected {
                log::warn!("Skipping record from {}: {}", path.display(), rejected.error);
            }
            records.push(file_records);
        }

        Ok(records)
    }
}

/// Records from every source, ready for the builder
#[derive(Debug, Default)]
pub struct MergedSources {
    pub entries: Vec<SymbolEntry>,
    pub rejected: Vec<RejectedEntry>,
    /// Entries with a guessed kind dropped because a source with a real kind
    /// listed the same (name, file, anchor)
    pub shadowed: usize,
}

/// Combine loaded sources, letting entries with a known kind win over
/// entries whose kind was inferred
pub fn merge_sources(sources: Vec<SourceRecords>) -> MergedSources {
    let mut merged = MergedSources::default();
    let mut inferred = Vec::new();

    for source in sources {
        merged.rejected.extend(source.rejected);
        if source.inferred_kinds {
            inferred.extend(source.entries);
        } else {
            merged.entries.extend(source.entries);
        }
    }

    let known: HashSet<(String, String, String)> = merged
        .entries
        .iter()
        .map(|e| (e.name.clone(), e.source_file.clone(), e.anchor_id.clone()))
        .collect();

    for entry in inferred {
        let identity = (entry.name.clone(), entry.source_file.clone(), entry.anchor_id.clone());
        if known.contains(&identity) {
            merged.shadowed += 1;
        } else {
            merged.entries.push(entry);
        }
    }

    merged
}
