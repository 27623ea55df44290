//! Discovery and loading of symbol sources
//!
//! Two input formats are understood:
//! - Doxygen payloads (`search/<partition>_<n>.js`)
//! - JSON symbol listings: an array of [`SymbolEntry`] objects, as written by
//!   an external extractor
//!
//! Directories are walked for payloads living in a `search/` directory and for
//! `*.symbols.json` listings. Hidden directories (including `.dxsearch/`) are
//! skipped.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::IndexError;
use crate::indexer::RejectedEntry;
use crate::models::{SymbolEntry, SymbolKind};
use crate::searchdata;

/// Suffix identifying JSON listings during directory discovery
pub const LISTING_SUFFIX: &str = ".symbols.json";

/// Kind of a recognized source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    /// Doxygen payload from the named partition
    SearchData { partition: String },
    /// JSON array of symbol records
    Listing,
}

/// Identify a file's format from its name
pub fn detect(path: &Path) -> Option<SourceFormat> {
    if let Some((partition, _)) = searchdata::split_payload_name(path) {
        return Some(SourceFormat::SearchData { partition });
    }
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        return Some(SourceFormat::Listing);
    }
    None
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn wanted_in_walk(path: &Path) -> bool {
    let in_search_dir = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n == std::ffi::OsStr::new("search"))
        .unwrap_or(false);

    if in_search_dir && searchdata::split_payload_name(path).is_some() {
        return true;
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(LISTING_SUFFIX))
        .unwrap_or(false)
}

/// Expand input paths into a sorted, de-duplicated list of source files
///
/// Files named explicitly must be in a recognized format.
pub fn discover(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let walker = WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !is_hidden(e));

            for entry in walker {
                let entry = entry
                    .with_context(|| format!("Failed to walk {}", input.display()))?;
                if entry.file_type().is_file() && wanted_in_walk(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if input.is_file() {
            if detect(input).is_none() {
                anyhow::bail!(
                    "Unrecognized symbol source: {} (expected <partition>_<n>.js or .json)",
                    input.display()
                );
            }
            files.push(input.clone());
        } else {
            anyhow::bail!("Input path does not exist: {}", input.display());
        }
    }

    files.sort();
    files.dedup();

    log::debug!("Discovered source files: {:?}", files);
    Ok(files)
}

/// Records read from one source file
#[derive(Debug, Clone, Default)]
pub struct SourceRecords {
    pub entries: Vec<SymbolEntry>,
    /// Kinds were guessed rather than given (Doxygen's `all` partition)
    pub inferred_kinds: bool,
    /// Records that could not be read as entries
    pub rejected: Vec<RejectedEntry>,
}

/// Load all symbol records from one source file
///
/// Only an unreadable file fails; a bad record in a listing is rejected on
/// its own and the rest are kept.
pub fn load(path: &Path) -> Result<SourceRecords> {
    let format = detect(path)
        .with_context(|| format!("Unrecognized symbol source: {}", path.display()))?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match format {
        SourceFormat::SearchData { partition } => Ok(SourceRecords {
            entries: searchdata::parse(&content, &partition)?,
            inferred_kinds: SymbolKind::from_partition(&partition).is_none(),
            rejected: Vec::new(),
        }),
        SourceFormat::Listing => parse_listing(&content)
            .with_context(|| format!("Failed to parse symbol listing {}", path.display())),
    }
}

/// Parse a JSON listing record by record
pub fn parse_listing(content: &str) -> Result<SourceRecords> {
    let values: Vec<Value> =
        serde_json::from_str(content).context("Symbol listing is not a JSON array")?;

    let mut records = SourceRecords::default();
    for (i, value) in values.into_iter().enumerate() {
        match listing_entry(i, value) {
            Ok(entry) => records.entries.push(entry),
            Err(rejected) => records.rejected.push(rejected),
        }
    }

    Ok(records)
}

fn listing_entry(i: usize, value: Value) -> Result<SymbolEntry, RejectedEntry> {
    let reason = match value.get("name") {
        Some(Value::String(_)) => match serde_json::from_value::<SymbolEntry>(value.clone()) {
            Ok(entry) => return Ok(entry),
            Err(e) => e.to_string(),
        },
        Some(_) => "name is not a string".to_string(),
        None => "name is missing".to_string(),
    };

    // Keep whatever string fields the record has so the report can point at it
    let field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let entry = SymbolEntry::new(
        field("name"),
        field("source_file"),
        field("anchor_id"),
        SymbolKind::from(field("kind")),
    );
    let error = IndexError::malformed(entry.name.clone(), format!("record {}: {}", i, reason));

    Err(RejectedEntry {
        entry,
        error: error.to_string(),
    })
}
