//! Export of an index as Doxygen search payloads
//!
//! Produces the same file set Doxygen puts in `html/search/`: one
//! `<partition>_<n>.js` per (partition, first letter) pair, numbered by the
//! letter's position within that partition, plus `searchdata.js`.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::index::{shard_key, SymbolIndex};
use crate::models::{SymbolEntry, SymbolKind};
use crate::searchdata::{self, Section};

/// File name of the section table
pub const SECTIONS_JS: &str = "searchdata.js";

/// A rendered file, relative to the export directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub name: String,
    pub content: String,
}

fn by_letter<'a>(entries: impl Iterator<Item = &'a SymbolEntry>) -> BTreeMap<char, Vec<&'a SymbolEntry>> {
    let mut letters: BTreeMap<char, Vec<&SymbolEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(key) = shard_key(&entry.name) {
            letters.entry(key).or_default().push(entry);
        }
    }
    letters
}

fn render_partition(
    name: &str,
    label: String,
    letters: BTreeMap<char, Vec<&SymbolEntry>>,
    files: &mut Vec<RenderedFile>,
) -> Section {
    let mut present = String::new();
    for (ordinal, (letter, entries)) in letters.into_iter().enumerate() {
        present.push(letter);
        files.push(RenderedFile {
            name: format!("{}_{}.js", name, ordinal),
            content: searchdata::render(entries),
        });
    }
    Section {
        name: name.to_string(),
        label,
        letters: present,
    }
}

/// Render every payload for the index, section table last
pub fn render_payloads(index: &SymbolIndex) -> Vec<RenderedFile> {
    let mut files = Vec::new();
    let mut sections = Vec::new();

    if index.is_empty() {
        log::warn!("Exporting an empty index");
    }

    sections.push(render_partition(
        "all",
        "All".to_string(),
        by_letter(index.entries()),
        &mut files,
    ));

    let mut kinds: BTreeMap<&SymbolKind, Vec<&SymbolEntry>> = BTreeMap::new();
    for entry in index.entries() {
        kinds.entry(&entry.kind).or_default().push(entry);
    }

    for (kind, entries) in kinds {
        sections.push(render_partition(
            kind.partition(),
            kind.label(),
            by_letter(entries.into_iter()),
            &mut files,
        ));
    }

    files.push(RenderedFile {
        name: SECTIONS_JS.to_string(),
        content: searchdata::render_sections(&sections),
    });

    files
}

/// Write every payload into `out_dir`, creating it if needed
pub fn export(index: &SymbolIndex, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::new();
    for file in render_payloads(index) {
        let path = out_dir.join(&file.name);
        std::fs::write(&path, file.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
        written.push(path);
    }

    log::info!("Exported {} files to {}", written.len(), out_dir.display());
    Ok(written)
}
