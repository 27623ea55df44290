//! Immutable, sharded symbol index
//!
//! Entries are partitioned by the ASCII-lowercased first character of their
//! name. Each shard is sorted by folded name so a prefix query only needs a
//! binary search inside one shard, and concatenating the shards in key order
//! yields the global sorted order used by substring queries.
//!
//! The index is never mutated after construction. [`SharedIndex`] holds the
//! current snapshot behind an `Arc`; a rebuild swaps the whole snapshot.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::models::{IndexStats, SymbolEntry};

/// Case-folded form of a name used for ordering and matching
pub fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Shard key for a name: its first character, ASCII-lowercased
pub fn shard_key(name: &str) -> Option<char> {
    name.chars().next().map(|c| c.to_ascii_lowercase())
}

/// An entry together with its folded name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedSymbol {
    pub entry: SymbolEntry,
    pub folded: String,
}

impl IndexedSymbol {
    pub fn new(entry: SymbolEntry) -> Self {
        let folded = fold(&entry.name);
        Self { entry, folded }
    }

    /// Total order: folded name, source file, then exact name, anchor, kind
    /// and document
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.folded
            .cmp(&other.folded)
            .then_with(|| self.entry.source_file.cmp(&other.entry.source_file))
            .then_with(|| self.entry.name.cmp(&other.entry.name))
            .then_with(|| self.entry.anchor_id.cmp(&other.entry.anchor_id))
            .then_with(|| self.entry.kind.cmp(&other.entry.kind))
            .then_with(|| self.entry.document.cmp(&other.entry.document))
    }

    /// Whether two entries share the identity tuple (name, source file, anchor)
    pub fn same_identity(&self, other: &Self) -> bool {
        self.entry.name == other.entry.name
            && self.entry.source_file == other.entry.source_file
            && self.entry.anchor_id == other.entry.anchor_id
    }
}

/// All entries whose name starts with the same folded character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    key: char,
    ordinal: usize,
    symbols: Vec<IndexedSymbol>,
}

impl Shard {
    /// Shard key (lowercase first character)
    pub fn key(&self) -> char {
        self.key
    }

    /// Position of this shard among all shards, as in Doxygen's `all_<n>.js`
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn symbols(&self) -> &[IndexedSymbol] {
        &self.symbols
    }

    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.symbols.iter().map(|s| &s.entry)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Index of the first symbol whose folded name is not less than `folded`
    pub fn lower_bound(&self, folded: &str) -> usize {
        self.symbols.partition_point(|s| s.folded.as_str() < folded)
    }
}

/// Read-only symbol index made of key-ordered shards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolIndex {
    shards: Vec<Shard>,
    total: usize,
}

impl SymbolIndex {
    /// Assemble an index from symbols that are already validated, deduplicated
    /// and sorted with [`IndexedSymbol::sort_cmp`]
    pub(crate) fn from_sorted(symbols: Vec<IndexedSymbol>) -> Self {
        let total = symbols.len();
        let mut grouped: BTreeMap<char, Vec<IndexedSymbol>> = BTreeMap::new();

        for symbol in symbols {
            // Validated names are never empty
            if let Some(key) = shard_key(&symbol.entry.name) {
                grouped.entry(key).or_default().push(symbol);
            }
        }

        let shards = grouped
            .into_iter()
            .enumerate()
            .map(|(ordinal, (key, symbols))| Shard {
                key,
                ordinal,
                symbols,
            })
            .collect();

        Self { shards, total }
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    /// Shard holding names that start with `key` (case-insensitive)
    pub fn shard(&self, key: char) -> Option<&Shard> {
        let key = key.to_ascii_lowercase();
        self.shards
            .binary_search_by(|s| s.key.cmp(&key))
            .ok()
            .map(|i| &self.shards[i])
    }

    /// Every entry in global sorted order
    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.shards.iter().flat_map(|s| s.entries())
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Entry counts per shard and per kind
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            total_symbols: self.total,
            total_shards: self.shards.len(),
            ..Default::default()
        };

        for shard in &self.shards {
            stats
                .symbols_by_shard
                .insert(shard.key.to_string(), shard.len());
            for entry in shard.entries() {
                *stats
                    .symbols_by_kind
                    .entry(entry.kind.to_string())
                    .or_insert(0) += 1;
            }
        }

        stats
    }
}

/// Holder of the current index snapshot
///
/// Readers clone the `Arc` and keep querying it even while a rebuild is
/// swapped in; nobody ever sees a half-built index.
#[derive(Debug, Default)]
pub struct SharedIndex {
    current: RwLock<Arc<SymbolIndex>>,
}

impl SharedIndex {
    pub fn new(index: SymbolIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<SymbolIndex> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // The lock only guards an Arc assignment, so the value is intact
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the snapshot, returning the previous one
    pub fn replace(&self, index: SymbolIndex) -> Arc<SymbolIndex> {
        let next = Arc::new(index);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}
