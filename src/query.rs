//! Query engine for searching the symbol index
//!
//! A query is matched case-insensitively against symbol names. Results come
//! back as a lazy [`Matches`] sequence: first every name that starts with the
//! query (found by binary search inside the query's shard), then every name
//! that contains it elsewhere (a scan over all shards in key order). Both
//! phases follow the index's sorted-name order.

use std::sync::Arc;

use crate::error::IndexError;
use crate::index::{fold, shard_key, SharedIndex, SymbolIndex};
use crate::models::{MatchType, QueryResponse, SearchResult, SymbolEntry, SymbolKind};

/// Query filter options
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Symbol kind filter (None = all kinds)
    pub kind: Option<SymbolKind>,
    /// Source file filter (case-insensitive substring match)
    pub file_pattern: Option<String>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Skip substring matches
    pub prefix_only: bool,
}

impl QueryFilter {
    fn accepts(&self, m: &Match<'_>) -> bool {
        if self.prefix_only && m.match_type != MatchType::Prefix {
            return false;
        }
        if let Some(kind) = &self.kind {
            if &m.entry.kind != kind {
                return false;
            }
        }
        if let Some(pattern) = &self.file_pattern {
            if !fold(&m.entry.source_file).contains(&fold(pattern)) {
                return false;
            }
        }
        true
    }
}

/// One matching entry and how it matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub entry: &'a SymbolEntry,
    pub match_type: MatchType,
}

impl Match<'_> {
    pub fn to_result(&self) -> SearchResult {
        SearchResult::from_entry(self.entry, self.match_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prefix { shard: usize, pos: usize },
    Substring { shard: usize, pos: usize },
    Done,
}

/// Lazy, finite sequence of matches for one query
///
/// Cloning a `Matches` (or calling [`Matches::restart`]) gives an independent
/// cursor over the same snapshot.
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    index: &'a SymbolIndex,
    needle: String,
    start: Phase,
    phase: Phase,
}

impl<'a> Matches<'a> {
    fn new(index: &'a SymbolIndex, needle: String) -> Self {
        let start = match shard_key(&needle).and_then(|key| position_of(index, key)) {
            Some(shard) => Phase::Prefix {
                shard,
                pos: index.shards()[shard].lower_bound(&needle),
            },
            None => Phase::Substring { shard: 0, pos: 0 },
        };

        Self {
            index,
            needle,
            start,
            phase: start,
        }
    }

    /// The folded query being matched
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// A fresh cursor positioned at the first match
    pub fn restart(&self) -> Self {
        Self {
            phase: self.start,
            ..self.clone()
        }
    }
}

fn position_of(index: &SymbolIndex, key: char) -> Option<usize> {
    index.shards().binary_search_by(|s| s.key().cmp(&key)).ok()
}

impl<'a> Iterator for Matches<'a> {
    type Item = Match<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index: &'a SymbolIndex = self.index;
        let shards = index.shards();

        loop {
            match self.phase {
                Phase::Prefix { shard, pos } => {
                    let symbols = shards[shard].symbols();
                    match symbols.get(pos) {
                        Some(symbol) if symbol.folded.starts_with(&self.needle) => {
                            self.phase = Phase::Prefix { shard, pos: pos + 1 };
                            return Some(Match {
                                entry: &symbol.entry,
                                match_type: MatchType::Prefix,
                            });
                        }
                        // Prefix matches are contiguous in a sorted shard
                        _ => self.phase = Phase::Substring { shard: 0, pos: 0 },
                    }
                }
                Phase::Substring { shard, pos } => {
                    let Some(current) = shards.get(shard) else {
                        self.phase = Phase::Done;
                        continue;
                    };
                    let Some(symbol) = current.symbols().get(pos) else {
                        self.phase = Phase::Substring {
                            shard: shard + 1,
                            pos: 0,
                        };
                        continue;
                    };

                    self.phase = Phase::Substring { shard, pos: pos + 1 };
                    if symbol.folded.contains(&self.needle)
                        && !symbol.folded.starts_with(&self.needle)
                    {
                        return Some(Match {
                            entry: &symbol.entry,
                            match_type: MatchType::Substring,
                        });
                    }
                }
                Phase::Done => return None,
            }
        }
    }
}

/// Check and normalize a user query
pub fn normalize_query(query: &str) -> Result<String, IndexError> {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        return Err(IndexError::InvalidQuery("query is empty".to_string()));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(IndexError::InvalidQuery(
            "query contains control characters".to_string(),
        ));
    }

    Ok(fold(trimmed))
}

/// Executes queries against one index snapshot
#[derive(Debug, Clone)]
pub struct QueryEngine {
    index: Arc<SymbolIndex>,
}

impl QueryEngine {
    /// Create a query engine over the given snapshot
    pub fn new(index: Arc<SymbolIndex>) -> Self {
        Self { index }
    }

    /// Create a query engine over the current snapshot of a shared index
    pub fn from_shared(shared: &SharedIndex) -> Self {
        Self::new(shared.snapshot())
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// All matches for `query`, prefix matches first
    pub fn matches(&self, query: &str) -> Result<Matches<'_>, IndexError> {
        let needle = normalize_query(query)?;
        log::debug!("Matching query '{}' against {} symbols", needle, self.index.len());
        Ok(Matches::new(&self.index, needle))
    }

    /// Execute a query with filters and collect the results
    pub fn search(&self, query: &str, filter: &QueryFilter) -> Result<Vec<SearchResult>, IndexError> {
        log::info!("Executing query: pattern='{}', filter={:?}", query, filter);

        let results: Vec<SearchResult> = self
            .matches(query)?
            .filter(|m| filter.accepts(m))
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|m| m.to_result())
            .collect();

        log::debug!("Query '{}' returned {} results", query, results.len());
        Ok(results)
    }

    /// Execute a query and report the total match count alongside the page of results
    pub fn search_with_metadata(
        &self,
        query: &str,
        filter: &QueryFilter,
    ) -> Result<QueryResponse, IndexError> {
        let matches = self.matches(query)?;
        let total_matches = matches.clone().filter(|m| filter.accepts(m)).count();

        let results = matches
            .filter(|m| filter.accepts(m))
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|m| m.to_result())
            .collect();

        Ok(QueryResponse {
            query: query.trim().to_string(),
            total_matches,
            results,
        })
    }
}
