//! Core data models for dxsearch
//!
//! These structures are the normalized records that flow from the input
//! sources through the index builder and out of the query engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Coarse category of a documented symbol
///
/// Derived from the Doxygen partition an entry appeared in (`functions_2.js`
/// yields `Function`, `files_0.js` yields `File`, and so on).
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, Display,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum SymbolKind {
    Function,
    Variable,
    Define,
    Typedef,
    Enum,
    #[strum(serialize = "enumvalue")]
    EnumValue,
    Class,
    Namespace,
    File,
    Page,
    Group,
    /// Catch-all for partitions not explicitly supported.
    /// The string holds the original partition name.
    #[strum(default)]
    Unknown(String),
}

impl From<String> for SymbolKind {
    /// Any name is accepted; names not listed above become `Unknown`
    fn from(name: String) -> Self {
        name.parse().unwrap_or(SymbolKind::Unknown(name))
    }
}

impl From<SymbolKind> for String {
    fn from(kind: SymbolKind) -> Self {
        kind.to_string()
    }
}

impl SymbolKind {
    /// Map a Doxygen partition name (`functions`, `files`, ...) to a kind
    ///
    /// Returns `None` for the `all` partition, whose entries have no single
    /// kind and must be inferred per target.
    pub fn from_partition(partition: &str) -> Option<Self> {
        let kind = match partition {
            "all" => return None,
            "functions" => SymbolKind::Function,
            "variables" => SymbolKind::Variable,
            "defines" => SymbolKind::Define,
            "typedefs" => SymbolKind::Typedef,
            "enums" => SymbolKind::Enum,
            "enumvalues" => SymbolKind::EnumValue,
            "classes" => SymbolKind::Class,
            "namespaces" => SymbolKind::Namespace,
            "files" => SymbolKind::File,
            "pages" => SymbolKind::Page,
            "groups" => SymbolKind::Group,
            other => SymbolKind::Unknown(other.to_string()),
        };
        Some(kind)
    }

    /// Doxygen partition name this kind is exported under
    pub fn partition(&self) -> &str {
        match self {
            SymbolKind::Function => "functions",
            SymbolKind::Variable => "variables",
            SymbolKind::Define => "defines",
            SymbolKind::Typedef => "typedefs",
            SymbolKind::Enum => "enums",
            SymbolKind::EnumValue => "enumvalues",
            SymbolKind::Class => "classes",
            SymbolKind::Namespace => "namespaces",
            SymbolKind::File => "files",
            SymbolKind::Page => "pages",
            SymbolKind::Group => "groups",
            SymbolKind::Unknown(name) => name,
        }
    }

    /// Human-readable section label used in `searchdata.js`
    pub fn label(&self) -> String {
        match self {
            SymbolKind::EnumValue => "Enumerator".to_string(),
            SymbolKind::Define => "Macros".to_string(),
            SymbolKind::Class => "Data Structures".to_string(),
            SymbolKind::Unknown(name) => name.clone(),
            other => {
                let partition = other.partition();
                let mut chars = partition.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            }
        }
    }
}

/// One documented identifier plus its documentation location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SymbolEntry {
    /// Canonical identifier (e.g. `c128lib_Add16`)
    pub name: String,
    /// Fragment locating the symbol inside its rendered page (empty for whole pages)
    #[serde(default)]
    pub anchor_id: String,
    /// Logical name of the defining file
    pub source_file: String,
    /// Coarse category
    pub kind: SymbolKind,
    /// Relative URL of the rendered page, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

impl SymbolEntry {
    pub fn new(
        name: impl Into<String>,
        source_file: impl Into<String>,
        anchor_id: impl Into<String>,
        kind: SymbolKind,
    ) -> Self {
        Self {
            name: name.into(),
            anchor_id: anchor_id.into(),
            source_file: source_file.into(),
            kind,
            document: None,
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    /// Link target as `document#anchor`, or just the document for whole pages
    pub fn href(&self) -> Option<String> {
        let document = self.document.as_deref()?;
        if self.anchor_id.is_empty() {
            Some(document.to_string())
        } else {
            Some(format!("{}#{}", document, self.anchor_id))
        }
    }
}

/// How a search result matched the query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchType {
    /// Name starts with the query
    Prefix,
    /// Name contains the query somewhere after its first character
    Substring,
}

/// A search result ready for rendering as a link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub name: String,
    pub source_file: String,
    pub anchor_id: String,
    pub kind: SymbolKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub match_type: MatchType,
}

impl SearchResult {
    pub fn from_entry(entry: &SymbolEntry, match_type: MatchType) -> Self {
        Self {
            name: entry.name.clone(),
            source_file: entry.source_file.clone(),
            anchor_id: entry.anchor_id.clone(),
            kind: entry.kind.clone(),
            document: entry.document.clone(),
            match_type,
        }
    }
}

/// Query response: one page of results plus the total match count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The query as matched (surrounding whitespace removed)
    pub query: String,
    /// Matches before the limit was applied
    pub total_matches: usize,
    /// Search results
    pub results: Vec<SearchResult>,
}

/// Configuration for index building
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Characters accepted in symbol names besides ASCII alphanumerics
    pub extra_name_chars: String,
    /// Longest accepted symbol name (bytes)
    pub max_name_len: usize,
    /// Number of threads for parsing input files (0 = auto)
    pub parallel_threads: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extra_name_chars: "_.-:~$".to_string(),
            max_name_len: 256,
            parallel_threads: 0,
        }
    }
}

/// Configuration for query execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Result limit applied when the caller gives none (0 = unlimited)
    pub default_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

/// Statistics about a built index
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    /// Entries stored in the index
    pub total_symbols: usize,
    /// Number of non-empty shards
    pub total_shards: usize,
    /// Entry count per shard key
    pub symbols_by_shard: BTreeMap<String, usize>,
    /// Entry count per kind
    pub symbols_by_kind: BTreeMap<String, usize>,
    /// Records skipped as malformed during the build
    pub rejected: usize,
    /// Records collapsed as duplicates during the build
    pub duplicates: usize,
    /// Snapshot size on disk (bytes)
    pub index_size_bytes: u64,
    /// Build timestamp (RFC 3339)
    pub last_updated: String,
}
