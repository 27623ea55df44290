//! dxsearch: symbol search over Doxygen documentation indexes
//!
//! Doxygen's HTML output answers its search box from static
//! `search/<partition>_<n>.js` tables. dxsearch reads those tables (or a
//! JSON symbol listing), builds an immutable index sharded by each name's
//! first character, and answers case-insensitive prefix and substring queries.
//!
//! # Architecture
//!
//! - **Sources**: discovers and parses Doxygen payloads and JSON listings
//! - **Indexer**: validates records and builds sorted shards; persists snapshots
//! - **Query Engine**: lazy prefix-then-substring matching over a snapshot
//! - **Cache**: checksummed snapshot, stats and config in `.dxsearch/`
//! - **Export**: writes an index back out as Doxygen payloads
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use dxsearch::{IndexBuilder, QueryEngine, QueryFilter, SymbolEntry, SymbolKind};
//!
//! let output = IndexBuilder::default().build(vec![
//!     SymbolEntry::new("c128lib_Asl16", "math-global.asm", "a9e42e35", SymbolKind::Function),
//!     SymbolEntry::new("c128lib_Add16", "math-global.asm", "a107847d", SymbolKind::Function),
//! ]);
//!
//! let engine = QueryEngine::new(Arc::new(output.index));
//! let results = engine.search("c128lib_a", &QueryFilter::default()).unwrap();
//! assert_eq!(results[0].name, "c128lib_Add16");
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod formatter;
pub mod index;
pub mod indexer;
pub mod models;
pub mod output;
pub mod query;
pub mod searchdata;
pub mod sources;

// Re-export commonly used types
pub use cache::CacheManager;
pub use error::IndexError;
pub use index::{SharedIndex, SymbolIndex};
pub use indexer::{BuildReport, IndexBuilder, Indexer};
pub use models::{IndexConfig, IndexStats, MatchType, SearchResult, SymbolEntry, SymbolKind};
pub use query::{QueryEngine, QueryFilter};
