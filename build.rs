//! Build-time schema hash computation for snapshot invalidation
//!
//! This build script hashes the source files that define the layout of
//! `.dxsearch/symbols.bin`. The hash is stored in every snapshot header; a
//! snapshot written by a build with a different layout is refused on load and
//! the user is asked to run `dxs index` again.
//!
//! ## Snapshot-critical files:
//! - src/cache/symbol_writer.rs: header layout and serialized record
//! - src/models.rs: SymbolKind names stored in the record

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Snapshot-critical source files that affect binary format compatibility
const SNAPSHOT_CRITICAL_FILES: &[&str] = &[
    "src/cache/symbol_writer.rs",
    "src/models.rs",
];

fn main() {
    let schema_hash = compute_schema_hash();

    // Export as environment variable for runtime access
    println!("cargo:rustc-env=SNAPSHOT_SCHEMA_HASH={}", schema_hash);

    for file in SNAPSHOT_CRITICAL_FILES {
        println!("cargo:rerun-if-changed={}", file);
    }
}

/// Compute a deterministic hash of all snapshot-critical source files
fn compute_schema_hash() -> String {
    let mut hasher = blake3::Hasher::new();

    // Use BTreeSet to ensure deterministic ordering (sorted by file path)
    let files: BTreeSet<&str> = SNAPSHOT_CRITICAL_FILES.iter().copied().collect();

    for file_path in &files {
        let path = Path::new(file_path);

        if !path.exists() {
            panic!("Snapshot-critical file not found: {}", file_path);
        }

        let content = fs::read(path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", file_path, e));

        // Hash: file path (for identity) + file content (for changes)
        hasher.update(file_path.as_bytes());
        hasher.update(&content);
    }

    // First 8 bytes as 16 hex chars; the reader parses them back into a u64
    let hash = hasher.finalize();
    hash.as_bytes()[..8]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}
