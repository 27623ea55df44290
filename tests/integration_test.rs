//! Integration tests for dxsearch

mod test_helpers;

use dxsearch::cache::SYMBOLS_BIN;
use dxsearch::export;
use dxsearch::{
    CacheManager, IndexBuilder, IndexError, Indexer, MatchType, QueryEngine, QueryFilter,
    SharedIndex, SymbolEntry, SymbolKind,
};
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::*;

#[test]
fn test_full_workflow() {
    let (temp, stats) = index_fixtures();

    assert_eq!(stats.total_symbols, FIXTURE_SYMBOLS);
    assert_eq!(stats.duplicates, FIXTURE_RECORDS - FIXTURE_SYMBOLS);
    assert_eq!(stats.rejected, 0);
    assert_eq!(stats.total_shards, 1);
    assert_eq!(stats.symbols_by_kind.get("file"), Some(&4));
    assert_eq!(stats.symbols_by_kind.get("function"), Some(&71));

    let results = engine(temp.path())
        .search("c128lib_a", &QueryFilter::default())
        .unwrap();

    assert_eq!(names(&results), vec!["c128lib_Add16", "c128lib_Asl16"]);
    assert_eq!(results[0].source_file, "math-global.asm");
    assert_eq!(results[0].anchor_id, "a107847d229794da8d1da21676ddcd569");
    assert_eq!(results[0].kind, SymbolKind::Function);
    assert_eq!(
        results[0].document.as_deref(),
        Some("../math-global_8asm.html")
    );
}

#[test]
fn test_prefix_matches_precede_substring_matches() {
    let (temp, _) = index_fixtures();

    let results = engine(temp.path())
        .search("copy", &QueryFilter::default())
        .unwrap();

    assert_eq!(results.len(), 8);
    assert!(results[..4].iter().all(|r| r.match_type == MatchType::Prefix));
    assert!(results[4..].iter().all(|r| r.match_type == MatchType::Substring));
    assert_eq!(results[0].name, "CopyFast");
    assert_eq!(results[4].name, "c128lib_CopyFast");
}

#[test]
fn test_query_is_case_insensitive() {
    let (temp, _) = index_fixtures();
    let engine = engine(temp.path());

    let lower = engine.search("cmp16", &QueryFilter::default()).unwrap();
    let upper = engine.search("CMP16", &QueryFilter::default()).unwrap();

    assert_eq!(names(&lower), names(&upper));
    assert_eq!(names(&lower), vec!["Cmp16", "c128lib_Cmp16"]);
}

#[test]
fn test_no_match_and_invalid_query() {
    let (temp, _) = index_fixtures();
    let engine = engine(temp.path());

    assert!(engine.search("zzz", &QueryFilter::default()).unwrap().is_empty());
    assert!(matches!(
        engine.search("", &QueryFilter::default()),
        Err(IndexError::InvalidQuery(_))
    ));
    assert!(matches!(
        engine.search("   ", &QueryFilter::default()),
        Err(IndexError::InvalidQuery(_))
    ));
}

#[test]
fn test_filters() {
    let (temp, _) = index_fixtures();
    let engine = engine(temp.path());

    let files = engine
        .search(
            "c",
            &QueryFilter {
                kind: Some(SymbolKind::File),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(
        names(&files),
        vec!["cia-global.asm", "cia.asm", "common-global.asm", "common.asm"]
    );

    let in_mem = engine
        .search(
            "copy",
            &QueryFilter {
                file_pattern: Some("mem.asm".to_string()),
                prefix_only: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(in_mem.len(), 4);
    assert!(in_mem.iter().all(|r| r.source_file == "mem.asm"));

    let limited = engine
        .search(
            "copy",
            &QueryFilter {
                limit: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(limited.len(), 3);
}

#[test]
fn test_lazy_matches_can_restart() {
    let (temp, _) = index_fixtures();
    let engine = engine(temp.path());

    let mut matches = engine.matches("copy").unwrap();
    let first: Vec<&str> = matches.by_ref().take(2).map(|m| m.entry.name.as_str()).collect();
    let again: Vec<&str> = matches
        .restart()
        .take(2)
        .map(|m| m.entry.name.as_str())
        .collect();

    assert_eq!(first, again);
    assert_eq!(matches.count(), 6);
}

#[test]
fn test_stats_are_persisted() {
    let (temp, stats) = index_fixtures();
    let cache = CacheManager::new(temp.path());

    let loaded = cache.stats().unwrap();
    assert_eq!(loaded, stats);
    assert!(loaded.index_size_bytes > 0);
    assert!(!loaded.last_updated.is_empty());
}

#[test]
fn test_reindex_replaces_snapshot() {
    let temp = TempDir::new().unwrap();
    let listing = temp.path().join("extra.symbols.json");
    std::fs::write(
        &listing,
        r#"[{"name": "Go40", "anchor_id": "ab9c", "source_file": "vdc.asm", "kind": "function"}]"#,
    )
    .unwrap();

    index_into(temp.path(), &[listing.clone()]);
    assert_eq!(engine(temp.path()).index().len(), 1);

    index_into(temp.path(), &[listing, fixture_dir()]);
    let engine = engine(temp.path());
    assert_eq!(engine.index().len(), FIXTURE_SYMBOLS + 1);
    assert_eq!(engine.index().shards().len(), 2);
    assert_eq!(engine.index().shard('g').map(|s| s.ordinal()), Some(1));
}

#[test]
fn test_export_then_reindex_preserves_index() {
    let (temp, _) = index_fixtures();
    let original = CacheManager::new(temp.path()).read_snapshot().unwrap();

    let out = TempDir::new().unwrap();
    let search_dir = out.path().join("html/search");
    export::export(&original, &search_dir).unwrap();
    assert!(search_dir.join("all_0.js").exists());
    assert!(search_dir.join("functions_0.js").exists());
    assert!(search_dir.join("files_0.js").exists());

    index_into(out.path(), &[out.path().join("html")]);
    let reloaded = CacheManager::new(out.path()).read_snapshot().unwrap();

    let before: Vec<&SymbolEntry> = original.entries().collect();
    let after: Vec<&SymbolEntry> = reloaded.entries().collect();
    assert_eq!(before, after);
}

#[test]
fn test_export_then_reindex_keeps_variables_and_pages() {
    let original = IndexBuilder::default()
        .build(vec![
            SymbolEntry::new("ScreenBase", "vdc.asm", "a1f0", SymbolKind::Variable)
                .with_document("../vdc_8asm.html"),
            SymbolEntry::new("Intro", "intro.md", "", SymbolKind::Page)
                .with_document("../intro_8md.html"),
            SymbolEntry::new("VDC_RAM", "vdc.asm", "a2b1", SymbolKind::Define)
                .with_document("../vdc_8asm.html"),
        ])
        .index;

    let out = TempDir::new().unwrap();
    export::export(&original, &out.path().join("html/search")).unwrap();
    let (stats, report) = Indexer::new(CacheManager::new(out.path()), Default::default())
        .index(&[out.path().join("html")])
        .unwrap();
    let reloaded = CacheManager::new(out.path()).read_snapshot().unwrap();

    let before: Vec<&SymbolEntry> = original.entries().collect();
    let after: Vec<&SymbolEntry> = reloaded.entries().collect();
    assert_eq!(before, after);

    // The `all` copies lose to the per-kind payloads
    assert_eq!(report.duplicates, 3);
    assert_eq!(stats.symbols_by_kind.get("variable"), Some(&1));
    assert_eq!(stats.symbols_by_kind.get("function"), None);
}

#[test]
fn test_build_is_independent_of_input_order() {
    let entries: Vec<SymbolEntry> = dxsearch::sources::load(&fixture_dir().join("search/functions_2.js"))
        .unwrap()
        .entries;

    let mut reversed = entries.clone();
    reversed.reverse();
    let mut rotated = entries.clone();
    rotated.rotate_left(17);

    let builder = IndexBuilder::default();
    let a = builder.build(entries).index;
    let b = builder.build(reversed).index;
    let c = builder.build(rotated).index;

    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn test_malformed_records_are_reported() {
    let temp = TempDir::new().unwrap();
    let listing = temp.path().join("bad.symbols.json");
    std::fs::write(
        &listing,
        r#"[
            {"name": "c128lib_Add16", "anchor_id": "a1", "source_file": "math-global.asm", "kind": "function"},
            {"name": "", "anchor_id": "a2", "source_file": "math-global.asm", "kind": "function"},
            {"name": "bad name", "anchor_id": "a3", "source_file": "math-global.asm", "kind": "function"},
            {"name": "Sub16()", "anchor_id": "a4", "source_file": "math-global.asm", "kind": "function"}
        ]"#,
    )
    .unwrap();

    let cache = CacheManager::new(temp.path());
    let indexer = Indexer::new(cache, Default::default());
    let (stats, report) = indexer.index(&[listing]).unwrap();

    assert_eq!(stats.total_symbols, 1);
    assert_eq!(stats.rejected, 3);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected.len(), 3);
}

#[test]
fn test_bad_listing_records_do_not_abort_the_build() {
    let temp = TempDir::new().unwrap();
    let listing = temp.path().join("lib.symbols.json");
    std::fs::write(
        &listing,
        r#"[
            {"name": "c128lib_Add16", "anchor_id": "a1", "source_file": "math-global.asm", "kind": "function"},
            {"name": "SetBank", "anchor_id": "a2", "source_file": "mmu.asm", "kind": "macro"},
            {"anchor_id": "a3", "source_file": "vdc.asm", "kind": "function"},
            {"name": "bad name", "anchor_id": "a4", "source_file": "vdc.asm", "kind": "function"}
        ]"#,
    )
    .unwrap();

    let (stats, report) = Indexer::new(CacheManager::new(temp.path()), Default::default())
        .index(&[listing, fixture_dir()])
        .unwrap();

    assert_eq!(stats.total_symbols, FIXTURE_SYMBOLS + 2);
    assert_eq!(stats.rejected, 2);
    assert_eq!(report.rejected.len(), 2);
    assert!(report.rejected[0].error.contains("name is missing"));
    assert_eq!(report.rejected[1].entry.name, "bad name");

    let engine = engine(temp.path());
    let set_bank = engine.search("setbank", &QueryFilter::default()).unwrap();
    assert_eq!(set_bank[0].kind, SymbolKind::Unknown("macro".to_string()));
    assert_eq!(
        names(&engine.search("c128lib_a", &QueryFilter::default()).unwrap()),
        vec!["c128lib_Add16", "c128lib_Add16", "c128lib_Asl16"]
    );
}

#[test]
fn test_corrupt_snapshot_is_refused() {
    let (temp, _) = index_fixtures();
    let cache = CacheManager::new(temp.path());
    let path = cache.path().join(SYMBOLS_BIN);

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&path, bytes).unwrap();

    assert!(cache.read_snapshot().is_err());
}

#[test]
fn test_shared_index_swap_keeps_old_readers() {
    let (temp, _) = index_fixtures();
    let index = CacheManager::new(temp.path()).read_snapshot().unwrap();

    let shared = Arc::new(SharedIndex::new(index));
    let before = QueryEngine::from_shared(&shared);

    let replacement = IndexBuilder::default()
        .build(vec![SymbolEntry::new("Go40", "vdc.asm", "ab9c", SymbolKind::Function)])
        .index;

    let writer = {
        let shared = Arc::clone(&shared);
        std::thread::spawn(move || {
            shared.replace(replacement);
        })
    };
    writer.join().unwrap();

    let after = QueryEngine::from_shared(&shared);
    assert_eq!(before.search("c128lib_a", &QueryFilter::default()).unwrap().len(), 2);
    assert!(after.search("c128lib_a", &QueryFilter::default()).unwrap().is_empty());
    assert_eq!(after.search("go", &QueryFilter::default()).unwrap().len(), 1);
}

#[test]
fn test_cache_clear() {
    let (temp, _) = index_fixtures();
    let cache = CacheManager::new(temp.path());

    assert!(cache.exists());
    cache.clear().unwrap();
    assert!(!cache.exists());
    assert!(!cache.path().exists());
}
