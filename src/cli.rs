//! CLI argument parsing and command handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::CacheManager;
use crate::export;
use crate::formatter::OutputFormatter;
use crate::indexer::Indexer;
use crate::models::SymbolKind;
use crate::output;
use crate::query::{QueryEngine, QueryFilter};

/// dxsearch: symbol search over Doxygen documentation indexes
#[derive(Parser, Debug)]
#[command(
    name = "dxs",
    version,
    about = "Prefix and substring symbol search over Doxygen search indexes",
    long_about = "dxsearch builds a sharded symbol index from Doxygen search payloads \
                  (html/search/*.js) or JSON symbol listings, and answers prefix and \
                  substring queries against it. The index lives in .dxsearch/."
)]
pub struct Cli {
    /// Enable verbose logging (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding the .dxsearch/ cache
    #[arg(short = 'C', long, default_value = ".", global = true)]
    pub dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the symbol index from Doxygen payloads or JSON listings
    ///
    /// Directories are searched for search/<partition>_<n>.js payloads and
    /// *.symbols.json listings. Malformed records are skipped and reported.
    ///
    /// Examples:
    ///   dxs index docs/html
    ///   dxs index docs/html/search/functions_2.js extra.symbols.json
    Index {
        /// Files or directories to read symbols from
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Output the build report as JSON
        #[arg(long)]
        json: bool,

        /// Suppress all output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Query the symbol index
    ///
    /// Names starting with the pattern come first, then names containing it.
    /// Matching is case-insensitive.
    ///
    /// Examples:
    ///   dxs query c128lib_set
    ///   dxs query vdc --kind function --file global
    Query {
        /// Search pattern
        pattern: String,

        /// Filter by symbol kind (function, file, variable, define, ...)
        #[arg(short, long)]
        kind: Option<String>,

        /// Filter by source file (substring match)
        #[arg(short = 'f', long)]
        file: Option<String>,

        /// Maximum number of results (0 = unlimited; default from config.toml)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Only return names that start with the pattern
        #[arg(short, long)]
        prefix_only: bool,

        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output (only with --json)
        #[arg(long)]
        pretty: bool,

        /// Use plain text output (disable colors)
        #[arg(long)]
        plain: bool,

        /// Only show count and timing, not the actual results
        #[arg(short, long)]
        count: bool,
    },

    /// Show index statistics
    Stats {
        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output (only with --json)
        #[arg(long)]
        pretty: bool,
    },

    /// Write the index back out as Doxygen search payloads
    Export {
        /// Directory to write <partition>_<n>.js and searchdata.js into
        #[arg(value_name = "OUT_DIR")]
        out_dir: PathBuf,
    },

    /// Delete the index
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // Setup logging based on verbosity
        let log_level = match self.verbose {
            0 => "warn",   // Default: only warnings and errors
            1 => "info",   // -v: show info messages
            2 => "debug",  // -vv: show debug messages
            _ => "trace",  // -vvv: show trace messages
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .init();

        let dir = self.dir.as_path();

        match self.command {
            Command::Index { paths, json, quiet } => handle_index(dir, &paths, json, quiet),
            Command::Query { pattern, kind, file, limit, prefix_only, json, pretty, plain, count } => {
                handle_query(dir, &pattern, kind, file, limit, prefix_only, json, pretty, plain, count)
            }
            Command::Stats { json, pretty } => handle_stats(dir, json, pretty),
            Command::Export { out_dir } => handle_export(dir, &out_dir),
            Command::Clear { yes } => handle_clear(dir, yes),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Handle the `index` subcommand
fn handle_index(dir: &Path, paths: &[PathBuf], as_json: bool, quiet: bool) -> Result<()> {
    log::info!("Starting index build for {:?}", paths);

    let cache = CacheManager::new(dir);
    let config = cache.config()?;
    let indexer = Indexer::new(cache, config.index);
    let (stats, report) = indexer.index(paths)?;

    if quiet {
        return Ok(());
    }

    if as_json {
        println!("{}", to_json(&report, true)?);
        return Ok(());
    }

    println!(
        "Indexed {} symbols in {} shards ({} duplicates collapsed)",
        stats.total_symbols, stats.total_shards, stats.duplicates
    );

    if !report.rejected.is_empty() {
        let mut message = format!("Skipped {} malformed records:", report.rejected.len());
        for rejected in &report.rejected {
            message.push_str(&format!(
                "\n  {} ({}): {}",
                rejected.entry.name, rejected.entry.source_file, rejected.error
            ));
        }
        output::warn(&message);
    }

    Ok(())
}

fn parse_kind(kind: &str) -> Result<SymbolKind> {
    match kind.parse::<SymbolKind>() {
        Ok(SymbolKind::Unknown(name)) => {
            anyhow::bail!(
                "Unknown symbol kind '{}'. Supported: function, variable, define, typedef, enum, \
                 enumvalue, class, namespace, file, page, group",
                name
            )
        }
        Ok(kind) => Ok(kind),
        Err(e) => anyhow::bail!("Invalid symbol kind '{}': {}", kind, e),
    }
}

/// Handle the `query` subcommand
#[allow(clippy::too_many_arguments)]
fn handle_query(
    dir: &Path,
    pattern: &str,
    kind: Option<String>,
    file: Option<String>,
    limit: Option<usize>,
    prefix_only: bool,
    as_json: bool,
    pretty_json: bool,
    plain: bool,
    count_only: bool,
) -> Result<()> {
    let start = Instant::now();

    let cache = CacheManager::new(dir);
    let config = cache.config()?;
    let kind = kind.as_deref().map(parse_kind).transpose()?;

    // 0 means unlimited on the command line and in config.toml
    let limit = match limit.unwrap_or(config.query.default_limit) {
        0 => None,
        n => Some(n),
    };

    let filter = QueryFilter {
        kind,
        file_pattern: file,
        limit,
        prefix_only,
    };

    let index = cache.read_snapshot()?;
    let engine = QueryEngine::new(Arc::new(index));
    let response = engine
        .search_with_metadata(pattern, &filter)
        .context("Query failed")?;

    let elapsed = start.elapsed();

    if as_json {
        println!("{}", to_json(&response, pretty_json)?);
        return Ok(());
    }

    if count_only {
        println!(
            "Found {} matches in {:.1}ms",
            response.total_matches,
            elapsed.as_secs_f64() * 1000.0
        );
        return Ok(());
    }

    let formatter = OutputFormatter::new(plain);
    formatter.format_results(&response.results, pattern);

    if response.results.len() < response.total_matches {
        output::info(&format!(
            "Showing {} of {} matches ({:.1}ms). Use --limit 0 to see all.",
            response.results.len(),
            response.total_matches,
            elapsed.as_secs_f64() * 1000.0
        ));
    }

    Ok(())
}

/// Handle the `stats` subcommand
fn handle_stats(dir: &Path, as_json: bool, pretty_json: bool) -> Result<()> {
    log::info!("Showing index statistics");

    let cache = CacheManager::new(dir);

    if !cache.exists() {
        anyhow::bail!(
            "No index found in {}.\n\
             \n\
             Run 'dxs index <PATH>' to build the symbol index first.\n\
             \n\
             Example:\n\
             $ dxs index docs/html   # Index Doxygen output\n\
             $ dxs stats             # Show index statistics",
            dir.display()
        );
    }

    let stats = cache.stats()?;

    if as_json {
        println!("{}", to_json(&stats, pretty_json)?);
        return Ok(());
    }

    println!("Symbol Index Statistics");
    println!("=======================");
    println!("Symbols:         {}", stats.total_symbols);
    println!("Shards:          {}", stats.total_shards);
    println!("Rejected:        {}", stats.rejected);
    println!("Duplicates:      {}", stats.duplicates);
    println!("Index size:      {} bytes", stats.index_size_bytes);
    if !stats.last_updated.is_empty() {
        println!("Last updated:    {}", stats.last_updated);
    }

    if !stats.symbols_by_kind.is_empty() {
        println!("\nBy kind:");
        for (kind, count) in &stats.symbols_by_kind {
            println!("  {:<14} {}", kind, count);
        }
    }

    if !stats.symbols_by_shard.is_empty() {
        println!("\nBy shard:");
        for (key, count) in &stats.symbols_by_shard {
            println!("  {:<14} {}", key, count);
        }
    }

    Ok(())
}

/// Handle the `export` subcommand
fn handle_export(dir: &Path, out_dir: &Path) -> Result<()> {
    let index = CacheManager::new(dir).read_snapshot()?;
    let written = export::export(&index, out_dir)?;
    println!("Wrote {} files to {}", written.len(), out_dir.display());
    Ok(())
}

/// Handle the `clear` subcommand
fn handle_clear(dir: &Path, skip_confirm: bool) -> Result<()> {
    let cache = CacheManager::new(dir);

    if !cache.path().exists() {
        println!("No index to clear.");
        return Ok(());
    }

    if !skip_confirm {
        println!("This will delete the index at: {}", cache.path().display());
        print!("Are you sure? [y/N] ");
        use std::io::{self, Write};
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    cache.clear()?;
    println!("Index cleared.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("function").unwrap(), SymbolKind::Function);
        assert_eq!(parse_kind("FILE").unwrap(), SymbolKind::File);
        assert!(parse_kind("widget").is_err());
    }

    #[test]
    fn test_cli_parses_query() {
        let cli = Cli::try_parse_from(["dxs", "-v", "query", "c128lib_a", "--kind", "function", "-n", "5"])
            .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Query { pattern, kind, limit, .. } => {
                assert_eq!(pattern, "c128lib_a");
                assert_eq!(kind.as_deref(), Some("function"));
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_index_requires_paths() {
        assert!(Cli::try_parse_from(["dxs", "index"]).is_err());
    }
}
