//! Terminal output formatting for query results
//!
//! Results are grouped by source file, like a compiler listing. Colors are
//! used only when stdout is a terminal and neither `--plain` nor `NO_COLOR`
//! asks otherwise.

use owo_colors::OwoColorize;
use std::io::{self, IsTerminal};

use crate::index::fold;
use crate::models::{MatchType, SearchResult};

/// Output formatter configuration
pub struct OutputFormatter {
    /// Whether to use colors and formatting
    pub use_colors: bool,
}

impl OutputFormatter {
    /// Create a new formatter with automatic TTY detection
    pub fn new(plain: bool) -> Self {
        let is_tty = io::stdout().is_terminal();
        let no_color = std::env::var("NO_COLOR").is_ok();

        Self {
            use_colors: !plain && !no_color && is_tty,
        }
    }

    /// Format and print search results to stdout
    pub fn format_results(&self, results: &[SearchResult], pattern: &str) {
        print!("{}", self.render_results(results, pattern));
    }

    /// Render search results as text
    pub fn render_results(&self, results: &[SearchResult], pattern: &str) -> String {
        if results.is_empty() {
            return "No results found.\n".to_string();
        }

        let mut out = String::new();
        for (file, group) in group_by_file(results) {
            if self.use_colors {
                out.push_str(&format!("{} ({})\n", file.bold().blue(), group.len()));
            } else {
                out.push_str(&format!("{} ({})\n", file, group.len()));
            }

            for result in group {
                out.push_str(&self.render_line(result, pattern));
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    fn render_line(&self, result: &SearchResult, pattern: &str) -> String {
        let marker = match result.match_type {
            MatchType::Prefix => "^",
            MatchType::Substring => "~",
        };
        let name = self.highlight(&result.name, pattern);
        let anchor = if result.anchor_id.is_empty() {
            String::new()
        } else {
            format!(" #{}", result.anchor_id)
        };

        if self.use_colors {
            format!(
                "  {} {} {}{}",
                marker.dimmed(),
                name,
                format!("[{}]", result.kind).cyan(),
                anchor.dimmed()
            )
        } else {
            format!("  {} {} [{}]{}", marker, name, result.kind, anchor)
        }
    }

    /// Emphasize the first case-insensitive occurrence of `pattern` in `name`
    fn highlight(&self, name: &str, pattern: &str) -> String {
        let needle = fold(pattern.trim());
        if !self.use_colors || needle.is_empty() {
            return name.to_string();
        }

        match fold(name).find(&needle) {
            // Names are ASCII, so folded offsets are valid in the original
            Some(start) if name.is_char_boundary(start) && name.is_char_boundary(start + needle.len()) => {
                let end = start + needle.len();
                format!(
                    "{}{}{}",
                    &name[..start],
                    (&name[start..end]).yellow().bold(),
                    &name[end..]
                )
            }
            _ => name.to_string(),
        }
    }
}

/// Group results by source file, keeping the order files first appear in
fn group_by_file(results: &[SearchResult]) -> Vec<(&str, Vec<&SearchResult>)> {
    let mut grouped: Vec<(&str, Vec<&SearchResult>)> = Vec::new();

    for result in results {
        match grouped.iter_mut().find(|(file, _)| *file == result.source_file) {
            Some((_, group)) => group.push(result),
            None => grouped.push((result.source_file.as_str(), vec![result])),
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SymbolKind;

    fn result(name: &str, file: &str, anchor: &str, match_type: MatchType) -> SearchResult {
        SearchResult {
            name: name.to_string(),
            source_file: file.to_string(),
            anchor_id: anchor.to_string(),
            kind: SymbolKind::Function,
            document: None,
            match_type,
        }
    }

    #[test]
    fn test_plain_rendering_groups_by_file() {
        let formatter = OutputFormatter { use_colors: false };
        let results = vec![
            result("CopyFast", "mem.asm", "a91f6", MatchType::Prefix),
            result("Go40", "vdc.asm", "", MatchType::Prefix),
            result("c128lib_CopyFast", "mem.asm", "aad7d", MatchType::Substring),
        ];

        let text = formatter.render_results(&results, "copy");

        assert_eq!(
            text,
            "mem.asm (2)\n  ^ CopyFast [function] #a91f6\n  ~ c128lib_CopyFast [function] #aad7d\n\n\
             vdc.asm (1)\n  ^ Go40 [function]\n\n"
        );
    }

    #[test]
    fn test_empty_results() {
        let formatter = OutputFormatter { use_colors: false };
        assert_eq!(formatter.render_results(&[], "x"), "No results found.\n");
    }

    #[test]
    fn test_highlight_plain_is_identity() {
        let formatter = OutputFormatter { use_colors: false };
        assert_eq!(formatter.highlight("CopyFast", "copy"), "CopyFast");
    }
}
