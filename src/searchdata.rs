//! Doxygen `searchData` payloads
//!
//! Doxygen's HTML output ships one script per (partition, first letter) pair,
//! e.g. `search/functions_2.js`:
//!
//! ```text
//! var searchData=
//! [
//!   ['c128lib_5fadd16_0',['c128lib_Add16',['../math-global_8asm.html#a1078...',1,'math-global.asm']]],
//!   ['cia_2easm_46',['cia.asm',['../cia_8asm.html',1,'']]]
//! ];
//! ```
//!
//! Each element is `[key, [display_name, target, target, ...]]` and every
//! target is `[url, flag, scope]`. The array literal is valid JSON5, so it is
//! parsed with `json5` and then walked as a `serde_json::Value`.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::models::{SymbolEntry, SymbolKind};

/// Split a payload file name such as `functions_2.js` into (`functions`, 2)
pub fn split_payload_name(path: &Path) -> Option<(String, usize)> {
    if path.extension().and_then(|e| e.to_str()) != Some("js") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (partition, ordinal) = stem.rsplit_once('_')?;
    if partition.is_empty() || !partition.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    let ordinal = ordinal.parse().ok()?;
    Some((partition.to_string(), ordinal))
}

/// Parse a `searchData` payload from the given partition into symbol records
pub fn parse(content: &str, partition: &str) -> Result<Vec<SymbolEntry>> {
    let start = content
        .find('[')
        .context("searchData payload has no opening '['")?;
    let end = content
        .rfind(']')
        .context("searchData payload has no closing ']'")?;
    if end < start {
        anyhow::bail!("searchData payload brackets are unbalanced");
    }

    let value: Value = json5::from_str(&content[start..=end])
        .context("Failed to parse searchData array")?;
    let items = value
        .as_array()
        .context("searchData is not an array")?;

    let partition_kind = SymbolKind::from_partition(partition);
    let mut entries = Vec::new();

    for (i, item) in items.iter().enumerate() {
        let body = item
            .get(1)
            .and_then(Value::as_array)
            .with_context(|| format!("searchData item {} has no body", i))?;
        let name = body
            .first()
            .and_then(Value::as_str)
            .with_context(|| format!("searchData item {} has no display name", i))?;
        let name = unescape_html(name);

        let targets: Vec<&Vec<Value>> = body[1..].iter().filter_map(Value::as_array).collect();
        if targets.is_empty() {
            log::debug!("searchData item '{}' has no targets, skipping", name);
            continue;
        }

        for target in targets {
            let url = target.first().and_then(Value::as_str).unwrap_or_default();
            let scope = target.get(2).and_then(Value::as_str).unwrap_or_default();

            let (document, anchor) = match url.split_once('#') {
                Some((doc, anchor)) => (doc, anchor),
                None => (url, ""),
            };

            let kind = partition_kind
                .clone()
                .unwrap_or_else(|| infer_kind(&name, anchor));

            // Whole-page targets have no scope; the page defines itself
            let source_file = if scope.is_empty() {
                name.clone()
            } else {
                unescape_html(scope)
            };

            let mut entry = SymbolEntry::new(name.clone(), source_file, anchor, kind);
            if !document.is_empty() {
                entry = entry.with_document(document);
            }
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Kind of an entry from the `all` partition, which carries no kind of its own
fn infer_kind(name: &str, anchor: &str) -> SymbolKind {
    if !anchor.is_empty() {
        SymbolKind::Function
    } else if Path::new(name).extension().is_some() {
        SymbolKind::File
    } else {
        SymbolKind::Page
    }
}

fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Doxygen search key: lowercase alphanumerics, everything else as `_<hex>`
pub fn search_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() {
            key.push(byte.to_ascii_lowercase() as char);
        } else {
            let _ = write!(key, "_{:02x}", byte);
        }
    }
    key
}

/// Doxygen's page name for a source file (`math-global.asm` → `math-global_8asm.html`)
pub fn page_for_source(source_file: &str) -> String {
    let mut page = String::with_capacity(source_file.len() + 8);
    for c in source_file.chars() {
        match c {
            '_' => page.push_str("__"),
            '.' => page.push_str("_8"),
            other => page.push(other),
        }
    }
    page.push_str(".html");
    page
}

fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

fn target_url(entry: &SymbolEntry) -> String {
    entry.href().unwrap_or_else(|| {
        let page = format!("../{}", page_for_source(&entry.source_file));
        if entry.anchor_id.is_empty() {
            page
        } else {
            format!("{}#{}", page, entry.anchor_id)
        }
    })
}

/// Scope of a target; left empty when the entry is its own source, as
/// Doxygen does for files and pages
fn target_scope(entry: &SymbolEntry) -> &str {
    if entry.source_file == entry.name {
        ""
    } else {
        &entry.source_file
    }
}

/// Render entries (already in index order) as a `searchData` payload
///
/// Entries sharing a display name become targets of a single item.
pub fn render<'a>(entries: impl IntoIterator<Item = &'a SymbolEntry>) -> String {
    let mut groups: Vec<(&str, Vec<&SymbolEntry>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        match positions.get(entry.name.as_str()) {
            Some(&i) => groups[i].1.push(entry),
            None => {
                positions.insert(entry.name.as_str(), groups.len());
                groups.push((entry.name.as_str(), vec![entry]));
            }
        }
    }

    let mut out = String::from("var searchData=\n[\n");
    for (i, (name, targets)) in groups.iter().enumerate() {
        let rendered: Vec<String> = targets
            .iter()
            .map(|t| format!("[{},1,{}]", js_string(&target_url(t)), js_string(target_scope(t))))
            .collect();
        let _ = write!(
            out,
            "  [{},[{},{}]]",
            js_string(&format!("{}_{}", search_key(name), i)),
            js_string(name),
            rendered.join(",")
        );
        out.push_str(if i + 1 < groups.len() { ",\n" } else { "\n" });
    }
    out.push_str("];\n");
    out
}

/// One section of the search box: partition name, label and present letters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub label: String,
    pub letters: String,
}

/// Render `searchdata.js`, the section table the search box loads first
pub fn render_sections(sections: &[Section]) -> String {
    let table = |title: &str, field: fn(&Section) -> &str| {
        let rows: Vec<String> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| format!("  {}: \"{}\"", i, field(s)))
            .collect();
        format!("var {} =\n{{\n{}\n}};\n", title, rows.join(",\n"))
    };

    [
        table("indexSectionsWithContent", |s| s.letters.as_str()),
        table("indexSectionNames", |s| s.name.as_str()),
        table("indexSectionLabels", |s| s.label.as_str()),
    ]
    .join("\n")
}
