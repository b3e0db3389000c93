//! # Catalog Parser
//!
//! Flattens the orchestrator's catalog document into rows. The document's
//! shape is not stable: rows may sit at the top level, under one of several
//! container keys, or inside a JSON-encoded string. Parsing is total and
//! returns an empty list for anything it cannot read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Container keys checked, in priority order, when a mapping is not a row.
/// The first key holding an array wins, even an empty one.
pub const NESTED_KEYS: [&str; 4] = ["catalog", "tools", "items", "data"];

/// Tool name a provider reports when it has no usable tools
pub const ERROR_SENTINEL: &str = "__error__";

/// Nesting beyond this depth contributes nothing
pub const MAX_DEPTH: usize = 64;

/// One tool offered by one upstream provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub server: String,
    pub tool_name: String,
    pub tool_title: Option<String>,
    /// The mapping the row was read from
    pub raw: Value,
    pub is_error_sentinel: bool,
}

/// Parse an already-decoded document
pub fn parse_catalog(value: &Value) -> Vec<CatalogEntry> {
    match value {
        Value::String(text) => parse_catalog_text(text),
        _ => {
            let mut rows = Vec::new();
            visit(value, 0, &mut rows);
            rows
        }
    }
}

/// Parse a document that may be absent
pub fn parse_catalog_opt(value: Option<&Value>) -> Vec<CatalogEntry> {
    value.map(parse_catalog).unwrap_or_default()
}

/// Parse a JSON-encoded document; unparseable text yields nothing
pub fn parse_catalog_text(text: &str) -> Vec<CatalogEntry> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => parse_catalog(&value),
        Err(_) => Vec::new(),
    }
}

fn visit(value: &Value, depth: usize, rows: &mut Vec<CatalogEntry>) {
    if depth > MAX_DEPTH {
        tracing::debug!(depth, "Catalog nesting too deep, skipping branch");
        return;
    }

    match value {
        Value::Array(items) => {
            for item in items {
                visit(item, depth + 1, rows);
            }
        }
        Value::Object(map) => {
            if let Some(entry) = read_entry(map) {
                rows.push(entry);
                return;
            }
            if let Some(nested) = NESTED_KEYS
                .iter()
                .find_map(|key| map.get(*key).filter(|v| v.is_array()))
            {
                visit(nested, depth + 1, rows);
            }
        }
        _ => {}
    }
}

fn read_entry(map: &Map<String, Value>) -> Option<CatalogEntry> {
    let server = map.get("server")?.as_str()?;
    let tool = map.get("tool")?.as_object()?;
    let name = tool.get("name")?.as_str()?;

    Some(CatalogEntry {
        server: server.to_string(),
        tool_name: name.to_string(),
        tool_title: tool.get("title").and_then(Value::as_str).map(str::to_string),
        raw: Value::Object(map.clone()),
        is_error_sentinel: name == ERROR_SENTINEL,
    })
}

/// Rows belonging to one provider
pub fn entries_for_server<'a>(entries: &'a [CatalogEntry], server: &str) -> Vec<&'a CatalogEntry> {
    entries.iter().filter(|e| e.server == server).collect()
}

/// A provider's rows minus the error sentinel
pub fn usable_tools<'a>(entries: &'a [CatalogEntry], server: &str) -> Vec<&'a CatalogEntry> {
    entries
        .iter()
        .filter(|e| e.server == server && !e.is_error_sentinel)
        .collect()
}

/// Whether any provider reported the error sentinel
pub fn has_sentinel(entries: &[CatalogEntry]) -> bool {
    entries.iter().any(|e| e.is_error_sentinel)
}
