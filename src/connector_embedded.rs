//! Embedded-list connector (Source A).
//!
//! The page renders its table client-side from a list literal assigned in a
//! script block (`tbldata = [[...], ...];`). The connector cuts the literal
//! out between a start marker and an end marker, strips any markup inside
//! the cells, and parses it. Each row carries extra trailing columns
//! (caffeine per ounce, category); only the first three are kept.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::config::EmbeddedListSourceConfig;
use crate::models::SourceRow;
use crate::traits::Connector;

pub const CACHE_SLOT: &str = "source_a_cache";

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("static tag pattern"))
}

pub struct EmbeddedListConnector {
    config: EmbeddedListSourceConfig,
}

impl EmbeddedListConnector {
    pub fn new(config: EmbeddedListSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for EmbeddedListConnector {
    fn name(&self) -> &str {
        "embedded_list"
    }

    fn description(&self) -> &str {
        "Drink table embedded as a list literal in a page script"
    }

    fn url(&self) -> &str {
        &self.config.url
    }

    fn cache_slot(&self) -> &str {
        CACHE_SLOT
    }

    fn extract(&self, document: &str) -> Result<Vec<SourceRow>> {
        extract_embedded_rows(document, &self.config.start_marker, &self.config.end_marker)
    }
}

/// Extract rows from the list literal found between `start_marker` and
/// `end_marker`.
///
/// The last occurrence of each marker is used, so an early placeholder
/// assignment such as `tbldata = [];` is skipped. The literal starts at the
/// `[` that ends the start marker (or the first `[` after it) and runs to
/// its matching `]`.
pub fn extract_embedded_rows(
    document: &str,
    start_marker: &str,
    end_marker: &str,
) -> Result<Vec<SourceRow>> {
    let marker_at = document
        .rfind(start_marker)
        .with_context(|| format!("start marker '{}' not found", start_marker))?;
    let after_marker = marker_at + start_marker.len();
    let open = if start_marker.ends_with('[') {
        after_marker - 1
    } else {
        document[after_marker..]
            .find('[')
            .map(|i| after_marker + i)
            .context("no list literal after start marker")?
    };
    let end = document[open..]
        .rfind(end_marker)
        .map(|i| open + i)
        .with_context(|| format!("end marker '{}' not found", end_marker))?;

    let bounded = document[open..end].to_lowercase();
    let stripped = tag_pattern().replace_all(&bounded, "");
    let literal = outer_list(&stripped)?;

    let table: Vec<Vec<Value>> =
        serde_json::from_str(literal).context("embedded table is not a list of rows")?;

    let rows: Vec<SourceRow> = table
        .iter()
        .filter_map(|cells| {
            if cells.len() < 3 {
                return None;
            }
            Some(SourceRow::new(
                cell_text(&cells[0])?,
                cell_text(&cells[1])?,
                cell_text(&cells[2])?,
            ))
        })
        .collect();

    if rows.is_empty() {
        bail!("embedded table contains no drink rows");
    }
    Ok(rows)
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.split_whitespace().collect::<Vec<_>>().join(" ")),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Slice `text` (which starts with `[`) up to the bracket closing it,
/// ignoring brackets inside quoted strings.
fn outer_list(text: &str) -> Result<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    bail!("unterminated list literal")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
<script type="text/javascript">var ready = true;</script>
<script type="text/javascript">
var tbldata = [["<a href=\"/5-hour-energy\">5-Hour Energy</a>","1.93","200","103.6","energy shots"],
["Coca-Cola Classic","12","34","2.83","soft drinks"],
["Weird [Bracket] Tea",8,15,"1.9","tea"],
["short row","1"]];

function pause(ms) { return ms; }
</script></head><body></body></html>"#;

    #[test]
    fn test_extracts_first_three_columns() {
        let rows = extract_embedded_rows(PAGE, "tbldata = [", "function pause").unwrap();
        assert_eq!(
            rows,
            vec![
                SourceRow::new("5-hour energy", "1.93", "200"),
                SourceRow::new("coca-cola classic", "12", "34"),
                SourceRow::new("weird [bracket] tea", "8", "15"),
            ]
        );
    }

    #[test]
    fn test_marker_without_bracket() {
        let rows = extract_embedded_rows(PAGE, "var tbldata =", "function pause").unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_missing_markers_are_errors() {
        assert!(extract_embedded_rows(PAGE, "nothing = [", "function pause").is_err());
        assert!(extract_embedded_rows(PAGE, "tbldata = [", "function resume").is_err());
    }

    #[test]
    fn test_unterminated_literal_is_an_error() {
        let page = r#"tbldata = [["coffee","8","95"]  function pause"#;
        assert!(extract_embedded_rows(page, "tbldata = [", "function pause").is_err());
    }

    #[test]
    fn test_placeholder_assignment_is_skipped() {
        let page = r#"<script>var tbldata = [];
function pause(ms) { return ms; }
</script>
<script>tbldata = [["Coffee","8","95"],["Tea","8","47"]];
function pause(ms) { return ms; }
</script>"#;
        let rows = extract_embedded_rows(page, "tbldata = [", "function pause").unwrap();
        assert_eq!(
            rows,
            vec![SourceRow::new("coffee", "8", "95"), SourceRow::new("tea", "8", "47")]
        );
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let page = "tbldata = []; function pause";
        assert!(extract_embedded_rows(page, "tbldata = [", "function pause").is_err());
    }
}
