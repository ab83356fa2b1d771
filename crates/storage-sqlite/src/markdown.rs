//! Markdown table renderer for export documents.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;

use docsync_core::{DocumentRenderer, ExportTarget, Result, Row};

/// Renders each export as a Markdown document under a fixed output
/// directory, one file per target.
///
/// Output is a pure function of the rows: no timestamps or counters, so
/// re-exporting unchanged data rewrites the file byte for byte.
pub struct MarkdownRenderer {
    out_dir: PathBuf,
}

impl MarkdownRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn render_document(target: &ExportTarget, rows: &[Row]) -> String {
        let mut doc = format!("# {}\n\n", target.table);

        if rows.is_empty() {
            doc.push_str("_No rows._\n");
            return doc;
        }

        // Union of keys across all rows; BTreeSet keeps column order stable
        // when rows carry different key sets.
        let columns: BTreeSet<&str> =
            rows.iter().flat_map(|row| row.keys().map(String::as_str)).collect();

        doc.push('|');
        for column in &columns {
            doc.push_str(&format!(" {} |", escape_cell(column)));
        }
        doc.push_str("\n|");
        for _ in &columns {
            doc.push_str(" --- |");
        }
        doc.push('\n');

        for row in rows {
            doc.push('|');
            for column in &columns {
                let cell = match row.get(*column) {
                    None | Some(serde_json::Value::Null) => String::new(),
                    Some(serde_json::Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                };
                doc.push_str(&format!(" {} |", escape_cell(&cell)));
            }
            doc.push('\n');
        }
        doc
    }
}

/// Pipes would break the table grid and raw newlines would break the row,
/// so both are rewritten inside cells.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>").replace('\r', "")
}

#[async_trait]
impl DocumentRenderer for MarkdownRenderer {
    async fn render(&self, target: &ExportTarget, rows: &[Row]) -> Result<()> {
        let document = Self::render_document(target, rows);
        let path = self.out_dir.join(format!("{}.md", target.document));

        tokio::fs::create_dir_all(&self.out_dir).await?;
        tokio::fs::write(&path, document).await?;
        debug!("[DbMonitor] Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn orders_target() -> ExportTarget {
        ExportTarget::new("Orders", "Order", "orders")
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let doc = MarkdownRenderer::render_document(&orders_target(), &[]);
        assert_eq!(doc, "# Orders\n\n_No rows._\n");
    }

    #[test]
    fn rows_render_as_a_table() {
        let rows = vec![
            row(&[("id", serde_json::json!(1)), ("status", serde_json::json!("open"))]),
            row(&[("id", serde_json::json!(2)), ("status", serde_json::json!("done"))]),
        ];
        let doc = MarkdownRenderer::render_document(&orders_target(), &rows);
        assert!(doc.contains("| id | status |"));
        assert!(doc.contains("| 1 | open |"));
        assert!(doc.contains("| 2 | done |"));
    }

    #[test]
    fn columns_are_the_union_across_rows() {
        let rows = vec![
            row(&[("id", serde_json::json!(1))]),
            row(&[("id", serde_json::json!(2)), ("note", serde_json::json!("late"))]),
        ];
        let doc = MarkdownRenderer::render_document(&orders_target(), &rows);
        assert!(doc.contains("| id | note |"));
        assert!(doc.contains("| 1 |  |"));
        assert!(doc.contains("| 2 | late |"));
    }

    #[test]
    fn cells_escape_pipes_and_newlines() {
        let rows = vec![row(&[("note", serde_json::json!("a|b\nc"))])];
        let doc = MarkdownRenderer::render_document(&orders_target(), &rows);
        assert!(doc.contains("a\\|b<br>c"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let rows = vec![row(&[
            ("b", serde_json::json!(2)),
            ("a", serde_json::json!(1)),
        ])];
        let first = MarkdownRenderer::render_document(&orders_target(), &rows);
        let second = MarkdownRenderer::render_document(&orders_target(), &rows);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn render_writes_the_document_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = MarkdownRenderer::new(dir.path());
        let rows = vec![row(&[("id", serde_json::json!(1))])];

        renderer.render(&orders_target(), &rows).await.expect("render");

        let written = std::fs::read_to_string(dir.path().join("orders.md")).expect("read");
        assert!(written.starts_with("# Orders"));
        assert!(written.contains("| 1 |"));
    }
}
