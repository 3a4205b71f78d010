//! Fixed-width rendering of `<table>` subtrees into fenced text blocks.

use crate::dom::{collapse_whitespace, replace_elements, Element, Node, Tag};
use crate::pass::TreePass;

/// Marker that opens and closes a preformatted span.
pub const FENCE: &str = "```";
/// Widest a column may get; longer cells are shortened.
pub const MAX_COLUMN_WIDTH: usize = 25;
const TRUNCATED_WIDTH: usize = 22;
const ELLIPSIS: &str = "...";

#[derive(Debug, Default, Clone, Copy)]
pub struct TableRenderer;

impl TreePass for TableRenderer {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        replace_elements(nodes, &Tag::Table, &mut |table: Element| {
            let rows = collect_rows(&table);
            match render_rows(&rows) {
                Some(text) => vec![Node::Text(text)],
                None => Vec::new(),
            }
        })
    }
}

/// Every descendant row with at least one cell, as trimmed cell texts.
pub fn collect_rows(table: &Element) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    visit_rows(&table.children, &mut rows);
    rows
}

fn visit_rows(nodes: &[Node], rows: &mut Vec<Vec<String>>) {
    for element in nodes.iter().filter_map(Node::as_element) {
        if element.tag == Tag::TableRow {
            let mut cells = Vec::new();
            visit_cells(&element.children, &mut cells);
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
        visit_rows(&element.children, rows);
    }
}

fn visit_cells(nodes: &[Node], cells: &mut Vec<String>) {
    for element in nodes.iter().filter_map(Node::as_element) {
        if matches!(element.tag, Tag::TableCell | Tag::TableHeaderCell) {
            cells.push(collapse_whitespace(&element.text_content()));
        }
        visit_cells(&element.children, cells);
    }
}

/// Lay rows out as a fenced block. The first row is treated as the header
/// and gets a dashed separator when more rows follow. `None` for no rows.
pub fn render_rows(rows: &[Vec<String>]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(index) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }
    let widths: Vec<usize> = widths
        .into_iter()
        .map(|w| w.min(MAX_COLUMN_WIDTH))
        .collect();

    let mut out = format!("\n{FENCE}\n");
    for (row_index, row) in rows.iter().enumerate() {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", fit_cell(cell)))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&line);
        out.push('\n');

        if row_index == 0 && rows.len() > 1 {
            let separator = widths
                .iter()
                .map(|&width| "-".repeat(width))
                .collect::<Vec<_>>()
                .join("-+-");
            out.push_str(&separator);
            out.push('\n');
        }
    }
    out.push_str(FENCE);
    out.push('\n');
    Some(out)
}

fn fit_cell(cell: &str) -> String {
    if cell.chars().count() > MAX_COLUMN_WIDTH {
        let mut short: String = cell.chars().take(TRUNCATED_WIDTH).collect();
        short.push_str(ELLIPSIS);
        short
    } else {
        cell.to_string()
    }
}
