//! Tables: rows from `thead`/`tbody`/`tfoot` or directly under `table`.

use markup5ever_rcdom::Handle;
use sfudoc_ir::{normalize_inlines, Inline, Loss, Table, TableCell, TableRow};

use crate::dom::{attr, element_children};
use crate::inline::{collect_inlines, inline_node};

pub(crate) fn collect_table(handle: &Handle, losses: &mut Vec<Loss>) -> Option<Table> {
    let rows: Vec<TableRow> = collect_rows(handle, losses)
        .into_iter()
        .map(|cells| TableRow { cells })
        .collect();
    if rows.is_empty() {
        losses.push(Loss::new("empty-table", "table without rows dropped"));
        return None;
    }
    let table = Table::from_rows(rows);
    let ragged = table.ragged_rows();
    if ragged > 0 {
        losses.push(Loss::new(
            "ragged-row",
            format!(
                "{} row(s) differ from the first row's {} cells and pass through positionally",
                ragged, table.columns
            ),
        ));
    }
    Some(table)
}

pub(crate) fn collect_rows(handle: &Handle, losses: &mut Vec<Loss>) -> Vec<Vec<TableCell>> {
    let mut rows = Vec::new();
    for (tag, child) in element_children(handle) {
        match tag.as_str() {
            "thead" | "tbody" | "tfoot" => {
                for (row_tag, row) in element_children(&child) {
                    if row_tag == "tr" {
                        rows.push(collect_cells(&row, losses));
                    }
                }
            }
            "tr" => rows.push(collect_cells(&child, losses)),
            "caption" => losses.push(Loss::new("table-caption", "table caption dropped")),
            _ => {}
        }
    }
    rows
}

fn collect_cells(row: &Handle, losses: &mut Vec<Loss>) -> Vec<TableCell> {
    let mut cells = Vec::new();
    for (tag, cell) in element_children(row) {
        if tag != "td" && tag != "th" {
            continue;
        }
        let span = |key: &str| {
            attr(&cell, key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(1)
        };
        if span("colspan") > 1 || span("rowspan") > 1 {
            losses.push(Loss::new(
                "cell-span",
                "colspan/rowspan ignored; the cell is emitted as a single cell",
            ));
        }
        cells.push(TableCell {
            content: cell_inlines(&cell, losses),
            is_header: tag == "th",
        });
    }
    cells
}

/// Paragraph wrappers inside a cell collapse into line-separated inline content.
fn cell_inlines(cell: &Handle, losses: &mut Vec<Loss>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::new();
    let mut pending_break = false;
    for child in cell.children.borrow().iter() {
        let tag = crate::dom::tag_name(child);
        let is_paragraph = matches!(tag.as_deref(), Some("p") | Some("div"));
        if is_paragraph {
            let inlines = normalize_inlines(collect_inlines(child, losses));
            if inlines.is_empty() {
                continue;
            }
            if pending_break || !out.is_empty() {
                out.push(Inline::LineBreak);
            }
            out.extend(inlines);
            pending_break = true;
        } else {
            let inlines = inline_node(child, losses);
            if pending_break && !sfudoc_ir::is_blank(&inlines) {
                out.push(Inline::LineBreak);
                pending_break = false;
            }
            out.extend(inlines);
        }
    }
    normalize_inlines(out)
}
