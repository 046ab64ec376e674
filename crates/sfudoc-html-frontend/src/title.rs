//! Title page container: centered groups, vertical fills and the signature table.

use markup5ever_rcdom::{Handle, NodeData};
use sfudoc_ir::{is_blank, normalize_inlines, Inline, Loss, TitleBlock, TitlePage};

use crate::dom::{attr, data_type, element_children, has_class, is_centered, tag_name};
use crate::inline::{collect_inlines, inline_node};
use crate::table::collect_rows;

/// Runs of this many underscores are read as a blank signature line.
const SIGNATURE_UNDERSCORES: usize = 3;

pub(crate) fn collect_title_page(handle: &Handle, losses: &mut Vec<Loss>) -> TitlePage {
    let mut blocks = Vec::new();
    collect_title_blocks(handle, &mut blocks, losses);
    TitlePage {
        geometry: attr(handle, "data-geometry").filter(|g| !g.trim().is_empty()),
        blocks,
    }
}

fn collect_title_blocks(handle: &Handle, blocks: &mut Vec<TitleBlock>, losses: &mut Vec<Loss>) {
    let mut loose: Vec<Inline> = Vec::new();
    for child in handle.children.borrow().iter() {
        let Some(tag) = tag_name(child) else {
            if let NodeData::Text { .. } = child.data {
                loose.extend(inline_node(child, losses));
            }
            continue;
        };
        let kind = data_type(child);
        match (tag.as_str(), kind.as_deref()) {
            (_, Some("title-center")) | ("center", _) => {
                flush_loose(blocks, &mut loose);
                push_center_lines(blocks, center_lines(child, losses));
            }
            (_, Some("vspace")) => {
                flush_loose(blocks, &mut loose);
                blocks.push(TitleBlock::VSpace);
            }
            ("div", _) if has_class(child, "title-center") => {
                flush_loose(blocks, &mut loose);
                push_center_lines(blocks, center_lines(child, losses));
            }
            ("table", _) => {
                flush_loose(blocks, &mut loose);
                let rows = collect_rows(child, losses)
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|cell| signature_cell(cell.content))
                            .collect()
                    })
                    .collect::<Vec<Vec<Vec<Inline>>>>();
                if !rows.is_empty() {
                    blocks.push(TitleBlock::Signatures(rows));
                }
            }
            ("p", _) if is_centered(child) => {
                flush_loose(blocks, &mut loose);
                let lines = split_lines(collect_inlines(child, losses));
                push_center_lines(blocks, lines);
            }
            ("p", _) | ("h1", _) | ("h2", _) | ("h3", _) => {
                flush_loose(blocks, &mut loose);
                let inlines = normalize_inlines(collect_inlines(child, losses));
                if !is_blank(&inlines) {
                    blocks.push(TitleBlock::Paragraph(inlines));
                }
            }
            ("div", _) | ("section", _) => {
                flush_loose(blocks, &mut loose);
                collect_title_blocks(child, blocks, losses);
            }
            _ => loose.extend(inline_node(child, losses)),
        }
    }
    flush_loose(blocks, &mut loose);
}

fn flush_loose(blocks: &mut Vec<TitleBlock>, loose: &mut Vec<Inline>) {
    if loose.is_empty() {
        return;
    }
    let inlines = normalize_inlines(std::mem::take(loose));
    if !is_blank(&inlines) {
        blocks.push(TitleBlock::Paragraph(inlines));
    }
}

/// Adjacent centered groups merge into one.
fn push_center_lines(blocks: &mut Vec<TitleBlock>, lines: Vec<Vec<Inline>>) {
    if lines.is_empty() {
        return;
    }
    if let Some(TitleBlock::Center(existing)) = blocks.last_mut() {
        existing.extend(lines);
        return;
    }
    blocks.push(TitleBlock::Center(lines));
}

fn center_lines(handle: &Handle, losses: &mut Vec<Loss>) -> Vec<Vec<Inline>> {
    let elements = element_children(handle);
    let has_paragraphs = elements.iter().any(|(tag, _)| tag == "p");
    if !has_paragraphs {
        let inlines = collect_inlines(handle, losses);
        if is_blank(&inlines) {
            return Vec::new();
        }
        return split_lines(inlines);
    }
    let mut lines = Vec::new();
    for (tag, child) in elements {
        if tag == "p" {
            let inlines = collect_inlines(&child, losses);
            if is_blank(&inlines) && !inlines.iter().any(|i| matches!(i, Inline::LineBreak)) {
                lines.push(Vec::new());
            } else {
                lines.extend(split_lines(inlines));
            }
        }
    }
    lines
}

/// One centered line per `<br>`-separated segment.
fn split_lines(inlines: Vec<Inline>) -> Vec<Vec<Inline>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for inline in inlines {
        if matches!(inline, Inline::LineBreak) {
            lines.push(normalize_inlines(std::mem::take(&mut current)));
        } else {
            current.push(inline);
        }
    }
    lines.push(normalize_inlines(current));
    lines
}

fn signature_cell(cell: Vec<Inline>) -> Vec<Inline> {
    let mut out = Vec::new();
    for inline in cell {
        match inline {
            Inline::Text(text) => split_underscores(&text, &mut out),
            other => out.push(other),
        }
    }
    let out = normalize_inlines(out);
    if is_blank(&out) {
        vec![Inline::SignatureLine]
    } else {
        out
    }
}

fn split_underscores(text: &str, out: &mut Vec<Inline>) {
    let mut buf = String::new();
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == '_' {
            run += 1;
            continue;
        }
        flush_run(&mut buf, &mut run, out);
        buf.push(ch);
    }
    flush_run(&mut buf, &mut run, out);
    if !buf.is_empty() {
        out.push(Inline::Text(buf));
    }
}

fn flush_run(buf: &mut String, run: &mut usize, out: &mut Vec<Inline>) {
    if *run >= SIGNATURE_UNDERSCORES {
        if !buf.is_empty() {
            out.push(Inline::Text(std::mem::take(buf)));
        }
        out.push(Inline::SignatureLine);
    } else {
        buf.extend(std::iter::repeat('_').take(*run));
    }
    *run = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn underscore_runs_become_signature_lines() {
        let cell = signature_cell(vec![Inline::text("______ И.О. Фамилия")]);
        assert_eq!(
            cell,
            vec![Inline::SignatureLine, Inline::text(" И.О. Фамилия")]
        );
    }

    #[test]
    fn short_underscore_runs_are_text() {
        let cell = signature_cell(vec![Inline::text("a_b")]);
        assert_eq!(cell, vec![Inline::text("a_b")]);
    }

    #[test]
    fn empty_cell_is_a_signature_line() {
        assert_eq!(signature_cell(Vec::new()), vec![Inline::SignatureLine]);
    }
}
