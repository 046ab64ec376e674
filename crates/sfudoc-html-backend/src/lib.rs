//! IR to editor HTML backend.
//!
//! The markup mirrors what the editor's custom nodes parse: figures with a
//! `figcaption`, page breaks and vertical fills as `data-type` divs, and the title
//! page as a single container so the editor treats it as one atomic node.

use sfudoc_ir::{Block, Document, Figure, Inline, ListKind, Table, TitleBlock, TitlePage};

/// Label shown inside a page-break node.
pub const PAGE_BREAK_LABEL: &str = "Разрыв страницы (\\newpage)";

/// Text shown for a blank signature line.
pub const SIGNATURE_PLACEHOLDER: &str = "____________________";

#[derive(Debug, Clone, Default)]
pub struct HtmlRenderOptions {
    /// Put each top-level block on its own line.
    pub pretty: bool,
}

pub fn render_document(doc: &Document, options: &HtmlRenderOptions) -> String {
    let mut chunks: Vec<String> = Vec::new();
    if let Some(title_page) = &doc.title_page {
        chunks.push(render_title_page(title_page));
    }
    for block in &doc.blocks {
        let chunk = render_block(block);
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
    }
    let separator = if options.pretty { "\n" } else { "" };
    chunks.join(separator)
}

pub fn render_block(block: &Block) -> String {
    match block {
        Block::Paragraph(inlines) => format!("<p>{}</p>", render_inlines(inlines)),
        Block::Heading { level, content } => {
            let level = (*level).clamp(1, 3);
            format!("<h{0}>{1}</h{0}>", level, render_inlines(content))
        }
        Block::List { kind, items } => {
            let tag = match kind {
                ListKind::Unordered => "ul",
                ListKind::Ordered => "ol",
            };
            let mut out = format!("<{}>", tag);
            for item in items {
                out.push_str("<li>");
                for block in item {
                    out.push_str(&render_block(block));
                }
                out.push_str("</li>");
            }
            out.push_str(&format!("</{}>", tag));
            out
        }
        Block::Table(table) => render_table(table),
        Block::Figure(figure) => render_figure(figure),
        Block::PageBreak => format!(
            "<div data-type=\"page-break\" class=\"page-break\"><span>{}</span></div>",
            escape_text(PAGE_BREAK_LABEL)
        ),
        Block::VSpace => "<div data-type=\"vspace\" class=\"vspace\"></div>".to_string(),
    }
}

fn render_table(table: &Table) -> String {
    if table.rows.is_empty() {
        return String::new();
    }
    let mut out = String::from("<table><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            let tag = if cell.is_header { "th" } else { "td" };
            out.push_str(&format!(
                "<{0}><p>{1}</p></{0}>",
                tag,
                render_inlines(&cell.content)
            ));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

fn render_figure(figure: &Figure) -> String {
    format!(
        "<figure class=\"custom-figure\"><img src=\"{}\" alt=\"{}\"><figcaption class=\"figure-caption\">{}</figcaption></figure>",
        escape_attr(&figure.image.src),
        escape_attr(&figure.caption),
        escape_text(&figure.caption)
    )
}

pub fn render_title_page(title_page: &TitlePage) -> String {
    let mut out = String::from("<div data-type=\"title-page\" class=\"title-page\"");
    if let Some(geometry) = &title_page.geometry {
        out.push_str(&format!(" data-geometry=\"{}\"", escape_attr(geometry)));
    }
    out.push('>');
    for block in &title_page.blocks {
        match block {
            TitleBlock::Center(lines) => {
                out.push_str("<div data-type=\"title-center\" class=\"title-center\">");
                for line in lines {
                    out.push_str(&format!("<p>{}</p>", render_inlines(line)));
                }
                out.push_str("</div>");
            }
            TitleBlock::Signatures(rows) => {
                out.push_str("<table data-type=\"signature-table\" class=\"signature-table\"><tbody>");
                for row in rows {
                    out.push_str("<tr>");
                    for cell in row {
                        out.push_str(&format!("<td>{}</td>", render_inlines(cell)));
                    }
                    out.push_str("</tr>");
                }
                out.push_str("</tbody></table>");
            }
            TitleBlock::VSpace => {
                out.push_str("<div data-type=\"vspace\" class=\"vspace\"></div>");
            }
            TitleBlock::Paragraph(inlines) => {
                out.push_str(&format!("<p>{}</p>", render_inlines(inlines)));
            }
        }
    }
    out.push_str("</div>");
    out
}

pub fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_text(text)),
            Inline::Strong(content) => {
                out.push_str("<strong>");
                out.push_str(&render_inlines(content));
                out.push_str("</strong>");
            }
            Inline::Emph(content) => {
                out.push_str("<em>");
                out.push_str(&render_inlines(content));
                out.push_str("</em>");
            }
            Inline::Underline(content) => {
                out.push_str("<u>");
                out.push_str(&render_inlines(content));
                out.push_str("</u>");
            }
            Inline::LineBreak => out.push_str("<br>"),
            Inline::SignatureLine => out.push_str(&format!(
                "<span data-type=\"signature-line\" class=\"signature-line\">{}</span>",
                SIGNATURE_PLACEHOLDER
            )),
            Inline::RawLatex(raw) => {
                out.push_str("<code data-type=\"latex\">");
                out.push_str(&escape_text(raw));
                out.push_str("</code>");
            }
        }
    }
    out
}

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraph_with_formatting() {
        let block = Block::Paragraph(vec![
            Inline::text("Hello "),
            Inline::Strong(vec![Inline::text("world")]),
            Inline::LineBreak,
            Inline::Emph(vec![Inline::text("a < b")]),
        ]);
        assert_eq!(
            render_block(&block),
            "<p>Hello <strong>world</strong><br><em>a &lt; b</em></p>"
        );
    }

    #[test]
    fn page_break_is_not_wrapped() {
        let doc = Document::new(vec![Block::PageBreak]);
        let out = render_document(&doc, &HtmlRenderOptions::default());
        assert!(out.starts_with("<div data-type=\"page-break\""));
        assert!(!out.contains("<p>"));
    }

    #[test]
    fn raw_latex_is_escaped_inside_code() {
        let out = render_inlines(&[Inline::RawLatex("$a<b$".to_string())]);
        assert_eq!(out, "<code data-type=\"latex\">$a&lt;b$</code>");
    }

    #[test]
    fn figure_attributes_are_quoted() {
        let figure = Figure {
            image: sfudoc_ir::Image::new("data:image/png;base64,AAA="),
            caption: "Схема \"А\"".to_string(),
        };
        let out = render_figure(&figure);
        assert!(out.contains("src=\"data:image/png;base64,AAA=\""));
        assert!(out.contains("alt=\"Схема &quot;А&quot;\""));
    }

    #[test]
    fn pretty_output_separates_blocks() {
        let doc = Document::new(vec![
            Block::Heading {
                level: 1,
                content: vec![Inline::text("A")],
            },
            Block::Paragraph(vec![Inline::text("b")]),
        ]);
        let out = render_document(&doc, &HtmlRenderOptions { pretty: true });
        assert_eq!(out, "<h1>A</h1>\n<p>b</p>");
    }
}
