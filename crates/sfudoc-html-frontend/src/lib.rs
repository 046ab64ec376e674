//! Editor HTML to IR frontend.
//!
//! The input is whatever the rich-text editor serialized: paragraph-wrapped list items
//! and table cells, `&nbsp;` entities, custom `data-type` nodes for page breaks and the
//! title page. html5ever builds a spec-conformant DOM first, so unclosed or misnested
//! tags are repaired before any of the rules below see them.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use sfudoc_ir::{
    is_blank, normalize_inlines, plain_text, Block, Document, Figure, Image, Inline, ListKind,
    Loss, TitlePage,
};

mod dom;
mod inline;
mod table;
mod title;

use dom::{attr, data_type, element_children, find_element, tag_name, text_content};
use inline::{collect_inlines, inline_node, is_inline_tag};

pub fn html_to_ir(input: &str) -> Document {
    let dom = parse_document(RcDom::default(), Default::default()).one(input);
    let root = find_element(&dom.document, "body").unwrap_or_else(|| dom.document.clone());

    let mut ctx = Context::default();
    let blocks = collect_blocks(&root, &mut ctx);
    let mut doc = Document::with_losses(blocks, ctx.losses);
    if let Some(title_page) = ctx.title_page {
        doc = doc.with_title_page(title_page);
    }
    tracing::debug!(
        blocks = doc.blocks.len(),
        title_page = doc.title_page.is_some(),
        losses = doc.losses.len(),
        "html frontend done"
    );
    doc
}

#[derive(Default)]
struct Context {
    losses: Vec<Loss>,
    title_page: Option<TitlePage>,
}

fn collect_blocks(handle: &Handle, ctx: &mut Context) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current_inline: Vec<Inline> = Vec::new();
    for child in handle.children.borrow().iter() {
        visit_node(child, ctx, &mut blocks, &mut current_inline);
    }
    flush_paragraph(&mut blocks, &mut current_inline);
    blocks
}

fn flush_paragraph(blocks: &mut Vec<Block>, current_inline: &mut Vec<Inline>) {
    if current_inline.is_empty() {
        return;
    }
    let inlines = normalize_inlines(std::mem::take(current_inline));
    if !is_blank(&inlines) {
        blocks.push(Block::Paragraph(inlines));
    }
}

fn visit_node(
    child: &Handle,
    ctx: &mut Context,
    blocks: &mut Vec<Block>,
    current_inline: &mut Vec<Inline>,
) {
    let tag = match &child.data {
        NodeData::Text { .. } => {
            current_inline.extend(inline_node(child, &mut ctx.losses));
            return;
        }
        NodeData::Element { .. } => tag_name(child).unwrap_or_default(),
        _ => return,
    };

    match tag.as_str() {
        "head" | "script" | "style" | "title" | "meta" | "link" | "template" | "colgroup" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            flush_paragraph(blocks, current_inline);
            let level = tag[1..].parse::<u8>().unwrap_or(1).min(3);
            let content = normalize_inlines(collect_inlines(child, &mut ctx.losses));
            if !is_blank(&content) {
                blocks.push(Block::Heading { level, content });
            }
        }
        "p" => {
            flush_paragraph(blocks, current_inline);
            for grandchild in child.children.borrow().iter() {
                if tag_name(grandchild).as_deref() == Some("img") {
                    flush_paragraph(blocks, current_inline);
                    blocks.push(bare_image(grandchild));
                } else {
                    current_inline.extend(inline_node(grandchild, &mut ctx.losses));
                }
            }
            flush_paragraph(blocks, current_inline);
        }
        "ul" | "ol" => {
            flush_paragraph(blocks, current_inline);
            let kind = if tag == "ol" {
                ListKind::Ordered
            } else {
                ListKind::Unordered
            };
            let items: Vec<Vec<Block>> = element_children(child)
                .into_iter()
                .filter(|(item_tag, _)| item_tag == "li")
                .map(|(_, item)| collect_blocks(&item, ctx))
                .collect();
            if !items.is_empty() {
                blocks.push(Block::List { kind, items });
            }
        }
        "table" => {
            flush_paragraph(blocks, current_inline);
            if let Some(table) = table::collect_table(child, &mut ctx.losses) {
                blocks.push(Block::Table(table));
            }
        }
        "figure" => {
            flush_paragraph(blocks, current_inline);
            collect_figure(child, ctx, blocks);
        }
        "img" => {
            flush_paragraph(blocks, current_inline);
            blocks.push(bare_image(child));
        }
        "pre" => {
            flush_paragraph(blocks, current_inline);
            let raw = text_content(child);
            if !raw.trim().is_empty() {
                blocks.push(Block::Paragraph(vec![Inline::RawLatex(raw)]));
            }
        }
        "br" => current_inline.push(Inline::LineBreak),
        "div" => {
            flush_paragraph(blocks, current_inline);
            match data_type(child).as_deref() {
                Some("page-break") => blocks.push(Block::PageBreak),
                Some("vspace") => blocks.push(Block::VSpace),
                Some("title-page") => collect_title_page(child, ctx, blocks),
                _ => blocks.extend(collect_blocks(child, ctx)),
            }
        }
        "html" | "body" | "section" | "article" | "main" | "header" | "footer" | "aside"
        | "nav" | "center" | "blockquote" | "form" => {
            flush_paragraph(blocks, current_inline);
            blocks.extend(collect_blocks(child, ctx));
        }
        _ if is_inline_tag(&tag) => current_inline.extend(inline_node(child, &mut ctx.losses)),
        _ => {
            ctx.losses.push(Loss::new(
                "unsupported-tag",
                format!("<{}> has no document node; its content is kept", tag),
            ));
            current_inline.extend(collect_inlines(child, &mut ctx.losses));
        }
    }
}

fn collect_title_page(handle: &Handle, ctx: &mut Context, blocks: &mut Vec<Block>) {
    if ctx.title_page.is_none() {
        ctx.title_page = Some(title::collect_title_page(handle, &mut ctx.losses));
        return;
    }
    ctx.losses.push(Loss::new(
        "duplicate-title-page",
        "only the first title page is kept; later ones are flattened into the body",
    ));
    blocks.extend(collect_blocks(handle, ctx));
}

fn collect_figure(handle: &Handle, ctx: &mut Context, blocks: &mut Vec<Block>) {
    let caption = find_element(handle, "figcaption")
        .map(|caption| plain_text(&collect_inlines(&caption, &mut ctx.losses)))
        .unwrap_or_default();
    match find_element(handle, "img") {
        Some(img) => blocks.push(Block::Figure(Figure {
            image: Image::new(attr(&img, "src").unwrap_or_default()),
            caption,
        })),
        None => {
            ctx.losses.push(Loss::new(
                "figure-without-image",
                "figure has no <img>; only its caption is kept",
            ));
            if !caption.is_empty() {
                blocks.push(Block::Paragraph(vec![Inline::Text(caption)]));
            }
        }
    }
}

fn bare_image(img: &Handle) -> Block {
    Block::Figure(Figure {
        image: Image::new(attr(img, "src").unwrap_or_default()),
        caption: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sfudoc_ir::TitleBlock;

    #[test]
    fn paragraph_wrapped_list_items_are_unwrapped() {
        let doc = html_to_ir("<ul><li><p>one</p></li><li><p>two</p></li></ul>");
        assert_eq!(
            doc.blocks,
            vec![Block::List {
                kind: ListKind::Unordered,
                items: vec![
                    vec![Block::Paragraph(vec![Inline::text("one")])],
                    vec![Block::Paragraph(vec![Inline::text("two")])],
                ],
            }]
        );
    }

    #[test]
    fn deep_headings_clamp_to_level_three() {
        let doc = html_to_ir("<h5>Deep</h5>");
        assert_eq!(
            doc.blocks,
            vec![Block::Heading {
                level: 3,
                content: vec![Inline::text("Deep")],
            }]
        );
    }

    #[test]
    fn nbsp_survives_as_non_breaking_space() {
        let doc = html_to_ir("<p>1&nbsp;кг</p>");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![Inline::text("1\u{a0}кг")])]
        );
    }

    #[test]
    fn empty_paragraphs_are_dropped() {
        let doc = html_to_ir("<p></p><p>  </p><p>x</p>");
        assert_eq!(doc.blocks, vec![Block::Paragraph(vec![Inline::text("x")])]);
    }

    #[test]
    fn self_closing_break_is_a_line_break() {
        let doc = html_to_ir("<p>a<br/>b</p>");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::text("a"),
                Inline::LineBreak,
                Inline::text("b"),
            ])]
        );
    }

    #[test]
    fn second_title_page_is_flattened() {
        let html = concat!(
            r#"<div data-type="title-page"><div data-type="title-center"><p>A</p></div></div>"#,
            r#"<div data-type="title-page"><p>B</p></div>"#,
        );
        let doc = html_to_ir(html);
        assert_eq!(
            doc.title_page.map(|t| t.blocks),
            Some(vec![TitleBlock::Center(vec![vec![Inline::text("A")]])])
        );
        assert_eq!(doc.blocks, vec![Block::Paragraph(vec![Inline::text("B")])]);
        assert!(doc.losses.iter().any(|l| l.kind == "duplicate-title-page"));
    }

    #[test]
    fn figure_without_image_keeps_caption() {
        let doc = html_to_ir("<figure><figcaption>Схема</figcaption></figure>");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![Inline::text("Схема")])]
        );
        assert!(doc.losses.iter().any(|l| l.kind == "figure-without-image"));
    }

    #[test]
    fn latex_code_span_is_raw() {
        let doc = html_to_ir(r#"<p>see <code data-type="latex">\cite{knuth}</code></p>"#);
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::text("see "),
                Inline::RawLatex("\\cite{knuth}".to_string()),
            ])]
        );
    }
}
