//! Inline content: text runs and formatting spans.

use markup5ever_rcdom::{Handle, NodeData};
use sfudoc_ir::{Inline, Loss};

use crate::dom::{attr, data_type, tag_name, text_content};

/// Collect the inline content of all children of `handle`.
pub(crate) fn collect_inlines(handle: &Handle, losses: &mut Vec<Loss>) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in handle.children.borrow().iter() {
        out.extend(inline_node(child, losses));
    }
    out
}

pub(crate) fn inline_node(handle: &Handle, losses: &mut Vec<Loss>) -> Vec<Inline> {
    match &handle.data {
        NodeData::Text { contents } => vec![Inline::text(contents.borrow().to_string())],
        NodeData::Element { .. } => {
            let tag = tag_name(handle).unwrap_or_default();
            inline_element(&tag, handle, losses)
        }
        _ => Vec::new(),
    }
}

fn inline_element(tag: &str, handle: &Handle, losses: &mut Vec<Loss>) -> Vec<Inline> {
    match tag {
        "strong" | "b" => vec![Inline::Strong(collect_inlines(handle, losses))],
        "em" | "i" => vec![Inline::Emph(collect_inlines(handle, losses))],
        "u" => vec![Inline::Underline(collect_inlines(handle, losses))],
        "br" => vec![Inline::LineBreak],
        "span" if data_type(handle).as_deref() == Some("signature-line") => {
            vec![Inline::SignatureLine]
        }
        "code" if data_type(handle).as_deref() == Some("latex") => {
            vec![Inline::RawLatex(text_content(handle))]
        }
        "script" | "style" => Vec::new(),
        "img" => {
            let src = attr(handle, "src").unwrap_or_default();
            losses.push(Loss::new(
                "inline-image",
                format!(
                    "image inside inline formatting dropped ({} bytes of source)",
                    src.len()
                ),
            ));
            Vec::new()
        }
        "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            // Block content in an inline position keeps its line structure.
            let mut out = collect_inlines(handle, losses);
            out.push(Inline::LineBreak);
            out
        }
        "s" | "strike" | "del" | "sub" | "sup" | "mark" => {
            losses.push(Loss::new(
                "unsupported-inline",
                format!("<{}> formatting dropped", tag),
            ));
            collect_inlines(handle, losses)
        }
        _ => collect_inlines(handle, losses),
    }
}

/// Inline tags that continue the current paragraph at block level.
pub(crate) fn is_inline_tag(tag: &str) -> bool {
    matches!(
        tag,
        "strong"
            | "b"
            | "em"
            | "i"
            | "u"
            | "span"
            | "a"
            | "code"
            | "s"
            | "strike"
            | "del"
            | "sub"
            | "sup"
            | "mark"
            | "small"
            | "label"
            | "abbr"
            | "font"
    )
}
