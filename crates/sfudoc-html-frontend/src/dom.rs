//! Small accessors over the rcdom tree.

use markup5ever_rcdom::{Handle, NodeData};

pub(crate) fn tag_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

pub(crate) fn attr(handle: &Handle, key: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == key)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// The `data-type` attribute the editor's custom nodes are keyed on.
pub(crate) fn data_type(handle: &Handle) -> Option<String> {
    attr(handle, "data-type")
}

pub(crate) fn has_class(handle: &Handle, class: &str) -> bool {
    attr(handle, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub(crate) fn is_centered(handle: &Handle) -> bool {
    attr(handle, "style")
        .map(|style| {
            let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            compact.contains("text-align:center")
        })
        .unwrap_or(false)
}

pub(crate) fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    push_text(handle, &mut out);
    out
}

fn push_text(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                push_text(child, out);
            }
        }
    }
}

pub(crate) fn element_children(handle: &Handle) -> Vec<(String, Handle)> {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(|child| tag_name(child).map(|tag| (tag, child.clone())))
        .collect()
}

/// Depth-first search for the first element with the given tag.
pub(crate) fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if tag_name(child).as_deref() == Some(tag) {
            return Some(child.clone());
        }
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}
