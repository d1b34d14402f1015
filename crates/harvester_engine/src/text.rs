use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

/// Interactive and control elements whose text is never content.
pub(crate) const CONTROL_TAGS: &[&str] = &["script", "style", "button", "input", "select"];

pub(crate) fn is_control(el: ElementRef<'_>) -> bool {
    CONTROL_TAGS.contains(&el.value().name())
}

pub(crate) fn has_tag(el: ElementRef<'_>, tags: &[&str]) -> bool {
    tags.contains(&el.value().name())
}

/// Trimmed, non-empty text fragments below `node` in document order,
/// skipping every element (and its subtree) for which `exclude` is true.
pub(crate) fn text_fragments(
    node: NodeRef<'_, Node>,
    exclude: &dyn Fn(ElementRef<'_>) -> bool,
) -> Vec<String> {
    let mut out = Vec::new();
    collect(node, exclude, &mut out);
    out
}

fn collect(node: NodeRef<'_, Node>, exclude: &dyn Fn(ElementRef<'_>) -> bool, out: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if ElementRef::wrap(child).is_some_and(|el| exclude(el)) {
                    continue;
                }
                collect(child, exclude, out);
            }
            _ => {}
        }
    }
}

/// Fragments glued without separator, like a stripped inline text run.
pub(crate) fn inline_text(el: ElementRef<'_>, exclude: &dyn Fn(ElementRef<'_>) -> bool) -> String {
    text_fragments(*el, exclude).concat()
}

/// One fragment per line.
pub(crate) fn line_text(el: ElementRef<'_>, exclude: &dyn Fn(ElementRef<'_>) -> bool) -> String {
    text_fragments(*el, exclude).join("\n")
}
