use crate::dom::{replace_elements, Element, Node, Tag};
use crate::pass::TreePass;

/// `<a href="u">text</a>` becomes `text (u)`; a link without text disappears.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkRenderer;

impl TreePass for LinkRenderer {
    fn name(&self) -> &'static str {
        "links"
    }

    fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        replace_elements(nodes, &Tag::Link, &mut |link: Element| {
            let text = link.text_content().trim().to_string();
            let href = link.attr("href").map(str::trim).unwrap_or_default();
            match (text.is_empty(), href.is_empty()) {
                (true, _) => Vec::new(),
                (false, true) => vec![Node::Text(text)],
                (false, false) => vec![Node::Text(format!("{text} ({href})"))],
            }
        })
    }
}

/// Bold to `**text**`, then italic to `*text*`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmphasisRenderer;

impl TreePass for EmphasisRenderer {
    fn name(&self) -> &'static str {
        "emphasis"
    }

    fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        let nodes = replace_elements(nodes, &Tag::Bold, &mut |bold: Element| {
            vec![wrap(bold.text_content(), "**")]
        });
        replace_elements(nodes, &Tag::Italic, &mut |italic: Element| {
            vec![wrap(italic.text_content(), "*")]
        })
    }
}

fn wrap(text: String, marker: &str) -> Node {
    if text.trim().is_empty() {
        return Node::Text(text);
    }
    Node::Text(format!("{marker}{text}{marker}"))
}
