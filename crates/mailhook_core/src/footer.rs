use crate::config::FooterMarker;
use crate::dom::{Element, Node};
use crate::pass::TreePass;

/// Cuts the signature footer: the first marker element and every sibling
/// that follows it at the same level.
#[derive(Debug, Clone, Default)]
pub struct FooterTrimmer {
    marker: FooterMarker,
}

impl FooterTrimmer {
    pub fn new(marker: FooterMarker) -> Self {
        Self { marker }
    }

    fn is_marker(&self, element: &Element) -> bool {
        element.tag.name() == self.marker.tag() && element.has_class(self.marker.class())
    }

    /// Returns the trimmed list and whether the marker was found in it.
    fn trim(&self, nodes: Vec<Node>) -> (Vec<Node>, bool) {
        let mut out = Vec::with_capacity(nodes.len());
        let mut iter = nodes.into_iter();
        while let Some(node) = iter.next() {
            match node {
                Node::Element(element) if self.is_marker(&element) => return (out, true),
                Node::Element(mut element) => {
                    let (children, found) = self.trim(std::mem::take(&mut element.children));
                    element.children = children;
                    out.push(Node::Element(element));
                    if found {
                        // Siblings of the marker's ancestors stay.
                        out.extend(iter);
                        return (out, true);
                    }
                }
                other => out.push(other),
            }
        }
        (out, false)
    }
}

impl TreePass for FooterTrimmer {
    fn name(&self) -> &'static str {
        "footer"
    }

    fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        self.trim(nodes).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tag;
    use crate::Document;

    fn trim(html: &str) -> String {
        let nodes = FooterTrimmer::default().apply(Document::parse(html).nodes);
        Document::from_nodes(nodes).text_content()
    }

    #[test]
    fn removes_marker_and_following_siblings() {
        let html = r#"<div>Body<span class="gmail_signature_prefix">-- </span><br>Jane<b>Corp</b></div>"#;
        assert_eq!(trim(html), "Body");
    }

    #[test]
    fn keeps_content_after_the_marker_parent() {
        let html = r#"<div><p>In <span class="gmail_signature_prefix">--</span> sig</p>after</div>tail"#;
        assert_eq!(trim(html), "In aftertail");
    }

    #[test]
    fn only_first_marker_is_a_cut_point() {
        let html = r#"<p>a<span class="gmail_signature_prefix">x</span>b</p><p>c<span class="gmail_signature_prefix">y</span>d</p>"#;
        assert_eq!(trim(html), "acyd");
    }

    #[test]
    fn absent_marker_is_noop() {
        let nodes = vec![Node::element(Tag::Bold, vec![Node::text("x")])];
        assert_eq!(FooterTrimmer::default().apply(nodes.clone()), nodes);
    }
}
