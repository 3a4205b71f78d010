use crate::dom::Node;
use crate::pass::TreePass;

/// Unwraps every element outside the allowlist, keeping its content in place.
/// The unwrapped element leaves a [`Node::Boundary`] at each edge (one for
/// void elements) so neighbouring text still gets spaced apart.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagSanitizer;

impl TreePass for TagSanitizer {
    fn name(&self) -> &'static str {
        "sanitize"
    }

    fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Element(mut element) => {
                    let children = self.apply(std::mem::take(&mut element.children));
                    if element.tag.is_allowed() {
                        element.children = children;
                        out.push(Node::Element(element));
                    } else if element.tag.is_void() {
                        out.push(Node::Boundary);
                    } else {
                        out.push(Node::Boundary);
                        out.extend(children);
                        out.push(Node::Boundary);
                    }
                }
                other => out.push(other),
            }
        }
        out
    }
}
