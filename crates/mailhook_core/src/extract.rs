use crate::dom::Node;

/// Serializes the rewritten tree to plain text.
///
/// Element boundaries that touch with no text between them (`</li><li>`,
/// `<td></td>`) produce a single space, so runs of text from neighbouring
/// elements never fuse into one word.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn extract(&self, nodes: &[Node]) -> String {
        let mut writer = SpacingWriter::default();
        writer.write_nodes(nodes);
        writer.out
    }
}

#[derive(Default)]
struct SpacingWriter {
    out: String,
    after_boundary: bool,
}

impl SpacingWriter {
    fn write_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Text(text) => self.text(text),
                Node::Boundary => self.boundary(),
                Node::Element(element) => {
                    self.boundary();
                    if !element.tag.is_void() {
                        self.write_nodes(&element.children);
                        self.boundary();
                    }
                }
            }
        }
    }

    fn boundary(&mut self) {
        if self.after_boundary {
            self.out.push(' ');
        }
        self.after_boundary = true;
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.out.push_str(text);
        self.after_boundary = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tag;

    fn li(text: &str) -> Node {
        Node::element(Tag::ListItem, vec![Node::text(text)])
    }

    #[test]
    fn adjacent_elements_get_a_space() {
        let nodes = vec![li("one"), li("two")];
        assert_eq!(TextExtractor.extract(&nodes), "one two");
    }

    #[test]
    fn text_between_elements_suppresses_spacing() {
        let nodes = vec![li("one"), Node::text(","), li("two")];
        assert_eq!(TextExtractor.extract(&nodes), "one,two");
    }

    #[test]
    fn nested_boundaries_collapse_to_single_spaces() {
        let nodes = vec![Node::element(
            Tag::TableRow,
            vec![
                Node::element(Tag::TableCell, vec![Node::text("a")]),
                Node::element(Tag::TableCell, vec![]),
            ],
        )];
        // <tr><td>a</td><td></td></tr>
        assert_eq!(TextExtractor.extract(&nodes), " a   ");
    }

    #[test]
    fn unwrapped_edges_space_like_elements() {
        // <div>a</div><div>b</div> after sanitizing
        let nodes = vec![
            Node::Boundary,
            Node::text("a"),
            Node::Boundary,
            Node::Boundary,
            Node::text("b"),
            Node::Boundary,
        ];
        assert_eq!(TextExtractor.extract(&nodes), "a b");
    }

    #[test]
    fn plain_text_is_verbatim() {
        let nodes = vec![Node::text("\n```\na | b\n```\n")];
        assert_eq!(TextExtractor.extract(&nodes), "\n```\na | b\n```\n");
    }
}
