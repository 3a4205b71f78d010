use crate::dom::{collapse_whitespace, replace_elements, Element, Node, Tag};
use crate::pass::TreePass;

/// `<ol>` to `1. item` lines, then `<ul>` to `- item` lines. Only direct
/// `<li>` children count and blank items are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListRenderer;

impl TreePass for ListRenderer {
    fn name(&self) -> &'static str {
        "lists"
    }

    fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        let nodes = replace_elements(nodes, &Tag::OrderedList, &mut |list: Element| {
            let lines = list_items(&list)
                .into_iter()
                .enumerate()
                .map(|(index, item)| format!("{}. {item}", index + 1))
                .collect();
            list_block(lines)
        });
        replace_elements(nodes, &Tag::UnorderedList, &mut |list: Element| {
            let lines = list_items(&list)
                .into_iter()
                .map(|item| format!("- {item}"))
                .collect();
            list_block(lines)
        })
    }
}

fn list_items(list: &Element) -> Vec<String> {
    list.children
        .iter()
        .filter_map(Node::as_element)
        .filter(|child| child.tag == Tag::ListItem)
        .map(|item| collapse_whitespace(&item.text_content()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn list_block(lines: Vec<String>) -> Vec<Node> {
    if lines.is_empty() {
        return Vec::new();
    }
    vec![Node::Text(format!("\n\n{}\n\n", lines.join("\n")))]
}

/// Paragraphs become blank-line delimited text; `<br>` becomes a newline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParagraphRenderer;

impl ParagraphRenderer {
    fn paragraphs(&self, nodes: Vec<Node>) -> Vec<Node> {
        replace_elements(nodes, &Tag::Paragraph, &mut |paragraph: Element| {
            let mut out = vec![Node::text("\n\n")];
            out.extend(self.paragraphs(paragraph.children));
            out.push(Node::text("\n\n"));
            out
        })
    }
}

impl TreePass for ParagraphRenderer {
    fn name(&self) -> &'static str {
        "paragraphs"
    }

    fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        let nodes = self.paragraphs(nodes);
        replace_elements(nodes, &Tag::LineBreak, &mut |_: Element| vec![Node::text("\n")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use pretty_assertions::assert_eq;

    fn render_lists(html: &str) -> String {
        let nodes = ListRenderer.apply(Document::parse(html).nodes);
        Document::from_nodes(nodes).text_content()
    }

    #[test]
    fn ordered_numbering_skips_blank_items() {
        let out = render_lists("<ol><li>a</li><li> </li><li>b  c</li></ol>");
        assert_eq!(out, "\n\n1. a\n2. b c\n\n");
    }

    #[test]
    fn empty_list_vanishes() {
        assert_eq!(render_lists("x<ul><li></li><li>  </li></ul>y"), "xy");
    }

    #[test]
    fn ordered_list_inside_bullet_is_flattened_into_the_item() {
        let out = render_lists("<ul><li>a<ol><li>b</li></ol></li></ul>");
        assert_eq!(out, "\n\n- a 1. b\n\n");
    }

    #[test]
    fn paragraphs_and_breaks() {
        let nodes = vec![Node::element(
            Tag::Paragraph,
            vec![
                Node::text("a"),
                Node::element(Tag::LineBreak, vec![]),
                Node::text("b"),
            ],
        )];
        let out = ParagraphRenderer.apply(nodes);
        assert_eq!(Document::from_nodes(out).text_content(), "\n\na\nb\n\n");
    }
}
