//! Owned document tree built from parsed markup.
//!
//! Every element owns its children outright. Passes consume a node list and
//! return a new one, so no stage ever observes a half-rewritten sibling.

use ego_tree::NodeRef;
use scraper::node::Node as HtmlNode;
use scraper::{Html, Selector};

/// Element kinds the renderer knows about. Anything else is `Other` and gets
/// unwrapped by the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Paragraph,
    LineBreak,
    Bold,
    Italic,
    Link,
    Table,
    TableRow,
    TableHeaderCell,
    TableCell,
    TableBody,
    TableHead,
    OrderedList,
    UnorderedList,
    ListItem,
    Other(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "p" => Tag::Paragraph,
            "br" => Tag::LineBreak,
            "b" => Tag::Bold,
            "i" => Tag::Italic,
            "a" => Tag::Link,
            "table" => Tag::Table,
            "tr" => Tag::TableRow,
            "th" => Tag::TableHeaderCell,
            "td" => Tag::TableCell,
            "tbody" => Tag::TableBody,
            "thead" => Tag::TableHead,
            "ol" => Tag::OrderedList,
            "ul" => Tag::UnorderedList,
            "li" => Tag::ListItem,
            _ => Tag::Other(lower),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Paragraph => "p",
            Tag::LineBreak => "br",
            Tag::Bold => "b",
            Tag::Italic => "i",
            Tag::Link => "a",
            Tag::Table => "table",
            Tag::TableRow => "tr",
            Tag::TableHeaderCell => "th",
            Tag::TableCell => "td",
            Tag::TableBody => "tbody",
            Tag::TableHead => "thead",
            Tag::OrderedList => "ol",
            Tag::UnorderedList => "ul",
            Tag::ListItem => "li",
            Tag::Other(name) => name,
        }
    }

    /// True for every kind kept through sanitization.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Tag::Other(_))
    }

    /// Void elements serialize as a single boundary with no closing tag.
    pub fn is_void(&self) -> bool {
        match self {
            Tag::LineBreak => true,
            Tag::Other(name) => matches!(
                name.as_str(),
                "area" | "base" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
                    | "source" | "track" | "wbr"
            ),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Concatenated text of every descendant text leaf, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Edge of an element that was unwrapped. Carries no text, but the
    /// extractor spaces it like a real element edge.
    Boundary,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn element(tag: Tag, children: Vec<Node>) -> Self {
        Node::Element(Element::new(tag).with_children(children))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) | Node::Boundary => None,
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
            Node::Boundary => {}
        }
    }
}

/// Parsed email body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    /// Parse markup permissively. Content of `<body>` is used when present,
    /// otherwise the whole tree. Comments, doctypes and processing
    /// instructions are dropped; everything else is kept.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let body_sel = Selector::parse("body").ok();

        let body = body_sel
            .as_ref()
            .and_then(|sel| parsed.select(sel).next());

        let nodes = match body {
            Some(body) => convert_children(*body),
            None => convert_children(parsed.tree.root()),
        };
        Self { nodes }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }
}

fn convert_children(node: NodeRef<'_, HtmlNode>) -> Vec<Node> {
    let mut out = Vec::new();
    for child in node.children() {
        convert_node(child, &mut out);
    }
    out
}

fn convert_node(node: NodeRef<'_, HtmlNode>, out: &mut Vec<Node>) {
    match node.value() {
        HtmlNode::Text(text) => out.push(Node::Text(text.to_string())),
        HtmlNode::Element(element) => {
            let attrs = element
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            out.push(Node::Element(Element {
                tag: Tag::from_name(element.name()),
                attrs,
                children: convert_children(node),
            }));
        }
        HtmlNode::Document | HtmlNode::Fragment => out.extend(convert_children(node)),
        _ => {}
    }
}

/// Replace every outermost element with the given tag by the nodes `render`
/// produces for it. Matched elements are not descended into; everything else
/// is rebuilt with its children visited.
pub(crate) fn replace_elements<F>(nodes: Vec<Node>, target: &Tag, render: &mut F) -> Vec<Node>
where
    F: FnMut(Element) -> Vec<Node>,
{
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(element) if element.tag == *target => out.extend(render(element)),
            Node::Element(mut element) => {
                let children = std::mem::take(&mut element.children);
                element.children = replace_elements(children, target, render);
                out.push(Node::Element(element));
            }
            other => out.push(other),
        }
    }
    out
}

/// Collapse every whitespace run to one space and trim the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
