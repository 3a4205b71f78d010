use crate::dom::Node;

/// One structural rewrite over the document tree.
pub trait TreePass: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, nodes: Vec<Node>) -> Vec<Node>;
}
