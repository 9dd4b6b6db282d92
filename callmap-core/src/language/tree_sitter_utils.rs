use tree_sitter::Node;

/// Children of `node` in order, without comments and other extras
pub fn significant_children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    let children = node
        .children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect();
    children
}
