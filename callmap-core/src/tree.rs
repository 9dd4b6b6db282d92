//! Owned syntax tree shared by every front-end
//!
//! Front-ends lower their native parse output onto a closed set of node
//! kinds, so the classifier and listener never look at grammar-specific type
//! names. The tree is an arena: nodes refer to each other by [`NodeId`] and
//! [`Node`] is a cheap copyable handle, in the manner of `tree_sitter::Node`.
//!
//! Global invariants enforced:
//! - Children are stored in document order
//! - Every node's span covers exactly the tokens beneath it
//! - Trees are immutable once built

use crate::language::span::{LineIndex, SourceSpan};
use std::fmt;

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Lexical class of a raw token node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Identifier,
    /// Built-in type names such as `int` or `boolean`
    PrimitiveType,
    Literal,
    Operator,
    Punctuation,
}

/// Grammar production a node was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    TypeDeclaration,
    FunctionDeclaration,
    FormalParameters,
    FunctionBody,
    Expression,
    MethodCall,
    Parameter,
    ValueExpression,
    BlockStatement,
    LocalVariableDeclaration,
    VariableDeclarators,
    VariableDeclarator,
    VariableDeclaratorId,
    VariableInitializer,
    Statement,
    ForControl,
    Block,
    /// Input the front-end could not place in the grammar
    Error,
    Token(TokenKind),
}

impl NodeKind {
    /// Grammar name of the production, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "CompilationUnit",
            NodeKind::TypeDeclaration => "TypeDeclaration",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::FormalParameters => "FormalParameters",
            NodeKind::FunctionBody => "FunctionBody",
            NodeKind::Expression => "Expression",
            NodeKind::MethodCall => "MethodCall",
            NodeKind::Parameter => "Parameter",
            NodeKind::ValueExpression => "ValueExpression",
            NodeKind::BlockStatement => "BlockStatement",
            NodeKind::LocalVariableDeclaration => "LocalVariableDeclaration",
            NodeKind::VariableDeclarators => "VariableDeclarators",
            NodeKind::VariableDeclarator => "VariableDeclarator",
            NodeKind::VariableDeclaratorId => "VariableDeclaratorId",
            NodeKind::VariableInitializer => "VariableInitializer",
            NodeKind::Statement => "Statement",
            NodeKind::ForControl => "ForControl",
            NodeKind::Block => "Block",
            NodeKind::Error => "Error",
            NodeKind::Token(TokenKind::Keyword) => "Keyword",
            NodeKind::Token(TokenKind::Identifier) => "Identifier",
            NodeKind::Token(TokenKind::PrimitiveType) => "PrimitiveType",
            NodeKind::Token(TokenKind::Literal) => "Literal",
            NodeKind::Token(TokenKind::Operator) => "Operator",
            NodeKind::Token(TokenKind::Punctuation) => "Punctuation",
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self, NodeKind::Token(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: SourceSpan,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Syntax tree for one compilation unit
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { tree: self, id }
    }
}

/// Borrowed handle to a node of a [`SyntaxTree`]
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn span(&self) -> SourceSpan {
        self.data().span
    }

    /// Exact source text covered by this node
    pub fn text(&self) -> &'t str {
        let span = self.data().span;
        &self.tree.source[span.start..span.end]
    }

    /// True for raw token (leaf) nodes
    pub fn is_token(&self) -> bool {
        self.kind().is_token()
    }

    /// True if this is a keyword token spelled `word`
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind() == NodeKind::Token(TokenKind::Keyword) && self.text() == word
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        let tree = self.tree;
        self.data()
            .children
            .get(index)
            .map(|&id| Node { tree, id })
    }

    pub fn first_child(&self) -> Option<Node<'t>> {
        self.child(0)
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| Node { tree, id })
    }

    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(move |child| child.kind() == kind)
    }

    pub fn child_of_kind(&self, kind: NodeKind) -> Option<Node<'t>> {
        self.children_of_kind(kind).next()
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        let tree = self.tree;
        self.data().parent.map(|id| Node { tree, id })
    }

    /// Ancestor `levels` steps up; `ancestor(1)` is the parent
    pub fn ancestor(&self, levels: usize) -> Option<Node<'t>> {
        let mut current = *self;
        for _ in 0..levels {
            current = current.parent()?;
        }
        Some(current)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{} {:?}",
            self.kind(),
            self.span().start,
            self.span().end,
            self.text()
        )
    }
}

#[derive(Debug)]
struct PendingNode {
    kind: NodeKind,
    children: Vec<NodeId>,
}

/// Incremental builder used by the front-ends
///
/// Nodes are opened with [`TreeBuilder::start_node`], filled with tokens and
/// nested nodes, and closed with [`TreeBuilder::finish_node`]. A composite
/// node's span runs from its first to its last token; an empty node gets a
/// zero-width span at the end of the previous token.
#[derive(Debug)]
pub struct TreeBuilder {
    source: String,
    lines: LineIndex,
    nodes: Vec<NodeData>,
    stack: Vec<PendingNode>,
    roots: Vec<NodeId>,
    cursor: usize,
}

impl TreeBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let lines = LineIndex::new(&source);
        TreeBuilder {
            source,
            lines,
            nodes: Vec::new(),
            stack: Vec::new(),
            roots: Vec::new(),
            cursor: 0,
        }
    }

    /// Open a composite node; subsequent tokens and nodes become its children
    pub fn start_node(&mut self, kind: NodeKind) {
        self.stack.push(PendingNode {
            kind,
            children: Vec::new(),
        });
    }

    /// Append a raw token covering `start..end`
    pub fn token(&mut self, kind: TokenKind, start: usize, end: usize) {
        let span = self.lines.span(start, end);
        let id = self.push(NodeKind::Token(kind), span, Vec::new());
        self.attach(id);
        self.cursor = end;
    }

    /// Close the most recently opened node
    ///
    /// Does nothing when no node is open.
    pub fn finish_node(&mut self) {
        let Some(pending) = self.stack.pop() else {
            return;
        };
        let span = match (pending.children.first(), pending.children.last()) {
            (Some(first), Some(last)) => {
                let start = self.nodes[first.0].span.start;
                let end = self.nodes[last.0].span.end;
                self.lines.span(start, end)
            }
            _ => self.lines.span(self.cursor, self.cursor),
        };
        let id = self.push(pending.kind, span, pending.children);
        self.attach(id);
    }

    /// Close all open nodes and return the finished tree
    ///
    /// Fails unless exactly one root node was produced.
    pub fn finish(mut self) -> anyhow::Result<SyntaxTree> {
        while !self.stack.is_empty() {
            self.finish_node();
        }
        match self.roots.as_slice() {
            [root] => Ok(SyntaxTree {
                root: *root,
                source: self.source,
                nodes: self.nodes,
            }),
            [] => anyhow::bail!("syntax tree has no root node"),
            roots => anyhow::bail!("syntax tree has {} root nodes, expected 1", roots.len()),
        }
    }

    fn push(&mut self, kind: NodeKind, span: SourceSpan, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        for child in &children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(NodeData {
            kind,
            span,
            parent: None,
            children,
        });
        id
    }

    fn attach(&mut self, id: NodeId) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `foo(x)` as CompilationUnit > MethodCall > tokens
    fn small_tree() -> SyntaxTree {
        let mut builder = TreeBuilder::new("foo(x)");
        builder.start_node(NodeKind::CompilationUnit);
        builder.start_node(NodeKind::MethodCall);
        builder.token(TokenKind::Identifier, 0, 3);
        builder.token(TokenKind::Punctuation, 3, 4);
        builder.start_node(NodeKind::Parameter);
        builder.token(TokenKind::Identifier, 4, 5);
        builder.finish_node();
        builder.token(TokenKind::Punctuation, 5, 6);
        builder.finish_node();
        builder.finish_node();
        builder.finish().unwrap()
    }

    #[test]
    fn test_root_and_text() {
        let tree = small_tree();
        let root = tree.root();
        assert_eq!(root.kind(), NodeKind::CompilationUnit);
        assert_eq!(root.text(), "foo(x)");
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_children_in_document_order() {
        let tree = small_tree();
        let call = tree.root().first_child().unwrap();
        let kinds: Vec<NodeKind> = call.children().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Token(TokenKind::Identifier),
                NodeKind::Token(TokenKind::Punctuation),
                NodeKind::Parameter,
                NodeKind::Token(TokenKind::Punctuation),
            ]
        );
    }

    #[test]
    fn test_parent_and_ancestor() {
        let tree = small_tree();
        let call = tree.root().first_child().unwrap();
        let param = call.child_of_kind(NodeKind::Parameter).unwrap();
        let token = param.first_child().unwrap();

        assert_eq!(token.parent(), Some(param));
        assert_eq!(token.ancestor(2), Some(call));
        assert_eq!(token.ancestor(3), Some(tree.root()));
        assert_eq!(token.ancestor(4), None);
    }

    #[test]
    fn test_token_nodes() {
        let tree = small_tree();
        let call = tree.root().first_child().unwrap();
        let name = call.first_child().unwrap();
        assert!(name.is_token());
        assert!(!call.is_token());
        assert_eq!(name.text(), "foo");
        assert_eq!(name.child_count(), 0);
    }

    #[test]
    fn test_empty_node_has_zero_width_span() {
        let mut builder = TreeBuilder::new("()");
        builder.start_node(NodeKind::FormalParameters);
        builder.token(TokenKind::Punctuation, 0, 1);
        builder.start_node(NodeKind::ForControl);
        builder.finish_node();
        builder.token(TokenKind::Punctuation, 1, 2);
        builder.finish_node();
        let tree = builder.finish().unwrap();

        let control = tree.root().child(1).unwrap();
        assert_eq!(control.kind(), NodeKind::ForControl);
        assert_eq!(control.text(), "");
        assert_eq!(control.span().start, 1);
    }

    #[test]
    fn test_finish_closes_open_nodes() {
        let mut builder = TreeBuilder::new("x");
        builder.start_node(NodeKind::CompilationUnit);
        builder.token(TokenKind::Identifier, 0, 1);
        let tree = builder.finish().unwrap();
        assert_eq!(tree.root().text(), "x");
    }

    #[test]
    fn test_finish_rejects_multiple_roots() {
        let mut builder = TreeBuilder::new("ab");
        builder.token(TokenKind::Identifier, 0, 1);
        builder.token(TokenKind::Identifier, 1, 2);
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_finish_rejects_empty_builder() {
        let builder = TreeBuilder::new("");
        assert!(builder.finish().is_err());
    }
}
