//! Node classification and typed views over node shapes
//!
//! [`classify`] is the single place that decides which syntactic case a node
//! represents. The `*View` types put named accessors over the child layout
//! of a production, so a grammar change breaks here instead of at every
//! call site.

use crate::diagnostics::ClassificationError;
use crate::model::Position;
use crate::tree::{Node, NodeKind, TokenKind};

/// Syntactic case of a node, as seen by the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntacticCase {
    TypeDeclaration,
    FunctionDeclaration,
    FunctionBody,
    MethodCall,
    BlockStatement,
    LocalVariableDeclaration,
    VariableDeclarators,
    ForStatement,
    /// Any statement other than a `for` loop
    Statement,
    Error,
    Other,
}

/// Classify a node by its shape
///
/// Pure and total: shapes with no dedicated case are [`SyntacticCase::Other`].
pub fn classify(node: Node<'_>) -> SyntacticCase {
    match node.kind() {
        NodeKind::TypeDeclaration => SyntacticCase::TypeDeclaration,
        NodeKind::FunctionDeclaration => SyntacticCase::FunctionDeclaration,
        NodeKind::FunctionBody => SyntacticCase::FunctionBody,
        NodeKind::MethodCall => SyntacticCase::MethodCall,
        NodeKind::BlockStatement => SyntacticCase::BlockStatement,
        NodeKind::LocalVariableDeclaration => SyntacticCase::LocalVariableDeclaration,
        NodeKind::VariableDeclarators => SyntacticCase::VariableDeclarators,
        NodeKind::Statement => {
            if node.first_child().is_some_and(|c| c.is_keyword("for")) {
                SyntacticCase::ForStatement
            } else {
                SyntacticCase::Statement
            }
        }
        NodeKind::Error => SyntacticCase::Error,
        NodeKind::CompilationUnit
        | NodeKind::FormalParameters
        | NodeKind::Expression
        | NodeKind::Parameter
        | NodeKind::ValueExpression
        | NodeKind::VariableDeclarator
        | NodeKind::VariableDeclaratorId
        | NodeKind::VariableInitializer
        | NodeKind::ForControl
        | NodeKind::Block
        | NodeKind::Token(_) => SyntacticCase::Other,
    }
}

fn expect_kind(node: Node<'_>, kind: NodeKind) -> Result<(), ClassificationError> {
    if node.kind() == kind {
        Ok(())
    } else {
        Err(ClassificationError::UnexpectedChild {
            parent: node.parent().map_or(NodeKind::CompilationUnit, |p| p.kind()),
            expected: kind.name(),
            found: node.kind(),
            line: node.span().start_line,
            column: node.span().start_col,
        })
    }
}

/// `FunctionDeclaration`: header tokens, name, `FormalParameters`, `FunctionBody`
#[derive(Debug, Clone, Copy)]
pub struct FunctionDeclarationView<'t> {
    node: Node<'t>,
    name: Node<'t>,
    body: Node<'t>,
}

impl<'t> FunctionDeclarationView<'t> {
    pub fn from_node(node: Node<'t>) -> Result<Self, ClassificationError> {
        expect_kind(node, NodeKind::FunctionDeclaration)?;
        // Modifiers and return types may carry identifiers of their own; the
        // name is the last one before the parameter list.
        let name = node
            .children()
            .take_while(|c| !matches!(c.kind(), NodeKind::FormalParameters | NodeKind::FunctionBody))
            .filter(|c| c.kind() == NodeKind::Token(TokenKind::Identifier))
            .last()
            .ok_or_else(|| ClassificationError::missing(node, "function name"))?;
        let body = node
            .child_of_kind(NodeKind::FunctionBody)
            .ok_or_else(|| ClassificationError::missing(node, "function body"))?;
        Ok(FunctionDeclarationView { node, name, body })
    }

    pub fn name(&self) -> &'t str {
        self.name.text()
    }

    /// Top-level `Expression` children of the body, without descending
    pub fn body_expressions(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.body.children_of_kind(NodeKind::Expression)
    }

    /// Declaration lines, with both columns taken from the name token
    pub fn position(&self) -> Position {
        let span = self.node.span();
        let name_column = self.name.span().start_col;
        Position {
            start_line: span.start_line,
            start_column: name_column,
            stop_line: span.end_line,
            stop_column: name_column,
        }
    }
}

/// `MethodCall`: optional receiver tokens, name, then `(` parameters `)`
#[derive(Debug, Clone, Copy)]
pub struct MethodCallView<'t> {
    node: Node<'t>,
    name: Node<'t>,
}

impl<'t> MethodCallView<'t> {
    pub fn from_node(node: Node<'t>) -> Result<Self, ClassificationError> {
        expect_kind(node, NodeKind::MethodCall)?;
        // The name is the last identifier before the opening parenthesis;
        // anything earlier is the receiver (`a.b.name(...)`).
        let name = node
            .children()
            .take_while(|c| !(c.kind() == NodeKind::Token(TokenKind::Punctuation) && c.text() == "("))
            .filter(|c| c.kind() == NodeKind::Token(TokenKind::Identifier))
            .last()
            .ok_or_else(|| ClassificationError::missing(node, "method name"))?;
        Ok(MethodCallView { node, name })
    }

    pub fn name(&self) -> &'t str {
        self.name.text()
    }

    pub fn parameters(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.node.children_of_kind(NodeKind::Parameter)
    }
}

/// `LocalVariableDeclaration`: optional keyword or type, then `VariableDeclarators`
pub fn local_variable_declarators<'t>(node: Node<'t>) -> Result<Node<'t>, ClassificationError> {
    expect_kind(node, NodeKind::LocalVariableDeclaration)?;
    node.child_of_kind(NodeKind::VariableDeclarators)
        .ok_or_else(|| ClassificationError::missing(node, "variable declarators"))
}

/// `VariableDeclarator`: `VariableDeclaratorId` with optional `VariableInitializer`
#[derive(Debug, Clone, Copy)]
pub struct VariableDeclaratorView<'t> {
    id: Node<'t>,
    initializer: Option<Node<'t>>,
}

impl<'t> VariableDeclaratorView<'t> {
    pub fn from_node(node: Node<'t>) -> Result<Self, ClassificationError> {
        expect_kind(node, NodeKind::VariableDeclarator)?;
        let id = node
            .child_of_kind(NodeKind::VariableDeclaratorId)
            .ok_or_else(|| ClassificationError::missing(node, "declarator identifier"))?;
        let initializer = node.child_of_kind(NodeKind::VariableInitializer);
        Ok(VariableDeclaratorView { id, initializer })
    }

    pub fn identifier(&self) -> &'t str {
        self.id.text()
    }

    /// Initializer source text, or `""` when there is none
    pub fn initializer(&self) -> &'t str {
        self.initializer.map_or("", |init| init.text())
    }
}

/// Every `VariableDeclarator` of a `VariableDeclarators` node, in order
pub fn declarators<'t>(
    node: Node<'t>,
) -> impl Iterator<Item = (Node<'t>, Result<VariableDeclaratorView<'t>, ClassificationError>)> + 't
{
    node.children_of_kind(NodeKind::VariableDeclarator)
        .map(|declarator| (declarator, VariableDeclaratorView::from_node(declarator)))
}

/// `for` statement: `for` `(` ForControl `)` Statement(Block)
///
/// Both front-ends emit exactly this five-child layout for `for` and
/// for-each loops. The offsets below are the contract with them.
#[derive(Debug, Clone, Copy)]
pub struct ForStatementView<'t> {
    control: Node<'t>,
    body: Node<'t>,
}

impl<'t> ForStatementView<'t> {
    const KEYWORD_INDEX: usize = 0;
    const CONTROL_INDEX: usize = 2;
    const BODY_INDEX: usize = 4;

    pub fn from_node(node: Node<'t>) -> Result<Self, ClassificationError> {
        expect_kind(node, NodeKind::Statement)?;
        let keyword = node
            .child(Self::KEYWORD_INDEX)
            .ok_or_else(|| ClassificationError::missing(node, "`for` keyword"))?;
        if !keyword.is_keyword("for") {
            return Err(ClassificationError::unexpected(node, "`for` keyword", keyword));
        }

        let control = node
            .child(Self::CONTROL_INDEX)
            .ok_or_else(|| ClassificationError::missing(node, "for control"))?;
        if control.kind() != NodeKind::ForControl {
            return Err(ClassificationError::unexpected(node, "for control", control));
        }

        let body_statement = node
            .child(Self::BODY_INDEX)
            .ok_or_else(|| ClassificationError::missing(node, "loop body"))?;
        if body_statement.kind() != NodeKind::Statement {
            return Err(ClassificationError::unexpected(node, "loop body", body_statement));
        }
        let body = match body_statement.first_child() {
            Some(block) if block.kind() == NodeKind::Block => block,
            other => {
                let span = body_statement.span();
                return Err(ClassificationError::LoopBodyNotBlock {
                    found: other.map_or(NodeKind::Statement, |n| n.kind()),
                    line: span.start_line,
                    column: span.start_col,
                });
            }
        };

        Ok(ForStatementView { control, body })
    }

    /// The loop's control clause (everything between the parentheses)
    pub fn control_clause(&self) -> Node<'t> {
        self.control
    }

    /// Statements directly inside the body block
    pub fn body_statements(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.body.children_of_kind(NodeKind::BlockStatement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{SyntaxTree, TreeBuilder};

    fn statement(source: &str, build: impl FnOnce(&mut TreeBuilder)) -> SyntaxTree {
        let mut builder = TreeBuilder::new(source);
        builder.start_node(NodeKind::Statement);
        build(&mut builder);
        builder.finish_node();
        builder.finish().unwrap()
    }

    fn for_loop(body_is_block: bool) -> SyntaxTree {
        let source = if body_is_block {
            "for(i<3){x;}"
        } else {
            "for(i<3)x;"
        };
        statement(source, |b| {
            b.token(TokenKind::Keyword, 0, 3);
            b.token(TokenKind::Punctuation, 3, 4);
            b.start_node(NodeKind::ForControl);
            b.token(TokenKind::Identifier, 4, 5);
            b.token(TokenKind::Operator, 5, 6);
            b.token(TokenKind::Literal, 6, 7);
            b.finish_node();
            b.token(TokenKind::Punctuation, 7, 8);
            b.start_node(NodeKind::Statement);
            if body_is_block {
                b.start_node(NodeKind::Block);
                b.token(TokenKind::Punctuation, 8, 9);
                b.start_node(NodeKind::BlockStatement);
                b.start_node(NodeKind::Statement);
                b.token(TokenKind::Identifier, 9, 10);
                b.token(TokenKind::Punctuation, 10, 11);
                b.finish_node();
                b.finish_node();
                b.token(TokenKind::Punctuation, 11, 12);
                b.finish_node();
            } else {
                b.token(TokenKind::Identifier, 8, 9);
                b.token(TokenKind::Punctuation, 9, 10);
            }
            b.finish_node();
        })
    }

    #[test]
    fn test_classify_for_statement() {
        let tree = for_loop(true);
        assert_eq!(classify(tree.root()), SyntacticCase::ForStatement);
    }

    #[test]
    fn test_classify_other_statement() {
        let tree = statement("return;", |b| {
            b.token(TokenKind::Keyword, 0, 6);
            b.token(TokenKind::Punctuation, 6, 7);
        });
        assert_eq!(classify(tree.root()), SyntacticCase::Statement);
    }

    #[test]
    fn test_classify_identifier_named_for_is_not_a_loop() {
        // `for` spelled as an identifier token is not the loop keyword
        let tree = statement("for;", |b| {
            b.token(TokenKind::Identifier, 0, 3);
            b.token(TokenKind::Punctuation, 3, 4);
        });
        assert_eq!(classify(tree.root()), SyntacticCase::Statement);
    }

    #[test]
    fn test_classify_tokens_are_other() {
        let tree = for_loop(true);
        let keyword = tree.root().first_child().unwrap();
        assert_eq!(classify(keyword), SyntacticCase::Other);
    }

    #[test]
    fn test_for_view_accessors() {
        let tree = for_loop(true);
        let view = ForStatementView::from_node(tree.root()).unwrap();
        assert_eq!(view.control_clause().text(), "i<3");
        let lines: Vec<&str> = view.body_statements().map(|s| s.text()).collect();
        assert_eq!(lines, vec!["x;"]);
    }

    #[test]
    fn test_for_view_rejects_non_block_body() {
        let tree = for_loop(false);
        let error = ForStatementView::from_node(tree.root()).unwrap_err();
        assert!(matches!(error, ClassificationError::LoopBodyNotBlock { .. }));
    }

    #[test]
    fn test_for_view_rejects_missing_control() {
        let tree = statement("for", |b| b.token(TokenKind::Keyword, 0, 3));
        let error = ForStatementView::from_node(tree.root()).unwrap_err();
        assert!(matches!(
            error,
            ClassificationError::MissingChild {
                expected: "for control",
                ..
            }
        ));
    }

    #[test]
    fn test_method_call_name_skips_receiver() {
        let mut builder = TreeBuilder::new("a.b(x)");
        builder.start_node(NodeKind::MethodCall);
        builder.token(TokenKind::Identifier, 0, 1);
        builder.token(TokenKind::Punctuation, 1, 2);
        builder.token(TokenKind::Identifier, 2, 3);
        builder.token(TokenKind::Punctuation, 3, 4);
        builder.start_node(NodeKind::Parameter);
        builder.token(TokenKind::Identifier, 4, 5);
        builder.finish_node();
        builder.token(TokenKind::Punctuation, 5, 6);
        builder.finish_node();
        let tree = builder.finish().unwrap();

        let view = MethodCallView::from_node(tree.root()).unwrap();
        assert_eq!(view.name(), "b");
        assert_eq!(view.parameters().count(), 1);
    }

    #[test]
    fn test_method_call_without_name() {
        let mut builder = TreeBuilder::new("()");
        builder.start_node(NodeKind::MethodCall);
        builder.token(TokenKind::Punctuation, 0, 1);
        builder.token(TokenKind::Punctuation, 1, 2);
        builder.finish_node();
        let tree = builder.finish().unwrap();
        assert!(MethodCallView::from_node(tree.root()).is_err());
    }

    #[test]
    fn test_view_rejects_wrong_kind() {
        let tree = for_loop(true);
        assert!(FunctionDeclarationView::from_node(tree.root()).is_err());
        assert!(MethodCallView::from_node(tree.root()).is_err());
    }
}
