//! Lowering of tree-sitter Java trees into the shared syntax tree
//!
//! Only the shapes the listener inspects are rebuilt node by node. Anything
//! else is flattened into raw tokens under the nearest lowered node.

use crate::language::tree_sitter_utils::significant_children;
use crate::tree::{NodeKind, SyntaxTree, TokenKind, TreeBuilder};
use anyhow::Result;
use tree_sitter::{Node, Tree};

pub(super) fn lower(tree: &Tree, source: &str) -> Result<SyntaxTree> {
    let mut lowering = Lowering {
        builder: TreeBuilder::new(source),
    };
    lowering.compilation_unit(tree.root_node());
    lowering.builder.finish()
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration"
    )
}

fn is_function_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "method_declaration" | "constructor_declaration" | "compact_constructor_declaration"
    )
}

fn is_variable_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "local_variable_declaration" | "field_declaration" | "constant_declaration"
    )
}

fn is_statement(kind: &str) -> bool {
    kind == "block" || kind == "switch_expression" || kind.ends_with("_statement")
}

/// Nodes that group statements without being statements themselves
fn is_statement_container(kind: &str) -> bool {
    matches!(
        kind,
        "switch_block"
            | "switch_block_statement_group"
            | "switch_rule"
            | "switch_label"
            | "catch_clause"
            | "catch_formal_parameter"
            | "finally_clause"
            | "resource_specification"
    )
}

/// Token class for nodes emitted as a single token, whatever their children
fn atomic_kind(kind: &str) -> Option<TokenKind> {
    match kind {
        "identifier" | "type_identifier" => Some(TokenKind::Identifier),
        "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {
            Some(TokenKind::PrimitiveType)
        }
        "string_literal" | "character_literal" | "text_block" | "true" | "false" => {
            Some(TokenKind::Literal)
        }
        k if k.ends_with("_literal") => Some(TokenKind::Literal),
        _ => None,
    }
}

/// Token class for an anonymous leaf, decided by its spelling
fn leaf_kind(kind: &str) -> TokenKind {
    match kind {
        "(" | ")" | "{" | "}" | "[" | "]" | ";" | "," | "." => TokenKind::Punctuation,
        k if !k.is_empty() && k.chars().all(|c| c.is_ascii_alphabetic() || c == '_') => {
            TokenKind::Keyword
        }
        _ => TokenKind::Operator,
    }
}

struct Lowering {
    builder: TreeBuilder,
}

impl Lowering {
    fn token(&mut self, kind: TokenKind, node: Node<'_>) {
        self.builder.token(kind, node.start_byte(), node.end_byte());
    }

    /// Emit every token under `node`, in source order
    fn leaves(&mut self, node: Node<'_>) {
        if node.is_missing() {
            self.builder.start_node(NodeKind::Error);
            self.builder.finish_node();
            return;
        }
        if node.is_error() {
            self.error(node);
            return;
        }
        if let Some(kind) = atomic_kind(node.kind()) {
            self.token(kind, node);
            return;
        }
        if node.child_count() == 0 {
            if node.start_byte() < node.end_byte() {
                self.token(leaf_kind(node.kind()), node);
            }
            return;
        }
        for child in significant_children(node) {
            self.leaves(child);
        }
    }

    fn error(&mut self, node: Node<'_>) {
        self.builder.start_node(NodeKind::Error);
        if node.child_count() == 0 {
            if node.start_byte() < node.end_byte() {
                self.token(TokenKind::Punctuation, node);
            }
        } else {
            for child in significant_children(node) {
                if child.is_error() {
                    self.error_tokens(child);
                } else {
                    self.leaves(child);
                }
            }
        }
        self.builder.finish_node();
    }

    /// Tokens of a nested `ERROR`, without opening another `Error` node
    fn error_tokens(&mut self, node: Node<'_>) {
        if node.child_count() == 0 {
            if node.start_byte() < node.end_byte() {
                self.token(TokenKind::Punctuation, node);
            }
            return;
        }
        for child in significant_children(node) {
            if child.is_error() {
                self.error_tokens(child);
            } else {
                self.leaves(child);
            }
        }
    }

    fn compilation_unit(&mut self, program: Node<'_>) {
        self.builder.start_node(NodeKind::CompilationUnit);
        for child in significant_children(program) {
            self.member(child);
        }
        self.builder.finish_node();
    }

    /// One member of a compilation unit or type body
    fn member(&mut self, node: Node<'_>) {
        let kind = node.kind();
        if is_type_declaration(kind) {
            self.type_declaration(node);
        } else if is_function_declaration(kind) {
            self.function_declaration(node);
        } else if is_variable_declaration(kind) {
            self.builder.start_node(NodeKind::Expression);
            self.block_statement(node);
            self.builder.finish_node();
        } else if kind == "block" {
            // Instance initializer: its statements sit at type level
            for child in significant_children(node) {
                match child.kind() {
                    "{" | "}" => self.leaves(child),
                    _ => self.expression(child),
                }
            }
        } else if kind == "static_initializer" {
            for child in significant_children(node) {
                self.member(child);
            }
        } else {
            self.leaves(node);
        }
    }

    fn type_declaration(&mut self, node: Node<'_>) {
        self.builder.start_node(NodeKind::TypeDeclaration);
        let body = node.child_by_field_name("body");
        for child in significant_children(node) {
            if Some(child) == body {
                self.type_body(child);
            } else {
                self.leaves(child);
            }
        }
        self.builder.finish_node();
    }

    fn type_body(&mut self, body: Node<'_>) {
        for child in significant_children(body) {
            if child.kind() == "enum_body_declarations" {
                self.type_body(child);
            } else {
                self.member(child);
            }
        }
    }

    fn function_declaration(&mut self, node: Node<'_>) {
        self.builder.start_node(NodeKind::FunctionDeclaration);
        let name = node.child_by_field_name("name");
        let body = node.child_by_field_name("body");
        for child in significant_children(node) {
            if Some(child) == name {
                self.token(TokenKind::Identifier, child);
            } else if Some(child) == body {
                self.function_body(child);
            } else if child.kind() == "formal_parameters" {
                self.builder.start_node(NodeKind::FormalParameters);
                self.leaves(child);
                self.builder.finish_node();
            } else if child.kind() == ";" && body.is_none() {
                // Abstract and interface methods get an empty body
                self.builder.start_node(NodeKind::FunctionBody);
                self.leaves(child);
                self.builder.finish_node();
            } else {
                self.leaves(child);
            }
        }
        self.builder.finish_node();
    }

    fn function_body(&mut self, body: Node<'_>) {
        self.builder.start_node(NodeKind::FunctionBody);
        for child in significant_children(body) {
            match child.kind() {
                "{" | "}" => self.leaves(child),
                "ERROR" => self.error(child),
                kind if is_type_declaration(kind) => self.type_declaration(child),
                _ => self.expression(child),
            }
        }
        self.builder.finish_node();
    }

    // expression : methodCall ';' | blockStatement
    fn expression(&mut self, statement: Node<'_>) {
        self.builder.start_node(NodeKind::Expression);
        let call = (statement.kind() == "expression_statement")
            .then(|| significant_children(statement).into_iter().find(|c| c.is_named()))
            .flatten()
            .filter(|inner| inner.kind() == "method_invocation");
        match call {
            Some(call) => {
                for child in significant_children(statement) {
                    if child == call {
                        self.method_call(child);
                    } else {
                        self.leaves(child);
                    }
                }
            }
            None => self.block_statement(statement),
        }
        self.builder.finish_node();
    }

    fn block_statement(&mut self, statement: Node<'_>) {
        self.builder.start_node(NodeKind::BlockStatement);
        if is_variable_declaration(statement.kind()) {
            self.variable_declaration(statement);
        } else {
            self.statement(statement);
        }
        self.builder.finish_node();
    }

    /// `LocalVariableDeclaration[type, VariableDeclarators]` followed by its `;`
    fn variable_declaration(&mut self, node: Node<'_>) {
        self.builder.start_node(NodeKind::LocalVariableDeclaration);
        let mut declaration_open = true;
        let mut declarators_open = false;
        for child in significant_children(node) {
            match child.kind() {
                "variable_declarator" if declaration_open => {
                    if !declarators_open {
                        self.builder.start_node(NodeKind::VariableDeclarators);
                        declarators_open = true;
                    }
                    self.variable_declarator(child);
                }
                ";" if declaration_open => {
                    if declarators_open {
                        self.builder.finish_node();
                        declarators_open = false;
                    }
                    self.builder.finish_node();
                    declaration_open = false;
                    self.leaves(child);
                }
                _ => self.leaves(child),
            }
        }
        if declarators_open {
            self.builder.finish_node();
        }
        if declaration_open {
            self.builder.finish_node();
        }
    }

    fn variable_declarator(&mut self, node: Node<'_>) {
        self.builder.start_node(NodeKind::VariableDeclarator);
        let name = node.child_by_field_name("name");
        let value = node.child_by_field_name("value");
        for child in significant_children(node) {
            if Some(child) == name {
                self.builder.start_node(NodeKind::VariableDeclaratorId);
                self.leaves(child);
                self.builder.finish_node();
            } else if Some(child) == value {
                self.builder.start_node(NodeKind::VariableInitializer);
                self.value(child);
                self.builder.finish_node();
            } else {
                self.leaves(child);
            }
        }
        self.builder.finish_node();
    }

    fn statement(&mut self, statement: Node<'_>) {
        self.builder.start_node(NodeKind::Statement);
        match statement.kind() {
            "for_statement" | "enhanced_for_statement" => self.for_statement(statement),
            "block" => self.block(statement),
            "expression_statement" => {
                for child in significant_children(statement) {
                    if child.is_named() {
                        self.value_expression(child);
                    } else {
                        self.leaves(child);
                    }
                }
            }
            "ERROR" => self.error(statement),
            kind if is_type_declaration(kind) => self.type_declaration(statement),
            _ => {
                for child in significant_children(statement) {
                    self.statement_part(child);
                }
            }
        }
        self.builder.finish_node();
    }

    /// A child of a statement that has no dedicated layout
    fn statement_part(&mut self, node: Node<'_>) {
        let kind = node.kind();
        if is_statement(kind) {
            self.statement(node);
        } else if is_variable_declaration(kind) {
            self.block_statement(node);
        } else if is_type_declaration(kind) {
            self.type_declaration(node);
        } else if is_statement_container(kind) {
            for child in significant_children(node) {
                self.statement_part(child);
            }
        } else if node.is_error() {
            self.error(node);
        } else if !node.is_named() || atomic_kind(kind).is_some() {
            self.leaves(node);
        } else {
            self.value_expression(node);
        }
    }

    /// `for` `(` ForControl `)` Statement, for both loop forms
    fn for_statement(&mut self, statement: Node<'_>) {
        let body = statement.child_by_field_name("body");
        let mut in_control = false;
        for child in significant_children(statement) {
            if Some(child) == body {
                self.statement(child);
            } else if child.kind() == "(" && !in_control {
                self.leaves(child);
                self.builder.start_node(NodeKind::ForControl);
                in_control = true;
            } else if child.kind() == ")" && in_control {
                self.builder.finish_node();
                in_control = false;
                self.leaves(child);
            } else if in_control {
                if child.kind() == "local_variable_declaration" {
                    self.variable_declaration(child);
                } else {
                    self.value(child);
                }
            } else {
                self.leaves(child);
            }
        }
        if in_control {
            self.builder.finish_node();
        }
    }

    // block : '{' blockStatement* '}'
    fn block(&mut self, block: Node<'_>) {
        self.builder.start_node(NodeKind::Block);
        for child in significant_children(block) {
            match child.kind() {
                "{" | "}" => self.leaves(child),
                "ERROR" => self.error(child),
                _ => self.block_statement(child),
            }
        }
        self.builder.finish_node();
    }

    // methodCall : receiver? name '(' parameter (',' parameter)* ')'
    fn method_call(&mut self, call: Node<'_>) {
        self.builder.start_node(NodeKind::MethodCall);
        let name = call.child_by_field_name("name");
        let arguments = call.child_by_field_name("arguments");
        for child in significant_children(call) {
            if Some(child) == name {
                self.token(TokenKind::Identifier, child);
            } else if Some(child) == arguments {
                self.arguments(child);
            } else if child.kind() == "method_invocation" {
                self.method_call(child);
            } else if !child.is_named() || atomic_kind(child.kind()).is_some() {
                self.leaves(child);
            } else if child.kind() == "type_arguments" {
                self.leaves(child);
            } else {
                // Receivers such as `this.items` or `(a ? b : c)`
                self.value_expression(child);
            }
        }
        self.builder.finish_node();
    }

    fn arguments(&mut self, list: Node<'_>) {
        for child in significant_children(list) {
            match child.kind() {
                "(" | ")" | "," => self.leaves(child),
                "ERROR" => self.error(child),
                kind => {
                    self.builder.start_node(NodeKind::Parameter);
                    if matches!(kind, "identifier" | "type_identifier") {
                        self.leaves(child);
                    } else {
                        self.value_expression(child);
                    }
                    self.builder.finish_node();
                }
            }
        }
    }

    fn value_expression(&mut self, node: Node<'_>) {
        self.builder.start_node(NodeKind::ValueExpression);
        self.value(node);
        self.builder.finish_node();
    }

    /// Tokens of an expression, keeping nested calls and anonymous class
    /// members as nodes
    fn value(&mut self, node: Node<'_>) {
        match node.kind() {
            "method_invocation" => self.method_call(node),
            "class_body" => self.type_body(node),
            _ if node.is_error() || node.is_missing() => self.leaves(node),
            kind if atomic_kind(kind).is_some() || node.child_count() == 0 => self.leaves(node),
            _ => {
                for child in significant_children(node) {
                    self.value(child);
                }
            }
        }
    }
}
