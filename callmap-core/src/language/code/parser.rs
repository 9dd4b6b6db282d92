//! Recursive-descent parser for the Code language
//!
//! Produces the shared [`SyntaxTree`]. The parser never gives up on a file:
//! a token it cannot place is wrapped in an `Error` node and parsing resumes
//! with the next item.

use super::lexer::{lex, Lexeme, Token};
use crate::language::parser::LanguageParser;
use crate::tree::{NodeKind, SyntaxTree, TreeBuilder};
use anyhow::Result;

/// Parser for `.code` sources
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeParser;

impl CodeParser {
    pub fn new() -> Self {
        CodeParser
    }
}

impl LanguageParser for CodeParser {
    fn parse(&self, source: &str, _filename: &str) -> Result<SyntaxTree> {
        Parser::new(source, lex(source)).compilation_unit()
    }
}

struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
    builder: TreeBuilder,
}

impl Parser {
    fn new(source: &str, lexemes: Vec<Lexeme>) -> Self {
        Parser {
            lexemes,
            pos: 0,
            builder: TreeBuilder::new(source),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<Token> {
        self.lexemes.get(self.pos + offset).map(|l| l.token)
    }

    fn peek(&self) -> Option<Token> {
        self.peek_at(0)
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    /// Move the current lexeme into the tree
    ///
    /// An `Unknown` lexeme always lands inside its own `Error` node.
    fn bump(&mut self) {
        if let Some(lexeme) = self.lexemes.get(self.pos).copied() {
            let unknown = lexeme.token == Token::Unknown;
            if unknown {
                self.builder.start_node(NodeKind::Error);
            }
            self.builder
                .token(lexeme.token.kind(), lexeme.start, lexeme.end);
            if unknown {
                self.builder.finish_node();
            }
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.at(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Wrap the current lexeme in an `Error` node
    fn error_token(&mut self) {
        if self.at(Token::Unknown) {
            self.bump();
            return;
        }
        self.builder.start_node(NodeKind::Error);
        self.bump();
        self.builder.finish_node();
    }

    /// Index just past the `)` of a call starting at `start`, if one does
    ///
    /// A call is `IDENT ('.' IDENT)* '('` followed by a balanced argument list.
    fn call_end(&self, start: usize) -> Option<usize> {
        let token = |i: usize| self.lexemes.get(i).map(|l| l.token);
        let mut i = start;
        if token(i) != Some(Token::Ident) {
            return None;
        }
        i += 1;
        while token(i) == Some(Token::Dot) && token(i + 1) == Some(Token::Ident) {
            i += 2;
        }
        if token(i) != Some(Token::LParen) {
            return None;
        }
        let mut depth = 0usize;
        loop {
            match token(i)? {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                Token::Semi | Token::LBrace | Token::RBrace => return None,
                _ => {}
            }
            i += 1;
        }
    }

    fn at_call(&self) -> bool {
        let token = |i: usize| self.lexemes.get(i).map(|l| l.token);
        let mut i = self.pos;
        if token(i) != Some(Token::Ident) {
            return false;
        }
        i += 1;
        while token(i) == Some(Token::Dot) && token(i + 1) == Some(Token::Ident) {
            i += 2;
        }
        token(i) == Some(Token::LParen)
    }

    /// A call that forms the whole statement: `foo(...);`
    fn at_call_statement(&self) -> bool {
        match self.call_end(self.pos) {
            Some(end) => matches!(
                self.lexemes.get(end).map(|l| l.token),
                None | Some(Token::Semi) | Some(Token::RBrace)
            ),
            None => false,
        }
    }

    fn at_local_variable_declaration(&self) -> bool {
        match self.peek() {
            Some(Token::DeclKeyword) => true,
            Some(Token::PrimitiveType) => self.peek_at(1) == Some(Token::Ident),
            _ => false,
        }
    }

    // compilationUnit : (typeDeclaration | functionDeclaration | expression)* EOF
    fn compilation_unit(mut self) -> Result<SyntaxTree> {
        self.builder.start_node(NodeKind::CompilationUnit);
        while !self.at_eof() {
            if self.at(Token::RBrace) {
                self.error_token();
                continue;
            }
            self.member();
        }
        self.builder.finish_node();
        self.builder.finish()
    }

    /// One item of a compilation unit, type body or function body
    fn member(&mut self) {
        let before = self.pos;
        match self.peek() {
            Some(Token::TypeKeyword) => self.type_declaration(),
            Some(Token::Function) => self.function_declaration(),
            Some(Token::Unknown) => self.error_token(),
            _ => self.expression(),
        }
        if self.pos == before && !self.at_eof() {
            self.error_token();
        }
    }

    // typeDeclaration : ('class'|'struct'|'interface') IDENT '{' member* '}'
    fn type_declaration(&mut self) {
        self.builder.start_node(NodeKind::TypeDeclaration);
        self.bump();
        self.eat(Token::Ident);
        if self.eat(Token::LBrace) {
            while !self.at_eof() && !self.at(Token::RBrace) {
                self.member();
            }
            self.eat(Token::RBrace);
        }
        self.builder.finish_node();
    }

    // functionDeclaration : 'function' IDENT formalParameters functionBody
    fn function_declaration(&mut self) {
        self.builder.start_node(NodeKind::FunctionDeclaration);
        self.bump();
        self.eat(Token::Ident);
        if self.at(Token::LParen) {
            self.formal_parameters();
        }
        if self.at(Token::LBrace) {
            self.function_body();
        }
        self.builder.finish_node();
    }

    // formalParameters : '(' (IDENT (',' IDENT)*)? ')'
    fn formal_parameters(&mut self) {
        self.builder.start_node(NodeKind::FormalParameters);
        self.bump();
        while !self.at_eof() && !self.at(Token::RParen) && !self.at(Token::LBrace) {
            self.bump();
        }
        self.eat(Token::RParen);
        self.builder.finish_node();
    }

    // functionBody : '{' (functionDeclaration | expression)* '}'
    fn function_body(&mut self) {
        self.builder.start_node(NodeKind::FunctionBody);
        self.bump();
        while !self.at_eof() && !self.at(Token::RBrace) {
            self.member();
        }
        self.eat(Token::RBrace);
        self.builder.finish_node();
    }

    // expression : methodCall ';' | blockStatement
    fn expression(&mut self) {
        self.builder.start_node(NodeKind::Expression);
        if self.at_call_statement() {
            self.method_call();
            self.eat(Token::Semi);
        } else {
            self.block_statement();
        }
        self.builder.finish_node();
    }

    // methodCall : IDENT ('.' IDENT)* '(' (parameter (',' parameter)*)? ')'
    fn method_call(&mut self) {
        self.builder.start_node(NodeKind::MethodCall);
        self.bump();
        while self.at(Token::Dot) && self.peek_at(1) == Some(Token::Ident) {
            self.bump();
            self.bump();
        }
        self.bump();
        if !self.at(Token::RParen) {
            loop {
                self.parameter();
                if !self.eat(Token::Comma) {
                    break;
                }
            }
        }
        self.eat(Token::RParen);
        self.builder.finish_node();
    }

    // parameter : IDENT | PRIMITIVE_TYPE | valueExpression
    fn parameter(&mut self) {
        self.builder.start_node(NodeKind::Parameter);
        let bare = matches!(self.peek(), Some(Token::Ident) | Some(Token::PrimitiveType))
            && matches!(self.peek_at(1), Some(Token::Comma) | Some(Token::RParen));
        if bare {
            self.bump();
        } else {
            self.value_expression(&[Token::Comma, Token::RParen]);
        }
        self.builder.finish_node();
    }

    fn value_expression(&mut self, stop: &[Token]) {
        self.builder.start_node(NodeKind::ValueExpression);
        self.value_tokens(stop);
        self.builder.finish_node();
    }

    /// Consume expression tokens up to a `stop` token, `;`, `{` or `}`
    ///
    /// Calls nested anywhere in the expression become `MethodCall` nodes.
    fn value_tokens(&mut self, stop: &[Token]) {
        while let Some(token) = self.peek() {
            if stop.contains(&token) || matches!(token, Token::Semi | Token::LBrace | Token::RBrace)
            {
                break;
            }
            match token {
                Token::Ident if self.at_call() => self.method_call(),
                Token::LParen => {
                    self.bump();
                    self.value_tokens(&[Token::RParen]);
                    self.eat(Token::RParen);
                }
                Token::LBracket => {
                    self.bump();
                    self.value_tokens(&[Token::RBracket]);
                    self.eat(Token::RBracket);
                }
                _ => self.bump(),
            }
        }
    }

    // blockStatement : localVariableDeclaration ';' | statement
    fn block_statement(&mut self) {
        self.builder.start_node(NodeKind::BlockStatement);
        if self.at_local_variable_declaration() {
            self.local_variable_declaration();
            self.eat(Token::Semi);
        } else {
            self.statement();
        }
        self.builder.finish_node();
    }

    // localVariableDeclaration : ('var'|'let'|'val'|'const'|PRIMITIVE_TYPE) variableDeclarators
    fn local_variable_declaration(&mut self) {
        self.builder.start_node(NodeKind::LocalVariableDeclaration);
        self.bump();
        self.builder.start_node(NodeKind::VariableDeclarators);
        loop {
            self.variable_declarator();
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.builder.finish_node();
        self.builder.finish_node();
    }

    // variableDeclarator : variableDeclaratorId ('=' variableInitializer)?
    fn variable_declarator(&mut self) {
        self.builder.start_node(NodeKind::VariableDeclarator);
        if self.at(Token::Ident) {
            self.builder.start_node(NodeKind::VariableDeclaratorId);
            self.bump();
            self.builder.finish_node();
        }
        if self.eat(Token::Assign) {
            self.builder.start_node(NodeKind::VariableInitializer);
            self.value_tokens(&[Token::Comma, Token::RParen]);
            self.builder.finish_node();
        }
        self.builder.finish_node();
    }

    // statement : 'for' '(' forControl ')' statement
    //           | block
    //           | ('if'|'while') '(' valueExpression ')' statement ('else' statement)?
    //           | 'return' valueExpression? ';'
    //           | valueExpression ';'
    fn statement(&mut self) {
        self.builder.start_node(NodeKind::Statement);
        match self.peek() {
            Some(Token::For) => {
                self.bump();
                if self.eat(Token::LParen) {
                    self.for_control();
                    self.eat(Token::RParen);
                }
                if !self.at_eof() && !self.at(Token::RBrace) {
                    self.statement();
                }
            }
            Some(Token::LBrace) => self.block(),
            Some(Token::If) | Some(Token::While) => {
                self.bump();
                if self.eat(Token::LParen) {
                    self.value_expression(&[Token::RParen]);
                    self.eat(Token::RParen);
                }
                if !self.at_eof() && !self.at(Token::RBrace) {
                    self.statement();
                }
                if self.eat(Token::Else) && !self.at_eof() && !self.at(Token::RBrace) {
                    self.statement();
                }
            }
            Some(Token::Return) => {
                self.bump();
                if !self.at(Token::Semi) && !self.at(Token::RBrace) && !self.at_eof() {
                    self.value_expression(&[]);
                }
                self.eat(Token::Semi);
            }
            _ => {
                self.value_expression(&[]);
                self.eat(Token::Semi);
            }
        }
        self.builder.finish_node();
    }

    // forControl : everything between the loop's parentheses
    fn for_control(&mut self) {
        self.builder.start_node(NodeKind::ForControl);
        loop {
            match self.peek() {
                None | Some(Token::RParen) | Some(Token::LBrace) | Some(Token::RBrace) => break,
                Some(Token::Semi) => self.bump(),
                _ if self.at_local_variable_declaration() => self.local_variable_declaration(),
                _ => {
                    let before = self.pos;
                    self.value_tokens(&[Token::RParen]);
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
        self.builder.finish_node();
    }

    // block : '{' blockStatement* '}'
    fn block(&mut self) {
        self.builder.start_node(NodeKind::Block);
        self.bump();
        while !self.at_eof() && !self.at(Token::RBrace) {
            let before = self.pos;
            self.block_statement();
            if self.pos == before {
                self.error_token();
            }
        }
        self.eat(Token::RBrace);
        self.builder.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, TokenKind};

    fn parse(source: &str) -> SyntaxTree {
        CodeParser::new().parse(source, "test.code").unwrap()
    }

    fn kinds(node: Node<'_>) -> Vec<NodeKind> {
        node.children().map(|c| c.kind()).collect()
    }

    fn find(node: Node<'_>, kind: NodeKind) -> Option<Node<'_>> {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.kind() == kind {
                return Some(current);
            }
            stack.extend(current.children().rev());
        }
        None
    }

    #[test]
    fn test_parse_function_declaration() {
        let tree = parse("function foo(a, b) { bar(a); }");
        let function = tree.root().first_child().unwrap();
        assert_eq!(function.kind(), NodeKind::FunctionDeclaration);
        assert_eq!(
            kinds(function),
            vec![
                NodeKind::Token(TokenKind::Keyword),
                NodeKind::Token(TokenKind::Identifier),
                NodeKind::FormalParameters,
                NodeKind::FunctionBody,
            ]
        );
        assert_eq!(function.child(1).unwrap().text(), "foo");
        assert_eq!(function.child(2).unwrap().text(), "(a, b)");
    }

    #[test]
    fn test_body_call_is_expression_method_call() {
        let tree = parse("function foo() { bar(1, \"x\"); }");
        let call = find(tree.root(), NodeKind::MethodCall).unwrap();
        assert_eq!(call.text(), "bar(1, \"x\")");
        assert_eq!(call.parent().unwrap().kind(), NodeKind::Expression);
        assert_eq!(call.ancestor(2).unwrap().kind(), NodeKind::FunctionBody);
        let params: Vec<&str> = call
            .children_of_kind(NodeKind::Parameter)
            .map(|p| p.text())
            .collect();
        assert_eq!(params, vec!["1", "\"x\""]);
    }

    #[test]
    fn test_bare_identifier_parameter_is_a_token() {
        let tree = parse("class A { make(Widget, w.size()); }");
        let call = find(tree.root(), NodeKind::MethodCall).unwrap();
        assert_eq!(call.ancestor(2).unwrap().kind(), NodeKind::TypeDeclaration);
        let params: Vec<Node<'_>> = call.children_of_kind(NodeKind::Parameter).collect();
        assert!(params[0].first_child().unwrap().is_token());
        assert_eq!(params[1].first_child().unwrap().kind(), NodeKind::ValueExpression);
    }

    #[test]
    fn test_for_statement_layout() {
        let tree = parse("function f() { for (i=0;i<3;i++) { baz(); } }");
        let statement = find(tree.root(), NodeKind::Statement).unwrap();
        assert!(statement.first_child().unwrap().is_keyword("for"));
        let control = statement.child(2).unwrap();
        assert_eq!(control.kind(), NodeKind::ForControl);
        assert_eq!(control.text(), "i=0;i<3;i++");
        let body = statement.child(4).unwrap();
        assert_eq!(body.kind(), NodeKind::Statement);
        let block = body.first_child().unwrap();
        assert_eq!(block.kind(), NodeKind::Block);
        let lines: Vec<&str> = block
            .children_of_kind(NodeKind::BlockStatement)
            .map(|s| s.text())
            .collect();
        assert_eq!(lines, vec!["baz();"]);
    }

    #[test]
    fn test_local_variable_declaration() {
        let tree = parse("function f() { var x = g(1), y; }");
        let declarators = find(tree.root(), NodeKind::VariableDeclarators).unwrap();
        let parts: Vec<&str> = declarators
            .children_of_kind(NodeKind::VariableDeclarator)
            .map(|d| d.text())
            .collect();
        assert_eq!(parts, vec!["x = g(1)", "y"]);
        let initializer = find(declarators, NodeKind::VariableInitializer).unwrap();
        assert_eq!(initializer.text(), "g(1)");
    }

    #[test]
    fn test_typed_declaration_in_for_control() {
        let tree = parse("for (int i = 0; i < n; i++) { }");
        let control = find(tree.root(), NodeKind::ForControl).unwrap();
        assert_eq!(control.text(), "int i = 0; i < n; i++");
        assert!(find(control, NodeKind::LocalVariableDeclaration).is_some());
    }

    #[test]
    fn test_nested_function_declaration() {
        let tree = parse("function outer() { function inner() { a(); } b(); }");
        let body = find(tree.root(), NodeKind::FunctionBody).unwrap();
        assert_eq!(
            kinds(body)
                .into_iter()
                .filter(|k| !k.is_token())
                .collect::<Vec<_>>(),
            vec![NodeKind::FunctionDeclaration, NodeKind::Expression]
        );
    }

    #[test]
    fn test_stray_brace_becomes_error_node() {
        let tree = parse("} foo();");
        let first = tree.root().first_child().unwrap();
        assert_eq!(first.kind(), NodeKind::Error);
        assert_eq!(first.text(), "}");
        assert!(find(tree.root(), NodeKind::MethodCall).is_some());
    }

    #[test]
    fn test_unclosed_body_still_parses() {
        let tree = parse("function f() { a();");
        let function = tree.root().first_child().unwrap();
        assert_eq!(function.kind(), NodeKind::FunctionDeclaration);
        assert!(find(function, NodeKind::MethodCall).is_some());
    }

    #[test]
    fn test_empty_source() {
        let tree = parse("");
        assert_eq!(tree.root().kind(), NodeKind::CompilationUnit);
        assert_eq!(tree.root().child_count(), 0);
    }

    #[test]
    fn test_unknown_character_becomes_error_node() {
        let tree = parse("function f() { g(x @ y); }");
        let error = find(tree.root(), NodeKind::Error).unwrap();
        assert_eq!(error.text(), "@");
        assert_eq!(error.parent().map(|p| p.kind()), Some(NodeKind::ValueExpression));
        let call = find(tree.root(), NodeKind::MethodCall).unwrap();
        assert_eq!(call.text(), "g(x @ y)");
    }

    #[test]
    fn test_unknown_character_at_top_level() {
        let tree = parse("# function f() { }");
        let kinds = kinds(tree.root());
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[1], NodeKind::FunctionDeclaration);
        assert!(find(tree.root(), NodeKind::Error).is_some());
    }
}
