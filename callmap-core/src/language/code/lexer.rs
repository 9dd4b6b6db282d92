//! Lexer for the Code language

use crate::tree::TokenKind;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // Keywords
    #[token("function")]
    Function,
    #[token("class")]
    #[token("struct")]
    #[token("interface")]
    TypeKeyword,
    #[token("for")]
    For,
    #[token("if")]
    If,
    #[token("while")]
    While,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("var")]
    #[token("let")]
    #[token("val")]
    #[token("const")]
    DeclKeyword,

    #[token("int")]
    #[token("long")]
    #[token("short")]
    #[token("byte")]
    #[token("float")]
    #[token("double")]
    #[token("boolean")]
    #[token("bool")]
    #[token("char")]
    #[token("void")]
    PrimitiveType,

    // Literals
    #[token("true")]
    #[token("false")]
    #[token("null")]
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?")]
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Literal,

    #[regex(r"[\p{XID_Start}_$][\p{XID_Continue}$]*")]
    Ident,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,

    // Operators
    #[token("=")]
    Assign,
    #[token("++")]
    #[token("--")]
    #[token("&&")]
    #[token("||")]
    #[token("==")]
    #[token("<<")]
    #[token(">>")]
    #[token("->")]
    #[regex(r"[+\-*/%<>!&|^~?:]=?")]
    Operator,

    /// Input the lexer has no rule for; produced by [`lex`], never matched
    Unknown,
}

impl Token {
    /// Tree token class for this lexeme
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Function
            | Token::TypeKeyword
            | Token::For
            | Token::If
            | Token::While
            | Token::Else
            | Token::Return
            | Token::DeclKeyword => TokenKind::Keyword,
            Token::PrimitiveType => TokenKind::PrimitiveType,
            Token::Literal => TokenKind::Literal,
            Token::Ident => TokenKind::Identifier,
            Token::Assign | Token::Operator => TokenKind::Operator,
            Token::LParen
            | Token::RParen
            | Token::LBrace
            | Token::RBrace
            | Token::LBracket
            | Token::RBracket
            | Token::Comma
            | Token::Semi
            | Token::Dot
            | Token::Unknown => TokenKind::Punctuation,
        }
    }
}

/// A token with its byte range in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Split `source` into lexemes, dropping whitespace and comments
///
/// Characters no rule matches become `Token::Unknown` lexemes.
pub fn lex(source: &str) -> Vec<Lexeme> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| Lexeme {
            token: result.unwrap_or(Token::Unknown),
            start: span.start,
            end: span.end,
        })
        .collect()
}
