//! Java language parser using tree-sitter

use super::lower::lower;
use crate::language::parser::LanguageParser;
use crate::tree::SyntaxTree;
use anyhow::{Context, Result};
use tree_sitter::Parser;

/// Java parser using tree-sitter
///
/// The concrete tree-sitter tree is lowered into the shared syntax tree:
/// methods and constructors become function declarations, class bodies
/// become type declarations, and `for` loops keep the five-child layout the
/// listener expects.
#[derive(Debug, Clone, Copy)]
pub struct JavaParser;

impl JavaParser {
    /// Create a new Java parser
    pub fn new() -> Result<Self> {
        // Just validate that we can create a parser
        let mut parser = Parser::new();
        let language = tree_sitter_java::LANGUAGE;
        parser
            .set_language(&language.into())
            .context("Failed to set Java language for parser")?;
        Ok(JavaParser)
    }
}

impl LanguageParser for JavaParser {
    fn parse(&self, source: &str, filename: &str) -> Result<SyntaxTree> {
        // tree-sitter parsers need `&mut`, so each parse gets its own
        let mut parser = Parser::new();
        let language = tree_sitter_java::LANGUAGE;
        parser
            .set_language(&language.into())
            .context("Failed to set Java language")?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse Java file: {}", filename))?;

        lower(&tree, source).with_context(|| format!("Failed to lower Java file: {}", filename))
    }
}
