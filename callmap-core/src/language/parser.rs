//! Language-agnostic parser trait

use crate::tree::SyntaxTree;
use anyhow::Result;

/// Language-agnostic parser interface
///
/// Each supported language implements this trait to turn source code into
/// the shared [`SyntaxTree`] that the listener walks.
pub trait LanguageParser {
    /// Parse source code into a syntax tree
    ///
    /// # Arguments
    ///
    /// * `source` - The source code to parse
    /// * `filename` - The name of the file being parsed (for error messages)
    ///
    /// Recoverable syntax errors are kept in the tree as `Error` nodes. An
    /// `Err` means the file could not be turned into a tree at all.
    fn parse(&self, source: &str, filename: &str) -> Result<SyntaxTree>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, TokenKind, TreeBuilder};

    // Wraps every whitespace-separated word in one identifier token
    struct WordParser;

    impl LanguageParser for WordParser {
        fn parse(&self, source: &str, filename: &str) -> Result<SyntaxTree> {
            if source.contains('#') {
                anyhow::bail!("unsupported character in {}", filename);
            }
            let mut builder = TreeBuilder::new(source);
            builder.start_node(NodeKind::CompilationUnit);
            let mut offset = 0;
            for word in source.split(' ') {
                if !word.is_empty() {
                    builder.token(TokenKind::Identifier, offset, offset + word.len());
                }
                offset += word.len() + 1;
            }
            builder.finish_node();
            builder.finish()
        }
    }

    #[test]
    fn test_parser_trait() {
        let tree = WordParser.parse("a bb ccc", "test.code").unwrap();
        let words: Vec<&str> = tree.root().children().map(|c| c.text()).collect();
        assert_eq!(words, vec!["a", "bb", "ccc"]);
    }

    #[test]
    fn test_parser_trait_object() {
        let parser: Box<dyn LanguageParser> = Box::new(WordParser);
        let tree = parser.parse("", "empty.code").unwrap();
        assert_eq!(tree.root().child_count(), 0);
    }

    #[test]
    fn test_parse_error_mentions_file() {
        let error = WordParser.parse("a # b", "bad.code").unwrap_err();
        assert!(error.to_string().contains("bad.code"));
    }
}
