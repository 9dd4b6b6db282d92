//! Language detection and front-end layer
//!
//! Every supported language is parsed into the same [`crate::tree::SyntaxTree`],
//! so the listener never sees language-specific node types.

pub mod code;
pub mod java;
pub mod parser;
pub mod span;
pub mod tree_sitter_utils;

use std::path::Path;

use anyhow::Result;

pub use code::CodeParser;
pub use java::JavaParser;
pub use parser::LanguageParser;
pub use span::{LineIndex, SourceSpan};

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    /// The Code language (.code)
    Code,
    /// Java (.java)
    Java,
}

impl Language {
    /// Every supported language, in display order
    pub const ALL: [Language; 2] = [Language::Code, Language::Java];

    /// Detect language from file extension
    ///
    /// Returns `None` if the extension is not recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "code" => Some(Language::Code),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    /// Detect language from file path
    ///
    /// Returns `None` if the file has no extension or the extension is not recognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the canonical name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Language::Code => "Code",
            Language::Java => "Java",
        }
    }

    /// Get file extensions for this language
    ///
    /// Returns a list of file extensions (without the dot) that this language uses.
    pub fn extensions(&self) -> &[&'static str] {
        match self {
            Language::Code => &["code"],
            Language::Java => &["java"],
        }
    }
}

/// Front-end parser for `language`
pub fn parser_for(language: Language) -> Result<Box<dyn LanguageParser>> {
    Ok(match language {
        Language::Code => Box::new(CodeParser::new()),
        Language::Java => Box::new(JavaParser::new()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("code"), Some(Language::Code));
        assert_eq!(Language::from_extension("java"), Some(Language::Java));
    }

    #[test]
    fn test_from_extension_unknown() {
        assert_eq!(Language::from_extension("go"), None);
        assert_eq!(Language::from_extension("Java"), None);
        assert_eq!(Language::from_extension(""), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(Path::new("src/main.code")),
            Some(Language::Code)
        );
        assert_eq!(
            Language::from_path(Path::new("src/com/acme/Widget.java")),
            Some(Language::Java)
        );
        assert_eq!(Language::from_path(Path::new("README.md")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_name() {
        assert_eq!(Language::Code.name(), "Code");
        assert_eq!(Language::Java.name(), "Java");
    }

    #[test]
    fn test_extensions_round_trip() {
        for language in Language::ALL {
            for ext in language.extensions() {
                assert_eq!(Language::from_extension(ext), Some(language));
            }
        }
    }

    #[test]
    fn test_parser_for_each_language() {
        let code = parser_for(Language::Code)
            .unwrap()
            .parse("function f() { g(); }", "f.code")
            .unwrap();
        assert!(!code.is_empty());

        let java = parser_for(Language::Java)
            .unwrap()
            .parse("class A { void f() { g(); } }", "A.java")
            .unwrap();
        assert!(!java.is_empty());
    }
}
