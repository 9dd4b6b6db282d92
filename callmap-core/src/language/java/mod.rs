//! Java front-end built on tree-sitter

mod lower;
pub mod parser;

pub use parser::JavaParser;
