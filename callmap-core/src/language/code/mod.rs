//! Native front-end for the Code language

pub mod lexer;
pub mod parser;

pub use parser::CodeParser;
