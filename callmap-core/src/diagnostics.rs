//! Non-fatal problems found while walking a syntax tree
//!
//! A node whose shape does not match what its production promises yields a
//! [`ClassificationError`]. The listener turns each one into a [`Diagnostic`],
//! skips the offending subtree, and keeps walking.

use crate::tree::{Node, NodeKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A node did not have the shape its kind requires
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("{parent} at line {line} is missing its {expected}")]
    MissingChild {
        parent: NodeKind,
        expected: &'static str,
        line: u32,
        column: u32,
    },

    #[error("{parent} at line {line}: expected {expected}, found {found}")]
    UnexpectedChild {
        parent: NodeKind,
        expected: &'static str,
        found: NodeKind,
        line: u32,
        column: u32,
    },

    #[error("loop at line {line} has a {found} body instead of a block")]
    LoopBodyNotBlock { found: NodeKind, line: u32, column: u32 },
}

impl ClassificationError {
    pub fn missing(parent: Node<'_>, expected: &'static str) -> Self {
        let span = parent.span();
        ClassificationError::MissingChild {
            parent: parent.kind(),
            expected,
            line: span.start_line,
            column: span.start_col,
        }
    }

    pub fn unexpected(parent: Node<'_>, expected: &'static str, found: Node<'_>) -> Self {
        let span = found.span();
        ClassificationError::UnexpectedChild {
            parent: parent.kind(),
            expected,
            found: found.kind(),
            line: span.start_line,
            column: span.start_col,
        }
    }

    /// Source position (line, column) the error points at
    pub fn position(&self) -> (u32, u32) {
        match self {
            ClassificationError::MissingChild { line, column, .. }
            | ClassificationError::UnexpectedChild { line, column, .. }
            | ClassificationError::LoopBodyNotBlock { line, column, .. } => (*line, *column),
        }
    }
}

/// Category of a reported diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A node's shape did not match its production; the subtree was skipped
    Classification,
    /// The front-end could not fit part of the input into the grammar
    Syntax,
}

/// Non-fatal diagnostic reported alongside a code model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn syntax(node: Node<'_>) -> Self {
        let span = node.span();
        Diagnostic {
            kind: DiagnosticKind::Syntax,
            message: match node.text() {
                "" => "missing syntax".to_string(),
                text => format!("unrecognized syntax {:?}", text),
            },
            line: span.start_line,
            column: span.start_col,
        }
    }
}

impl From<ClassificationError> for Diagnostic {
    fn from(error: ClassificationError) -> Self {
        let (line, column) = error.position();
        Diagnostic {
            kind: DiagnosticKind::Classification,
            message: error.to_string(),
            line,
            column,
        }
    }
}
