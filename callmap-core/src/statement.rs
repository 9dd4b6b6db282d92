//! Shallow extraction of control-flow statements
//!
//! Only `for` loops are understood. Every other statement yields an empty
//! [`BlockStatement`]; that is a coverage limit, not an error.

use crate::classify::{classify, ForStatementView, SyntacticCase};
use crate::diagnostics::ClassificationError;
use crate::model::BlockStatement;
use crate::tree::Node;

/// Extract the condition and body lines of a `for` statement
///
/// Fails only when the node claims to be a `for` loop but does not have
/// the loop's shape.
pub fn extract_block(statement: Node<'_>) -> Result<BlockStatement, ClassificationError> {
    match classify(statement) {
        SyntacticCase::ForStatement => {
            let view = ForStatementView::from_node(statement)?;
            Ok(BlockStatement {
                condition: view.control_clause().text().to_string(),
                body_lines: view
                    .body_statements()
                    .map(|line| line.text().to_string())
                    .collect(),
            })
        }
        _ => Ok(BlockStatement::default()),
    }
}
