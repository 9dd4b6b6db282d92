//! Language-agnostic code model produced by one traversal pass

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier to initializer text (empty when the declarator has none)
pub type VariableMap = BTreeMap<String, String>;

/// Everything extracted from one compilation unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeModel {
    pub functions: Vec<Function>,
    /// Calls made at type-declaration scope, outside any function body
    pub top_level_calls: Vec<FunctionCall>,
    pub variables: VariableMap,
}

/// Declared function or method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub position: Position,
    /// Calls made directly in the function body, in source order
    pub calls: Vec<FunctionCall>,
    pub variables: VariableMap,
}

impl Function {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Function {
            name: name.into(),
            position,
            calls: Vec::new(),
            variables: VariableMap::new(),
        }
    }
}

/// Where a function was declared
///
/// Lines come from the declaration's first and last tokens. Both columns are
/// the column of the function's name token, not of the declaration itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start_line: u32,
    pub start_column: u32,
    pub stop_line: u32,
    pub stop_column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub kind: ParameterKind,
    /// Raw source text of the argument
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterKind {
    /// A bare identifier or type token, e.g. `Widget` or `int`
    TypeReference,
    /// Any composed expression, e.g. `1 + 2` or `"abc"`
    ValueExpression,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::TypeReference => "type-reference",
            ParameterKind::ValueExpression => "value-expression",
        }
    }
}

/// Shallow capture of a `for` loop
///
/// Built for loops found in function bodies; it is not attached to
/// [`Function`] or [`CodeModel`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStatement {
    /// Raw text between the loop's parentheses
    pub condition: String,
    /// Raw text of each statement directly inside the loop body
    pub body_lines: Vec<String>,
}

impl BlockStatement {
    pub fn is_empty(&self) -> bool {
        self.condition.is_empty() && self.body_lines.is_empty()
    }
}
