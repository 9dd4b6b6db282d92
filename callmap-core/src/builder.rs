//! Function-call record construction

use crate::model::{FunctionCall, Parameter, ParameterKind};
use crate::tree::Node;

/// Kind of a `Parameter` node, decided by its first child alone
///
/// A raw token first child (a bare identifier or type) makes it a type
/// reference; a composed expression, or no child at all, a value.
pub fn parameter_kind(parameter: Node<'_>) -> ParameterKind {
    match parameter.first_child() {
        Some(child) if child.is_token() => ParameterKind::TypeReference,
        _ => ParameterKind::ValueExpression,
    }
}

/// Build a call record from its parameter nodes, preserving their order
pub fn build_call<'t>(parameters: impl IntoIterator<Item = Node<'t>>, name: &str) -> FunctionCall {
    let parameters = parameters
        .into_iter()
        .map(|parameter| Parameter {
            kind: parameter_kind(parameter),
            text: parameter.text().to_string(),
        })
        .collect();

    FunctionCall {
        name: name.to_string(),
        parameters,
    }
}
