//! Pre-order tree walk with per-case entry callbacks

use crate::classify::{classify, SyntacticCase};
use crate::tree::{Node, SyntaxTree};

/// Whether the walk should descend into the node just entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    SkipChildren,
}

/// Entry callbacks fired by [`walk`], one per syntactic case
///
/// Every callback defaults to doing nothing and descending.
pub trait TreeListener {
    fn enter_type_declaration(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_function_declaration(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_function_body(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_method_call(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_block_statement(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_local_variable_declaration(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_variable_declarators(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_for_statement(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_statement(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }

    fn enter_error(&mut self, _node: Node<'_>) -> WalkControl {
        WalkControl::Continue
    }
}

fn dispatch<L: TreeListener + ?Sized>(node: Node<'_>, listener: &mut L) -> WalkControl {
    match classify(node) {
        SyntacticCase::TypeDeclaration => listener.enter_type_declaration(node),
        SyntacticCase::FunctionDeclaration => listener.enter_function_declaration(node),
        SyntacticCase::FunctionBody => listener.enter_function_body(node),
        SyntacticCase::MethodCall => listener.enter_method_call(node),
        SyntacticCase::BlockStatement => listener.enter_block_statement(node),
        SyntacticCase::LocalVariableDeclaration => {
            listener.enter_local_variable_declaration(node)
        }
        SyntacticCase::VariableDeclarators => listener.enter_variable_declarators(node),
        SyntacticCase::ForStatement => listener.enter_for_statement(node),
        SyntacticCase::Statement => listener.enter_statement(node),
        SyntacticCase::Error => listener.enter_error(node),
        SyntacticCase::Other => WalkControl::Continue,
    }
}

/// Walk `tree` depth-first in document order, firing entry callbacks
///
/// Uses an explicit stack, so deeply nested input cannot overflow the call
/// stack. Token nodes are never visited.
pub fn walk<L: TreeListener + ?Sized>(tree: &SyntaxTree, listener: &mut L) {
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        if dispatch(node, listener) == WalkControl::SkipChildren {
            continue;
        }
        stack.extend(node.children().rev().filter(|child| !child.is_token()));
    }
}
