//! Traversal driver that builds a [`CodeModel`] in one pass
//!
//! Global invariants enforced:
//! - One listener per compilation unit; state is never shared between parses
//! - Each function declaration is appended exactly once, when entered
//! - A call node contributes at most one `FunctionCall`
//! - Malformed nodes become diagnostics; the walk never aborts

use crate::builder::build_call;
use crate::classify::{
    classify, declarators, local_variable_declarators, FunctionDeclarationView, MethodCallView,
    SyntacticCase,
};
use crate::diagnostics::{ClassificationError, Diagnostic};
use crate::model::{CodeModel, Function, VariableMap};
use crate::statement::extract_block;
use crate::tree::{Node, NodeId, SyntaxTree};
use crate::walk::{walk, TreeListener, WalkControl};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Which declarators land in `CodeModel::variables`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableScope {
    /// Skip declarators already recorded into a function's own variables
    ///
    /// Only the declarations a function body scan sees directly are
    /// skipped. Declarators in `for` controls or nested blocks inside a
    /// function still land in the map.
    #[default]
    Deduplicated,
    /// Record every declarator in the tree, function-local ones included
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub variable_scope: VariableScope,
}

/// Model plus the non-fatal diagnostics raised while building it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub model: CodeModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Mutable state of one traversal
#[derive(Debug, Default)]
struct TraversalContext {
    model: CodeModel,
    /// Index into `model.functions` of the function entered last
    current_function: Option<usize>,
    top_level_variables: VariableMap,
    /// Call and declarator nodes already consumed by a function body scan
    recorded: HashSet<NodeId>,
    /// Nodes that already produced a diagnostic
    reported: HashSet<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

/// Listener that accumulates functions, calls and variables
#[derive(Debug, Default)]
pub struct CodeListener {
    options: ListenerOptions,
    context: TraversalContext,
}

impl CodeListener {
    pub fn new(options: ListenerOptions) -> Self {
        CodeListener {
            options,
            context: TraversalContext::default(),
        }
    }

    /// Hand over the finished model
    pub fn finalize(self) -> CodeModel {
        self.finish().model
    }

    /// Hand over the finished model together with its diagnostics
    pub fn finish(self) -> Extraction {
        let TraversalContext {
            mut model,
            top_level_variables,
            diagnostics,
            ..
        } = self.context;
        model.variables = top_level_variables;
        Extraction { model, diagnostics }
    }

    fn report(&mut self, node: Node<'_>, error: ClassificationError) {
        if !self.context.reported.insert(node.id()) {
            return;
        }
        warn!("skipping malformed {}: {}", node.kind(), error);
        self.context.diagnostics.push(error.into());
    }

    /// Record the declarators of one `LocalVariableDeclaration` into `target`
    fn record_local_variables(&mut self, declaration: Node<'_>, target: &mut VariableMap) {
        let list = match local_variable_declarators(declaration) {
            Ok(list) => list,
            Err(error) => {
                self.report(declaration, error);
                return;
            }
        };
        for (declarator, view) in declarators(list) {
            self.context.recorded.insert(declarator.id());
            match view {
                Ok(view) => {
                    target.insert(view.identifier().to_string(), view.initializer().to_string());
                }
                Err(error) => self.report(declarator, error),
            }
        }
    }

    /// Scan the statements directly in a function body, not nested blocks
    fn scan_function_body(&mut self, declaration: FunctionDeclarationView<'_>, function: &mut Function) {
        for expression in declaration.body_expressions() {
            let Some(first) = expression.first_child() else {
                continue;
            };
            match classify(first) {
                SyntacticCase::MethodCall => {
                    self.context.recorded.insert(first.id());
                    match MethodCallView::from_node(first) {
                        Ok(call) => function.calls.push(build_call(call.parameters(), call.name())),
                        Err(error) => self.report(first, error),
                    }
                }
                SyntacticCase::BlockStatement => {
                    let Some(inner) = first.first_child() else {
                        continue;
                    };
                    match classify(inner) {
                        SyntacticCase::LocalVariableDeclaration => {
                            self.record_local_variables(inner, &mut function.variables);
                        }
                        SyntacticCase::ForStatement | SyntacticCase::Statement => {
                            match extract_block(inner) {
                                // Loop captures have no place in the model yet
                                Ok(block) if !block.is_empty() => debug!(
                                    function = %function.name,
                                    condition = %block.condition,
                                    lines = block.body_lines.len(),
                                    "captured for loop"
                                ),
                                Ok(_) => {}
                                Err(error) => self.report(inner, error),
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }
}

impl TreeListener for CodeListener {
    fn enter_method_call(&mut self, node: Node<'_>) -> WalkControl {
        if self.context.recorded.contains(&node.id()) {
            return WalkControl::Continue;
        }

        // Expression > MethodCall: the grandparent is the lexical context
        let context = node.ancestor(2).map(classify);
        let target = match context {
            Some(SyntacticCase::TypeDeclaration) => None,
            Some(SyntacticCase::FunctionBody) => match self.context.current_function {
                Some(index) => Some(index),
                None => return WalkControl::Continue,
            },
            _ => {
                trace!(call = node.text(), "call outside a recognized context");
                return WalkControl::Continue;
            }
        };

        let view = match MethodCallView::from_node(node) {
            Ok(view) => view,
            Err(error) => {
                self.report(node, error);
                return WalkControl::SkipChildren;
            }
        };
        let call = build_call(view.parameters(), view.name());
        self.context.recorded.insert(node.id());
        match target {
            None => self.context.model.top_level_calls.push(call),
            Some(index) => self.context.model.functions[index].calls.push(call),
        }
        WalkControl::Continue
    }

    fn enter_function_declaration(&mut self, node: Node<'_>) -> WalkControl {
        let declaration = match FunctionDeclarationView::from_node(node) {
            Ok(view) => view,
            Err(error) => {
                self.report(node, error);
                return WalkControl::SkipChildren;
            }
        };

        let mut function = Function::new(declaration.name(), declaration.position());
        self.scan_function_body(declaration, &mut function);

        self.context.model.functions.push(function);
        self.context.current_function = Some(self.context.model.functions.len() - 1);
        WalkControl::Continue
    }

    fn enter_variable_declarators(&mut self, node: Node<'_>) -> WalkControl {
        for (declarator, view) in declarators(node) {
            if self.options.variable_scope == VariableScope::Deduplicated
                && self.context.recorded.contains(&declarator.id())
            {
                continue;
            }
            match view {
                Ok(view) => {
                    self.context
                        .top_level_variables
                        .insert(view.identifier().to_string(), view.initializer().to_string());
                }
                Err(error) => self.report(declarator, error),
            }
        }
        WalkControl::Continue
    }

    fn enter_error(&mut self, node: Node<'_>) -> WalkControl {
        if self.context.reported.insert(node.id()) {
            debug!(text = node.text(), "syntax error node");
            self.context.diagnostics.push(Diagnostic::syntax(node));
        }
        WalkControl::Continue
    }
}

/// Run a fresh listener over `tree`
pub fn extract(tree: &SyntaxTree, options: ListenerOptions) -> Extraction {
    let mut listener = CodeListener::new(options);
    walk(tree, &mut listener);
    listener.finish()
}
