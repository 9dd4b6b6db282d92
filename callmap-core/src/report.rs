//! Per-file results and their text/JSON rendering

use crate::diagnostics::Diagnostic;
use crate::model::{CodeModel, FunctionCall, VariableMap};
use serde::{Deserialize, Serialize};

/// Extraction result for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileModel {
    pub file: String,
    pub language: String,
    pub model: CodeModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Sort file models deterministically by path
pub fn sort_models(mut models: Vec<FileModel>) -> Vec<FileModel> {
    models.sort_by(|a, b| a.file.cmp(&b.file));
    models
}

fn format_call(call: &FunctionCall) -> String {
    let parameters = call
        .parameters
        .iter()
        .map(|p| format!("{}: {}", p.text, p.kind.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", call.name, parameters)
}

fn push_variables(output: &mut String, indent: &str, variables: &VariableMap) {
    for (name, initializer) in variables {
        if initializer.is_empty() {
            output.push_str(&format!("{}var {}\n", indent, name));
        } else {
            output.push_str(&format!("{}var {} = {}\n", indent, name, initializer));
        }
    }
}

/// Render file models as text output
pub fn render_text(models: &[FileModel]) -> String {
    let mut output = String::new();

    for file in models {
        output.push_str(&format!("{} ({})\n", file.file, file.language));

        for function in &file.model.functions {
            let p = &function.position;
            output.push_str(&format!(
                "  function {} [{}:{}-{}:{}]\n",
                function.name, p.start_line, p.start_column, p.stop_line, p.stop_column
            ));
            for call in &function.calls {
                output.push_str(&format!("    call {}\n", format_call(call)));
            }
            push_variables(&mut output, "    ", &function.variables);
        }

        for call in &file.model.top_level_calls {
            output.push_str(&format!("  type-scope call {}\n", format_call(call)));
        }
        push_variables(&mut output, "  ", &file.model.variables);

        for diagnostic in &file.diagnostics {
            output.push_str(&format!(
                "  warning {}:{}: {}\n",
                diagnostic.line, diagnostic.column, diagnostic.message
            ));
        }
    }

    let functions: usize = models.iter().map(|m| m.model.functions.len()).sum();
    let diagnostics: usize = models.iter().map(|m| m.diagnostics.len()).sum();
    output.push_str(&format!(
        "{} file(s), {} function(s), {} diagnostic(s)\n",
        models.len(),
        functions,
        diagnostics
    ));

    output
}

/// Render file models as JSON output
pub fn render_json(models: &[FileModel]) -> String {
    serde_json::to_string_pretty(models).unwrap_or_else(|_| "[]".to_string())
}
