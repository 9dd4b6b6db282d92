//! callmap core library - functions, calls and variables extracted from syntax trees

#![deny(warnings)]

// Global invariants enforced in this crate:
// - One listener per compilation unit; no state survives a traversal
// - No global mutable state
// - Deterministic traversal order must be explicit
// - Identical input yields byte-for-byte identical output

pub mod builder;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod language;
pub mod listener;
pub mod model;
pub mod report;
pub mod statement;
pub mod tree;
pub mod walk;

pub use config::ResolvedConfig;
pub use diagnostics::{ClassificationError, Diagnostic, DiagnosticKind};
pub use language::Language;
pub use listener::{extract, CodeListener, Extraction, ListenerOptions, VariableScope};
pub use model::{BlockStatement, CodeModel, Function, FunctionCall, Parameter, ParameterKind};
pub use report::{render_json, render_text, sort_models, FileModel};
pub use tree::SyntaxTree;

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parse one source text and extract its code model
///
/// The language is chosen from `filename`'s extension.
pub fn extract_source(source: &str, filename: &str, options: ListenerOptions) -> Result<FileModel> {
    let language = Language::from_path(Path::new(filename))
        .with_context(|| format!("unsupported file type: {}", filename))?;
    let parser = language::parser_for(language)?;
    let tree = parser.parse(source, filename)?;
    let Extraction { model, diagnostics } = extract(&tree, options);

    for diagnostic in &diagnostics {
        warn!(
            file = filename,
            line = diagnostic.line,
            column = diagnostic.column,
            "{}",
            diagnostic.message
        );
    }

    Ok(FileModel {
        file: filename.to_string(),
        language: language.name().to_string(),
        model,
        diagnostics,
    })
}

/// Read and extract one file
pub fn extract_file(path: &Path, options: ListenerOptions) -> Result<FileModel> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    extract_source(&source, &path.display().to_string(), options)
}

/// Extract every supported file at `path` (file or directory)
///
/// Files are processed in parallel, each with its own listener. Files that
/// cannot be read or parsed are logged and skipped.
pub fn analyze(path: &Path, config: &ResolvedConfig) -> Result<Vec<FileModel>> {
    let source_files: Vec<PathBuf> = collect_source_files(path)?
        .into_iter()
        .filter(|file| config.should_include(file))
        .collect();
    debug!(files = source_files.len(), "collected source files");

    let options = config.listener_options();
    let results: Vec<Result<FileModel>> = source_files
        .par_iter()
        .map(|file| extract_file(file, options))
        .collect();

    let mut models = Vec::with_capacity(results.len());
    let mut skipped_files: usize = 0;
    for (file, result) in source_files.iter().zip(results) {
        match result {
            Ok(model) => models.push(model),
            Err(e) => {
                warn!("skipping file {}: {:#}", file.display(), e);
                skipped_files += 1;
            }
        }
    }
    if skipped_files > 0 {
        warn!("Skipped {} file(s) due to extraction errors", skipped_files);
    }

    Ok(sort_models(models))
}

/// Check if a file is a supported source file
fn is_supported_source_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension)
        .is_some()
}

/// Collect all supported source files from a path (file or directory)
///
/// Supported languages and extensions:
/// - Code: .code
/// - Java: .java
fn collect_source_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            if is_supported_source_file(filename) {
                files.push(path.to_path_buf());
            }
        }
    } else if path.is_dir() {
        collect_source_files_recursive(path, &mut files)?;
    }

    // Sort files for deterministic order
    files.sort();

    Ok(files)
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.')
        || name == "node_modules"
        || name == "build"
        || name == "out"
        || name == "target"
}

/// Process one directory entry, pushing source files or recursing into dirs
fn process_dir_entry(
    path: PathBuf,
    metadata: std::fs::Metadata,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    use std::ffi::OsStr;

    if metadata.is_symlink() {
        return Ok(());
    }

    if metadata.is_dir() {
        if let Some(name) = path.file_name().and_then(|n: &OsStr| n.to_str()) {
            if is_skipped_dir(name) {
                return Ok(());
            }
        }
        collect_source_files_recursive(&path, files)?;
    } else if metadata.is_file() {
        if let Some(filename) = path.file_name().and_then(|n: &OsStr| n.to_str()) {
            if is_supported_source_file(filename) {
                files.push(path);
            }
        }
    }

    Ok(())
}

/// Recursively collect supported source files from a directory
fn collect_source_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry_result in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry_result?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
        process_dir_entry(path, metadata, files)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_supported_source_file() {
        assert!(is_supported_source_file("main.code"));
        assert!(is_supported_source_file("Widget.java"));
        assert!(!is_supported_source_file("README.md"));
        assert!(!is_supported_source_file("Makefile"));
    }

    #[test]
    fn test_is_skipped_dir() {
        assert!(is_skipped_dir(".git"));
        assert!(is_skipped_dir("target"));
        assert!(is_skipped_dir("node_modules"));
        assert!(!is_skipped_dir("src"));
    }

    #[test]
    fn test_collect_source_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("src/b.code"), "").unwrap();
        fs::write(dir.path().join("src/nested/A.java"), "").unwrap();
        fs::write(dir.path().join("src/notes.txt"), "").unwrap();
        fs::write(dir.path().join("target/gen.code"), "").unwrap();

        let files = collect_source_files(dir.path()).unwrap();
        let relative: Vec<PathBuf> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("src/b.code"), PathBuf::from("src/nested/A.java")]
        );
    }

    #[test]
    fn test_extract_source_detects_language() {
        let file = extract_source("function f() { g(); }", "f.code", ListenerOptions::default())
            .unwrap();
        assert_eq!(file.language, "Code");
        assert_eq!(file.model.functions[0].calls[0].name, "g");

        let file = extract_source(
            "class A { void f() { g(); } }",
            "A.java",
            ListenerOptions::default(),
        )
        .unwrap();
        assert_eq!(file.language, "Java");
        assert_eq!(file.model.functions[0].name, "f");
    }

    #[test]
    fn test_extract_source_keeps_functions_around_stray_characters() {
        let file = extract_source(
            "function f() { a(); } // ok\nfunction g() { b(\"é\"); c(x @ y); }",
            "a.code",
            ListenerOptions::default(),
        )
        .unwrap();
        let names: Vec<&str> = file.model.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["f", "g"]);
        assert_eq!(file.diagnostics.len(), 1);
        assert_eq!(file.diagnostics[0].message, "unrecognized syntax \"@\"");

        let file =
            extract_source("function café() { a(); }", "a.code", ListenerOptions::default())
                .unwrap();
        assert_eq!(file.model.functions[0].name, "café");
        assert!(file.diagnostics.is_empty());
    }

    #[test]
    fn test_extract_source_rejects_unknown_extension() {
        let error = extract_source("x", "notes.txt", ListenerOptions::default()).unwrap_err();
        assert!(error.to_string().contains("unsupported file type"));
    }
}
