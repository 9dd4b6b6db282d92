//! callmap CLI - extract functions, calls and variables from source files

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use callmap_core::config::load_and_resolve;
use callmap_core::{
    analyze, render_json, render_text, FileModel, Language, ResolvedConfig, VariableScope,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "callmap")]
#[command(about = "Extract a model of functions, calls and variables from source code")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the code model of a file or directory
    Extract {
        /// Path to a source file or directory
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Which declarators land in the top-level variables
        #[arg(long)]
        top_level_variables: Option<ScopeArg>,

        /// Exit with status 1 when any file yields a diagnostic
        #[arg(long)]
        fail_on_diagnostics: bool,
    },
    /// List supported languages and their file extensions
    Languages,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ScopeArg {
    Deduplicated,
    All,
}

impl From<ScopeArg> for VariableScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Deduplicated => VariableScope::Deduplicated,
            ScopeArg::All => VariableScope::All,
        }
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::try_new("callmap=debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("callmap=warn"))?
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

/// Directory searched for config files: the path itself, or its parent for a file
fn project_root(path: &Path) -> &Path {
    if path.is_file() {
        path.parent().unwrap_or(path)
    } else {
        path
    }
}

/// Apply CLI flags on top of the resolved config; flags win
fn apply_overrides(
    config: &mut ResolvedConfig,
    top_level_variables: Option<ScopeArg>,
    fail_on_diagnostics: bool,
) {
    if let Some(scope) = top_level_variables {
        config.variable_scope = scope.into();
    }
    if fail_on_diagnostics {
        config.fail_on_diagnostics = true;
    }
}

/// Number of diagnostics that should fail the run (0 when failing is off)
fn failing_diagnostics(config: &ResolvedConfig, models: &[FileModel]) -> usize {
    if !config.fail_on_diagnostics {
        return 0;
    }
    models.iter().map(|m| m.diagnostics.len()).sum()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Extract {
            path,
            format,
            config,
            top_level_variables,
            fail_on_diagnostics,
        } => {
            // Normalize path to absolute
            let normalized_path = if path.is_relative() {
                std::env::current_dir()?.join(&path)
            } else {
                path
            };

            // Validate path exists
            if !normalized_path.exists() {
                anyhow::bail!("Path does not exist: {}", normalized_path.display());
            }

            let mut resolved = load_and_resolve(project_root(&normalized_path), config.as_deref())?;
            if let Some(config_path) = &resolved.config_path {
                debug!("using config: {}", config_path.display());
            }

            apply_overrides(&mut resolved, top_level_variables, fail_on_diagnostics);

            let models = analyze(&normalized_path, &resolved)?;

            match format {
                OutputFormat::Text => {
                    print!("{}", render_text(&models));
                }
                OutputFormat::Json => {
                    println!("{}", render_json(&models));
                }
            }

            let diagnostics = failing_diagnostics(&resolved, &models);
            if diagnostics > 0 {
                eprintln!("{} diagnostic(s) reported", diagnostics);
                std::process::exit(1);
            }
        }
        Commands::Languages => {
            for language in Language::ALL {
                println!(
                    "{:<6} {}",
                    language.name(),
                    language
                        .extensions()
                        .iter()
                        .map(|ext| format!(".{}", ext))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract_flags() {
        let cli = Cli::try_parse_from([
            "callmap",
            "extract",
            "src",
            "--format",
            "json",
            "--top-level-variables",
            "all",
            "--fail-on-diagnostics",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Extract {
                path,
                format,
                top_level_variables,
                fail_on_diagnostics,
                config,
            } => {
                assert_eq!(path, PathBuf::from("src"));
                assert!(matches!(format, OutputFormat::Json));
                assert!(matches!(top_level_variables, Some(ScopeArg::All)));
                assert!(fail_on_diagnostics);
                assert!(config.is_none());
            }
            Commands::Languages => panic!("expected extract"),
        }
    }

    #[test]
    fn test_reject_unknown_scope() {
        let result = Cli::try_parse_from([
            "callmap",
            "extract",
            "src",
            "--top-level-variables",
            "some",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_project_root_of_file_is_parent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.code");
        std::fs::write(&file, "").unwrap();
        assert_eq!(project_root(&file), dir.path());
        assert_eq!(project_root(dir.path()), dir.path());
    }

    fn config_file(dir: &Path, contents: &str) -> ResolvedConfig {
        let path = dir.join(".callmaprc.json");
        std::fs::write(&path, contents).unwrap();
        load_and_resolve(dir, None).unwrap()
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_file(
            dir.path(),
            r#"{"top_level_variables": "all", "fail_on_diagnostics": false}"#,
        );
        apply_overrides(&mut config, Some(ScopeArg::Deduplicated), true);
        assert_eq!(config.variable_scope, VariableScope::Deduplicated);
        assert!(config.fail_on_diagnostics);
    }

    #[test]
    fn test_absent_flags_keep_config_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_file(
            dir.path(),
            r#"{"top_level_variables": "all", "fail_on_diagnostics": true}"#,
        );
        apply_overrides(&mut config, None, false);
        assert_eq!(config.variable_scope, VariableScope::All);
        assert!(config.fail_on_diagnostics);
    }

    #[test]
    fn test_failing_diagnostics_only_when_enabled() {
        let models = vec![callmap_core::extract_source(
            "} function f() { g(); }",
            "a.code",
            Default::default(),
        )
        .unwrap()];
        assert_eq!(models[0].diagnostics.len(), 1);

        let mut config = ResolvedConfig::defaults().unwrap();
        assert_eq!(failing_diagnostics(&config, &models), 0);

        apply_overrides(&mut config, None, true);
        assert_eq!(failing_diagnostics(&config, &models), 1);

        let clean =
            vec![
                callmap_core::extract_source("function f() { }", "a.code", Default::default())
                    .unwrap(),
            ];
        assert_eq!(failing_diagnostics(&config, &clean), 0);
    }

    #[test]
    fn test_scope_arg_conversion() {
        assert_eq!(VariableScope::from(ScopeArg::All), VariableScope::All);
        assert_eq!(
            VariableScope::from(ScopeArg::Deduplicated),
            VariableScope::Deduplicated
        );
    }
}
