//! Binary entry point for the steptool CLI.
//!
//! All command output is JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # List the steps implemented under the configured step directories
//! steptool steps
//!
//! # Rename a step and move its first parameter to second position
//! steptool refactor --file step_impl/steps.py \
//!     --old "Say <greeting> to <name>" --new "Greet <name> with <greeting>" \
//!     --params 1,0 --apply
//!
//! # Check that a file parses
//! steptool check step_impl/steps.py
//! ```

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use steptool::config::{find_project_root_from, Config};
use steptool::error::{OutputErrorCode, StepToolError};
use steptool::loader::{load_files, load_steps};
use steptool::output::{
    emit_response, CheckResponse, ErrorResponse, RefactorResponse, StepsResponse,
};
use steptool::patch::{apply_edits, ContentHash};
use steptool::registry::StepRegistry;
use steptool::report::{NullReporter, TracingReporter};
use steptool::{RefactorEngine, SourceTree};
use steptool_python_cst::{parse_module, prettify_error};

// ============================================================================
// CLI Structure
// ============================================================================

/// Discover and refactor Python step implementations.
///
/// Steps are top-level functions marked with a step decorator. Edits keep
/// every other byte of the file unchanged.
#[derive(Parser, Debug)]
#[command(
    name = "steptool",
    version,
    about = "Discover and refactor Python step implementations"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Project root (default: nearest ancestor with a .steptool/ directory,
    /// else the current directory).
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Format of the log lines written to stderr.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// A parameter remapping such as `-1,0`.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ParamMap(Vec<i64>);

/// Parse a comma-separated parameter remapping. The empty string removes
/// every parameter.
fn parse_param_map(s: &str) -> Result<ParamMap, String> {
    if s.trim().is_empty() {
        return Ok(ParamMap(Vec::new()));
    }
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid parameter index '{}' in '{}'", part.trim(), s))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ParamMap)
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the steps implemented in directories or files.
    Steps {
        /// Directories or files to scan (default: the configured step
        /// directories).
        paths: Vec<PathBuf>,
    },
    /// Rename a step and remap its function's parameters.
    Refactor {
        /// File containing the step.
        #[arg(long)]
        file: PathBuf,
        /// Current step text.
        #[arg(long)]
        old: String,
        /// New step text.
        #[arg(long)]
        new: String,
        /// For each new parameter, the index of the old parameter it comes
        /// from, or -1 for a new one (default: keep the parameters).
        #[arg(long, allow_hyphen_values = true, value_parser = parse_param_map)]
        params: Option<ParamMap>,
        /// Write the result back to the file.
        #[arg(long)]
        apply: bool,
    },
    /// Check that a file parses.
    Check {
        /// File to check.
        file: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<ExitCode, StepToolError> {
    let project_root = project_root(&cli.global)?;
    let config = Config::load_from_project(&project_root)?;
    match cli.command {
        Command::Steps { paths } => execute_steps(&project_root, &config, paths),
        Command::Refactor {
            file,
            old,
            new,
            params,
            apply,
        } => execute_refactor(&config, &file, &old, &new, params, apply),
        Command::Check { file } => execute_check(&file),
    }
}

fn project_root(global: &GlobalArgs) -> Result<PathBuf, StepToolError> {
    if let Some(project) = &global.project {
        if !project.is_dir() {
            return Err(StepToolError::file_not_found(project.display().to_string()));
        }
        return Ok(project.clone());
    }
    let cwd = env::current_dir()?;
    Ok(find_project_root_from(&cwd).unwrap_or(cwd))
}

fn emit<T: Serialize>(response: &T) -> Result<(), StepToolError> {
    emit_response(response, &mut io::stdout())
        .map_err(|e| StepToolError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

fn read_source(file: &Path) -> Result<String, StepToolError> {
    if !file.is_file() {
        return Err(StepToolError::file_not_found(file.display().to_string()));
    }
    Ok(fs::read_to_string(file)?)
}

// ============================================================================
// Command Executors
// ============================================================================

/// Execute steps command.
fn execute_steps(
    project_root: &Path,
    config: &Config,
    paths: Vec<PathBuf>,
) -> Result<ExitCode, StepToolError> {
    let paths = if paths.is_empty() {
        config.step_impl_paths(project_root)
    } else {
        paths
    };

    let reporter = TracingReporter;
    let mut registry = StepRegistry::new();
    let mut files_loaded = 0;
    for path in &paths {
        if path.is_dir() {
            files_loaded += load_files(path, &mut registry, config, &reporter);
        } else if path.is_file() {
            if let Some(tree) = SourceTree::parse(path, None, &reporter) {
                load_steps(&tree, &mut registry, &config.decorator, &reporter);
                files_loaded += 1;
            }
        } else {
            return Err(StepToolError::file_not_found(path.display().to_string()));
        }
    }

    let steps = registry.all_steps().iter().map(|info| info.to_item()).collect();
    emit(&StepsResponse::new(files_loaded, steps))?;
    Ok(ExitCode::SUCCESS)
}

/// Execute refactor command.
///
/// The edits are checked against the edited tree before anything is
/// written.
fn execute_refactor(
    config: &Config,
    file: &Path,
    old: &str,
    new: &str,
    params: Option<ParamMap>,
    apply: bool,
) -> Result<ExitCode, StepToolError> {
    let content = read_source(file)?;
    let file_name = file.display().to_string();
    let reporter = TracingReporter;
    let mut tree = SourceTree::parse(file, Some(&content), &reporter)
        .ok_or_else(|| StepToolError::parse_failed(&file_name))?;

    let lookup = RefactorEngine::with_decorator(&config.decorator, &NullReporter);
    let found = lookup
        .find_step(&tree, old)
        .ok_or_else(|| StepToolError::StepNotFound {
            step: old.to_string(),
            path: file_name.clone(),
        })?;
    let move_param_from_idx = match params {
        Some(ParamMap(map)) => map,
        None => (0..found.params.len() as i64).collect(),
    };

    let before_hash = ContentHash::compute(content.as_bytes());
    let engine = RefactorEngine::with_decorator(&config.decorator, &reporter);
    let edits = engine.refactor_step(&mut tree, old, new, &move_param_from_idx);

    let patched = apply_edits(&content, &edits)?;
    if patched != tree.dumps() {
        return Err(StepToolError::internal(format!(
            "edits for {} do not match the refactored tree",
            file_name
        )));
    }

    if apply {
        tree.save(None)
            .map_err(|e| StepToolError::apply(e.to_string(), &file_name))?;
    }

    emit(&RefactorResponse::new(file_name, before_hash, edits, apply))?;
    Ok(ExitCode::SUCCESS)
}

/// Execute check command.
fn execute_check(file: &Path) -> Result<ExitCode, StepToolError> {
    let content = read_source(file)?;
    let file_name = file.display().to_string();
    match parse_module(&content) {
        Ok(_) => {
            emit(&CheckResponse::valid(file_name))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let pretty = prettify_error(&err, &content, &file_name);
            emit(&CheckResponse::invalid(file_name, pretty))?;
            Ok(ExitCode::from(OutputErrorCode::ResolutionError.code()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn steps_without_paths() {
            let cli = Cli::try_parse_from(["steptool", "steps"]).unwrap();
            match cli.command {
                Command::Steps { paths } => assert!(paths.is_empty()),
                _ => panic!("expected Steps"),
            }
            assert!(matches!(cli.global.log_level, LogLevel::Warn));
            assert_eq!(cli.global.log_format, LogFormat::Text);
        }

        #[test]
        fn refactor_with_negative_params() {
            let args = [
                "steptool",
                "refactor",
                "--file",
                "steps.py",
                "--old",
                "a <x>",
                "--new",
                "b <y> <x>",
                "--params",
                "-1,0",
                "--apply",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Command::Refactor {
                    file,
                    old,
                    new,
                    params,
                    apply,
                } => {
                    assert_eq!(file, PathBuf::from("steps.py"));
                    assert_eq!(old, "a <x>");
                    assert_eq!(new, "b <y> <x>");
                    assert_eq!(params, Some(ParamMap(vec![-1, 0])));
                    assert!(apply);
                }
                _ => panic!("expected Refactor"),
            }
        }

        #[test]
        fn refactor_params_default_to_none() {
            let args = [
                "steptool", "refactor", "--file", "s.py", "--old", "a", "--new", "b",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Command::Refactor { params, apply, .. } => {
                    assert_eq!(params, None);
                    assert!(!apply);
                }
                _ => panic!("expected Refactor"),
            }
        }

        #[test]
        fn global_flags_after_subcommand() {
            let args = [
                "steptool",
                "check",
                "s.py",
                "--log-format",
                "json",
                "--log-level",
                "debug",
                "--project",
                "/tmp",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.global.log_format, LogFormat::Json);
            assert!(matches!(cli.global.log_level, LogLevel::Debug));
            assert_eq!(cli.global.project, Some(PathBuf::from("/tmp")));
        }

        #[test]
        fn refactor_requires_old_and_new() {
            assert!(Cli::try_parse_from(["steptool", "refactor", "--file", "s.py"]).is_err());
        }
    }

    mod param_maps {
        use super::*;

        #[test]
        fn parses_lists() {
            assert_eq!(parse_param_map("0,1,2"), Ok(ParamMap(vec![0, 1, 2])));
            assert_eq!(parse_param_map("-1, 0"), Ok(ParamMap(vec![-1, 0])));
            assert_eq!(parse_param_map(""), Ok(ParamMap(vec![])));
        }

        #[test]
        fn rejects_garbage() {
            let err = parse_param_map("1,x").unwrap_err();
            assert!(err.contains("'x'"));
        }
    }
}
