//! End-to-end tests for the `steptool` binary.
//!
//! Each test builds a throwaway project, runs the binary in it and checks
//! the JSON written to stdout and the exit code.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// Test Infrastructure
// ============================================================================

const STEPS: &str = "\
@step(\"Say <greeting> to <name>\")
def say(greeting, name):
    print(greeting, name)


@step([\"a foo\", \"a bar\"])
def foo_or_bar():
    pass
";

fn steptool_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_steptool"))
}

fn project() -> TempDir {
    let workspace = TempDir::new().unwrap();
    fs::create_dir_all(workspace.path().join(".steptool")).unwrap();
    fs::create_dir_all(workspace.path().join("step_impl")).unwrap();
    fs::write(workspace.path().join("step_impl/steps.py"), STEPS).unwrap();
    workspace
}

/// Run the binary in `dir` and return its parsed stdout and exit code.
fn run(dir: &Path, args: &[&str]) -> (Value, i32) {
    let output = Command::new(steptool_binary())
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON: {}\n{}", e, stdout));
    (json, output.status.code().unwrap_or(-1))
}

// ============================================================================
// steps
// ============================================================================

#[test]
fn steps_lists_configured_directories() {
    let workspace = project();
    let (json, code) = run(workspace.path(), &["steps"]);
    assert_eq!(code, 0);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["files_loaded"], 1);

    let steps = json["steps"].as_array().unwrap();
    let texts: Vec<&str> = steps.iter().map(|s| s["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["Say <greeting> to <name>", "a foo", "a bar"]);
    assert_eq!(steps[0]["function"], "say");
    assert_eq!(steps[0]["has_alias"], false);
    assert_eq!(steps[1]["has_alias"], true);
    assert_eq!(steps[0]["span"]["start_line"], 1);
    assert_eq!(steps[0]["span"]["end_line"], 3);
}

#[test]
fn steps_for_missing_path_is_an_error() {
    let workspace = project();
    let (json, code) = run(workspace.path(), &["steps", "nowhere"]);
    assert_eq!(code, 3);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
}

// ============================================================================
// refactor
// ============================================================================

#[test]
fn refactor_reports_edits_without_writing() {
    let workspace = project();
    let (json, code) = run(
        workspace.path(),
        &[
            "refactor",
            "--file",
            "step_impl/steps.py",
            "--old",
            "Say <greeting> to <name>",
            "--new",
            "Greet <name> with <greeting>",
            "--params",
            "1,0",
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(json["applied"], false);
    let edits = json["edits"].as_array().unwrap();
    assert_eq!(edits.len(), 2);
    assert_eq!(edits[0]["new_text"], "\"Greet <name> with <greeting>\"");
    assert_eq!(edits[1]["new_text"], "name, greeting");

    let on_disk = fs::read_to_string(workspace.path().join("step_impl/steps.py")).unwrap();
    assert_eq!(on_disk, STEPS);
}

#[test]
fn refactor_apply_writes_file() {
    let workspace = project();
    let (json, code) = run(
        workspace.path(),
        &[
            "refactor",
            "--file",
            "step_impl/steps.py",
            "--old",
            "a bar",
            "--new",
            "a baz",
            "--apply",
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(json["applied"], true);
    assert_eq!(json["edits"].as_array().unwrap().len(), 1);

    let on_disk = fs::read_to_string(workspace.path().join("step_impl/steps.py")).unwrap();
    assert_eq!(on_disk, STEPS.replace("\"a bar\"", "\"a baz\""));
}

#[test]
fn refactor_accepts_negative_indices() {
    let workspace = project();
    let (json, code) = run(
        workspace.path(),
        &[
            "refactor",
            "--file",
            "step_impl/steps.py",
            "--old",
            "Say <greeting> to <name>",
            "--new",
            "Say <what> to <name>",
            "--params",
            "-1,1",
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(json["edits"][1]["new_text"], "arg1, name");
}

#[test]
fn refactor_unknown_step_is_an_error() {
    let workspace = project();
    let (json, code) = run(
        workspace.path(),
        &[
            "refactor",
            "--file",
            "step_impl/steps.py",
            "--old",
            "missing",
            "--new",
            "x",
        ],
    );
    assert_eq!(code, 3);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["file"], "step_impl/steps.py");
}

// ============================================================================
// check
// ============================================================================

#[test]
fn check_valid_and_invalid_files() {
    let workspace = project();
    let (json, code) = run(workspace.path(), &["check", "step_impl/steps.py"]);
    assert_eq!(code, 0);
    assert_eq!(json["status"], "ok");
    assert!(json["error"].is_null());

    fs::write(workspace.path().join("bad.py"), "def f(:\n    pass\n").unwrap();
    let (json, code) = run(workspace.path(), &["check", "bad.py"]);
    assert_eq!(code, 3);
    assert_eq!(json["status"], "invalid");
    assert!(json["error"].as_str().unwrap().contains("bad.py"));
}
