//! Integration tests for the `pylang` binary.
//!
//! Each test writes a parser-format AST to a temporary directory and runs
//! the compiled binary over it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const PRINT_X: &str = r#"{
  "kind": "Program",
  "location": [1, 1, 2, 9],
  "declarations": [{
    "kind": "VarDef",
    "location": [1, 1, 1, 11],
    "var": {
      "kind": "TypedVar",
      "location": [1, 1, 1, 6],
      "identifier": { "kind": "Identifier", "location": [1, 1, 1, 1], "name": "x" },
      "type": { "kind": "ClassType", "location": [1, 4, 1, 6], "className": "int" }
    },
    "value": { "kind": "IntegerLiteral", "location": [1, 10, 1, 11], "value": 42 }
  }],
  "statements": [{
    "kind": "ExprStmt",
    "location": [2, 1, 2, 8],
    "expr": {
      "kind": "CallExpr",
      "location": [2, 1, 2, 8],
      "function": { "kind": "Identifier", "location": [2, 1, 2, 5], "name": "print" },
      "args": [{ "kind": "Identifier", "location": [2, 7, 2, 7], "name": "x" }]
    }
  }],
  "errors": { "kind": "Errors", "location": [0, 0, 0, 0], "errors": [] }
}"#;

const PRINT_X_SOURCE: &str = "x: int = 42\nprint(x)\n";

const BAD_INIT: &str = r#"{
  "kind": "Program",
  "location": [1, 1, 1, 13],
  "declarations": [{
    "kind": "VarDef",
    "location": [1, 1, 1, 13],
    "var": {
      "kind": "TypedVar",
      "location": [1, 1, 1, 6],
      "identifier": { "kind": "Identifier", "location": [1, 1, 1, 1], "name": "x" },
      "type": { "kind": "ClassType", "location": [1, 4, 1, 6], "className": "int" }
    },
    "value": { "kind": "StringLiteral", "location": [1, 10, 1, 13], "value": "no" }
  }],
  "statements": [],
  "errors": { "kind": "Errors", "location": [0, 0, 0, 0], "errors": [] }
}"#;

const BAD_INIT_SOURCE: &str = "x: int = \"no\"\n";

/// Path to the compiled `pylang` binary.
fn pylang_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pylang"))
}

fn write_fixture(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("Failed to write fixture");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(pylang_binary())
        .args(args)
        .output()
        .expect("Failed to run pylang")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ============================================================================
// Single units
// ============================================================================

#[test]
fn test_compile_prints_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "print_x.json", PRINT_X);
    let output = run(&["compile", input.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let asm = stdout(&output);
    assert!(asm.contains("main:"));
    assert!(asm.contains("jal $print"));
    assert!(asm.contains("error.None:"));
}

#[test]
fn test_compile_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "print_x.json", PRINT_X);
    let out = dir.path().join("print_x.s");
    let output = run(&[
        "compile",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--no-comments",
        "--heap-words",
        "1024",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let asm = fs::read_to_string(&out).unwrap();
    assert!(!asm.contains('#'));
    assert!(asm.contains("li a0, 4096"));
}

#[test]
fn test_check_emits_typed_ast() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "print_x.json", PRINT_X);
    let output = run(&["check", input.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("\"inferredType\""));
    assert!(text.contains("ClassValueType"));
    assert!(!text.contains("exprId"));
}

#[test]
fn test_parse_round_trips_without_types() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "print_x.json", PRINT_X);
    let output = run(&["parse", input.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("\"VarDef\""));
    assert!(!text.contains("inferredType"));
}

#[test]
fn test_type_error_fails_with_plain_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "bad.json", BAD_INIT);
    let output = run(&["compile", input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Expected type `int`; got type `str`"));
    // The typed snapshot is still produced, with its errors
    assert!(stdout(&output).contains("\"CompilerError\""));
}

#[test]
fn test_type_error_with_source_uses_rich_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "bad.json", BAD_INIT);
    let source = write_fixture(dir.path(), "bad.py", BAD_INIT_SOURCE);
    let output = run(&["check", input.to_str().unwrap(), "--source", source.to_str().unwrap()]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("E0100"));
    assert!(err.contains("Expected type `int`; got type `str`"));
}

#[test]
fn test_run_stops_at_requested_pass() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "print_x.json", PRINT_X);
    let output = run(&["run", input.to_str().unwrap(), "--pass", "analyze"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("inferredType"));
    assert!(!stdout(&output).contains("main:"));
}

#[test]
fn test_missing_input_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let output = run(&["compile", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot read"));
}

#[test]
fn test_malformed_json_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "broken.json", "{\"kind\": \"Program\"");
    let output = run(&["compile", input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("malformed AST"));
}

// ============================================================================
// Directory mode
// ============================================================================

#[test]
fn test_run_dir_compiles_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "one.json", PRINT_X);
    write_fixture(dir.path(), "two.json", PRINT_X);
    let output = run(&[
        "run",
        "--dir",
        dir.path().to_str().unwrap(),
        "--out",
        out.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.path().join("one.s").exists());
    assert!(out.path().join("two.s").exists());
    assert!(stdout(&output).contains("2 files, 0 with errors"));
}

#[test]
fn test_run_dir_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "good.json", PRINT_X);
    write_fixture(dir.path(), "bad.json", BAD_INIT);
    let output = run(&["run", "--dir", dir.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(dir.path().join("good.s").exists());
    assert!(dir.path().join("bad.typed.json").exists());
    assert!(stdout(&output).contains("2 files, 1 with errors"));
}
