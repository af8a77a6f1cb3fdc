//! Integration tests for the `syngrep` binary
//!
//! Drives the built executable over a temporary project.

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn syngrep() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_syngrep"));
    command.env_remove("SYNGREP_CONFIG").env_remove("RUST_LOG");
    command
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Helper to create a small Python project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("pkg")).unwrap();
    fs::write(
        dir.path().join("pkg/a.py"),
        "def greet(name):\n    print(name)\n\nprint(\"top\")\n",
    )
    .unwrap();
    fs::write(dir.path().join("pkg/b.py"), "print(1)\nprint(2)\n").unwrap();
    fs::write(dir.path().join("pkg/c.js"), "print(3);\n").unwrap();
    dir
}

#[test]
fn test_help_lists_commands() {
    let output = syngrep().arg("--help").output().unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["dump", "test-rule", "run", "scan"] {
        assert!(text.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_run_text_output() {
    let dir = setup_project();
    let output = syngrep()
        .args(["run", "--pattern", "print($A)", "--lang", "python"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("Found 4 matches:"));
    assert!(text.contains("a.py:2\nprint(name)"));
    assert!(text.contains("b.py:2\nprint(2)"));
    assert!(!text.contains("print(3)"));
}

#[test]
fn test_run_max_results_keeps_file_order() {
    let dir = setup_project();
    let output = syngrep()
        .args(["run", "-p", "print($A)", "-l", "python", "--max-results", "3", "--json"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let matches: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let texts: Vec<_> = matches
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["print(name)", "print(\"top\")", "print(1)"]);
}

#[test]
fn test_run_paginates() {
    let dir = setup_project();
    let output = syngrep()
        .args(["run", "-p", "print($A)", "-l", "python", "--offset", "1", "--limit", "2", "--json"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let page: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(page["metadata"]["total_matches"], 4);
    assert_eq!(page["metadata"]["returned"], 2);
    assert_eq!(page["metadata"]["has_more"], true);
    assert_eq!(page["results"][0]["text"], "print(\"top\")");
}

#[test]
fn test_zero_limit_is_rejected() {
    let dir = setup_project();
    let output = syngrep()
        .args(["run", "-p", "print($A)", "-l", "python", "--limit", "0"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("limit"));
}

#[test]
fn test_scan_with_inline_rule() {
    let dir = setup_project();
    let rule = "id: print-in-def\nlanguage: python\nrule:\n  pattern: print($A)\n  inside:\n    kind: function_definition\n    stopBy: end\n";
    let output = syngrep()
        .args(["scan", "--inline-rules", rule, "--json"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let matches: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(matches.as_array().unwrap().len(), 1);
    assert_eq!(matches[0]["ruleId"], "print-in-def");
    assert_eq!(matches[0]["metaVariables"]["single"]["A"]["text"], "name");
}

#[test]
fn test_scan_with_rule_file() {
    let dir = setup_project();
    let rule_path = dir.path().join("rule.yml");
    fs::write(&rule_path, "language: javascript\nrule:\n  pattern: print($A)\n").unwrap();

    let output = syngrep()
        .args(["scan", "--rule"])
        .arg(&rule_path)
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("Found 1 matches:"));
}

#[test]
fn test_unknown_kind_fails() {
    let dir = setup_project();
    let output = syngrep()
        .args(["scan", "--inline-rules", "language: python\nrule:\n  kind: functoin_definition\n"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("functoin_definition"));
}

#[test]
fn test_unsupported_language_fails() {
    let output = syngrep()
        .args(["dump", "--lang", "klingon", "x"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("klingon"));
}

#[test]
fn test_dump_reads_stdin() {
    let mut child = syngrep()
        .args(["dump", "--lang", "python", "--format", "ast"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"x = 1\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("module (0,0)-(1,0)\n"));
    assert!(text.contains("left: identifier (0,0)-(0,1) `x`"));
}

#[test]
fn test_test_rule_reports_matches() {
    let output = syngrep()
        .args([
            "test-rule",
            "--inline-rules",
            "id: no-eq\nlanguage: javascript\nrule:\n  pattern: $A == $B\n",
            "if (a == b) {}\nif (a === b) {}\n",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("Found 1 matches:"));
    assert!(text.contains("<input>:1\na == b"));
}

#[test]
fn test_test_rule_without_matches_prints_hint() {
    let output = syngrep()
        .args([
            "test-rule",
            "--inline-rules",
            "language: python\nrule:\n  kind: integer\n  inside:\n    kind: module\n",
            "x = [1]\n",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "No matches found");
    assert!(stderr(&output).contains("stopBy: end"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = setup_project();
    let output = syngrep()
        .args(["--config"])
        .arg(dir.path().join("nope.yaml"))
        .args(["run", "-p", "print($A)", "-l", "python"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not exist"));
}

#[test]
fn test_config_ignore_globs_apply() {
    let dir = setup_project();
    let config = dir.path().join("sgconfig.yaml");
    fs::write(&config, "ignore:\n  - \"**/b.py\"\n").unwrap();

    let output = syngrep()
        .env("SYNGREP_CONFIG", &config)
        .args(["run", "-p", "print($A)", "-l", "python"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("Found 2 matches:"));
}
