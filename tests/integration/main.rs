//! Integration tests for Kite
//!
//! These tests drive the repository facade and the CLI against temporary
//! repositories on disk.

use kite_core::ExportOutput;
use kite_indexer::Repository;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn two_file_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.py"),
        "def foo():\n    return 42\n\n\ndef bar():\n    return foo() + 1\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("b.py"),
        "from a import foo\n\n\ndef main():\n    print(foo())\n",
    )
    .unwrap();
    dir
}

fn kite(root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_kite"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to execute kite")
}

#[test]
fn test_symbol_usages_and_import_edge() {
    let repo = two_file_repo();
    let mut repository = Repository::open(repo.path()).unwrap();

    let usages = repository.find_symbol_usages("foo", None).unwrap();
    let files: std::collections::BTreeSet<&str> = usages.iter().map(|u| u.file.as_str()).collect();
    assert!(files.contains("a.py"));
    assert!(files.contains("b.py"));
    assert!(
        usages
            .iter()
            .any(|u| u.file == "a.py" && u.kind.as_deref() == Some("function"))
    );

    let graph = repository.build_dependency_graph();
    assert_eq!(graph.dependencies("b"), vec!["a"]);
    assert!(graph.node("a").unwrap().is_internal());
}

#[test]
fn test_repo_map_contents() {
    let repo = two_file_repo();
    let mut repository = Repository::open(repo.path()).unwrap();
    let map = repository.index();

    let a: Vec<&str> = map.symbols["a.py"].iter().map(|s| s.name.as_str()).collect();
    assert_eq!(a, vec!["foo", "bar"]);
    let b: Vec<&str> = map.symbols["b.py"].iter().map(|s| s.name.as_str()).collect();
    assert_eq!(b, vec!["main"]);

    let json = serde_json::to_value(&map).unwrap();
    assert_eq!(json["file_tree"][0]["path"], "a.py");
    assert_eq!(json["symbols"]["a.py"][0]["type"], "function");
    assert_eq!(json["symbols"]["a.py"][0]["start_line"], 0);
}

#[test]
fn test_dot_export_to_file() {
    let repo = two_file_repo();
    let out = TempDir::new().unwrap();
    let path = out.path().join("graph.dot");

    let mut repository = Repository::open(repo.path()).unwrap();
    let output = repository.export_dependency_graph("dot", Some(&path)).unwrap();
    assert_eq!(output, ExportOutput::Written(path.clone()));

    let dot = fs::read_to_string(&path).unwrap();
    assert!(dot.starts_with("digraph G {\n  rankdir=\"LR\";\n  node [shape=box];"));
    assert!(dot.contains(r#""b" -> "a";"#));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_kite"))
        .arg("--help")
        .output()
        .expect("Failed to execute kite");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("dependency graph"));
}

#[test]
fn test_cli_json_commands() {
    let repo = two_file_repo();

    let output = kite(repo.path(), &["deps", "b"]);
    assert!(output.status.success());
    let deps: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(deps, vec!["a"]);

    let output = kite(repo.path(), &["symbols", "a.py"]);
    assert!(output.status.success());
    let symbols: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(symbols[0]["name"], "foo");
    assert_eq!(symbols[0]["file"], "a.py");

    let output = kite(repo.path(), &["cycles"]);
    assert!(output.status.success());
    let cycles: Vec<Vec<String>> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(cycles.is_empty());
}

#[test]
fn test_cli_rejects_unknown_export_format() {
    let repo = two_file_repo();
    let output = kite(repo.path(), &["export", "--format", "yaml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("yaml"));
}
