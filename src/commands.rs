//! CLI command implementations

use anyhow::Context;
use kite_core::ExportOutput;
use kite_indexer::{Repository, SearchOptions};
use serde::Serialize;
use std::path::Path;

fn open(root: &Path) -> anyhow::Result<Repository> {
    Repository::open(root).with_context(|| format!("cannot open repository {}", root.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn tree(root: &Path) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    print_json(repo.get_file_tree())
}

pub fn symbols(root: &Path, file: &str) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    print_json(&repo.extract_symbols(file))
}

pub fn map(root: &Path) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    let map = repo.get_repo_map();
    tracing::info!(
        "Indexed {} entries, {} files with symbols",
        map.file_tree.len(),
        map.symbols.len()
    );
    print_json(&map)
}

pub fn deps(root: &Path, module: &str, indirect: bool, dependents: bool) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    let modules = if dependents {
        repo.get_dependents(module, indirect)
    } else {
        repo.get_module_dependencies(module, indirect)
    };
    print_json(&modules)
}

pub fn file_deps(root: &Path, file: &str) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    print_json(&repo.get_file_dependencies(file))
}

pub fn cycles(root: &Path) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    let cycles = repo.find_cycles();
    if cycles.is_empty() {
        tracing::info!("No dependency cycles found");
    }
    print_json(&cycles)
}

pub fn export(root: &Path, format: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    match repo.export_dependency_graph(format, output)? {
        ExportOutput::Written(path) => {
            tracing::info!("Wrote {}", path.display());
        }
        other => println!("{}", other.into_text()?),
    }
    Ok(())
}

pub fn report(root: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    let report = repo.generate_dependency_report(output)?;
    if output.is_none() {
        print_json(&report)?;
    }
    Ok(())
}

pub fn search(
    root: &Path,
    query: &str,
    pattern: Option<String>,
    ignore_case: bool,
    context: usize,
) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    let options = SearchOptions {
        case_sensitive: !ignore_case,
        context_before: context,
        context_after: context,
        file_pattern: pattern,
    };
    print_json(&repo.search_text(query, &options)?)
}

pub fn usages(root: &Path, name: &str, kind: Option<&str>) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    print_json(&repo.find_symbol_usages(name, kind)?)
}
