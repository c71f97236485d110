//! Python import analysis into a module dependency graph
//!
//! A single static pass over literal import syntax. Conditional and dynamic
//! imports are not evaluated; anything that does not resolve inside the
//! repository becomes an external node.

use std::path::Path;

use kite_core::{DependencyGraph, FileEntry, ModuleNode};
use tree_sitter::{Node, Parser};

use crate::registry::GrammarRegistry;
use crate::resolver::{ModuleResolver, PYTHON_EXTENSION, file_to_module, is_package_init};

const FUTURE_MODULE: &str = "__future__";

/// Build a fresh graph from every Python file in `files`.
pub fn build_dependency_graph(
    root: &Path,
    files: &[FileEntry],
    registry: &mut GrammarRegistry,
) -> DependencyGraph {
    let mut builder = DependencyGraphBuilder::new(root, files);

    let Some(parser) = registry.get_parser(PYTHON_EXTENSION) else {
        tracing::warn!("No Python parser available; dependency graph is empty");
        return builder.finish();
    };

    let sources = files
        .iter()
        .filter(|f| !f.is_dir && f.extension().as_deref() == Some(PYTHON_EXTENSION));
    for file in sources {
        builder.process_file(&file.path, parser);
    }

    let graph = builder.finish();
    tracing::info!(
        "Dependency graph built: {} modules, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

/// Accumulates one graph; construct a new builder for every build.
#[derive(Debug)]
pub struct DependencyGraphBuilder<'a> {
    root: &'a Path,
    resolver: ModuleResolver,
    graph: DependencyGraph,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(root: &'a Path, files: &[FileEntry]) -> Self {
        DependencyGraphBuilder {
            root,
            resolver: ModuleResolver::build(files),
            graph: DependencyGraph::new(),
        }
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Record the module owning `path` and every import it contains.
    ///
    /// Unreadable, non-UTF-8 or unparseable files are logged and skipped.
    pub fn process_file(&mut self, path: &str, parser: &mut Parser) {
        let full_path = self.root.join(path);
        let source = match std::fs::read_to_string(&full_path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!("Skipping {} in dependency analysis: {}", path, err);
                return;
            }
        };
        let Some(tree) = parser.parse(&source, None) else {
            tracing::warn!("Failed to parse {}", path);
            return;
        };

        let owner = file_to_module(path);
        let package = is_package_init(path);
        self.graph.upsert_internal(&owner, path);

        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "import_statement" => self.import_statement(&owner, node, &source),
                "import_from_statement" => {
                    self.import_from_statement(&owner, package, node, &source)
                }
                "future_import_statement" => self.add_dependency(&owner, FUTURE_MODULE),
                _ => {
                    let mut cursor = node.walk();
                    let children: Vec<Node> = node.named_children(&mut cursor).collect();
                    stack.extend(children.into_iter().rev());
                }
            }
        }
    }

    pub fn finish(self) -> DependencyGraph {
        self.graph
    }

    /// `import a.b, c as d`
    fn import_statement(&mut self, owner: &str, node: Node<'_>, source: &str) {
        for name in imported_names(node, source) {
            self.add_dependency(owner, &name);
        }
    }

    /// `from m import x, y` / `from . import x` / `from m import *`
    fn import_from_statement(&mut self, owner: &str, package: bool, node: Node<'_>, source: &str) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let base = if module_node.kind() == "relative_import" {
            match resolve_relative(owner, package, module_node, source) {
                Some(base) => base,
                None => {
                    tracing::debug!("Relative import in {} escapes the repository root", owner);
                    return;
                }
            }
        } else {
            text(module_node, source).to_string()
        };

        let names = imported_names(node, source);
        if names.is_empty() {
            if !base.is_empty() {
                self.add_dependency(owner, &base);
            }
            return;
        }

        for name in names {
            if base.is_empty() {
                self.add_dependency(owner, &name);
                continue;
            }
            let specific = format!("{}.{}", base, name);
            if self.resolver.contains(&specific) {
                self.add_dependency(owner, &specific);
            } else {
                self.add_dependency(owner, &base);
            }
        }
    }

    /// Add `source -> target`, materializing `target` if it is new.
    fn add_dependency(&mut self, source: &str, target: &str) {
        if !self.graph.contains(target) {
            let node = match self.resolver.resolve(target) {
                Some(path) => ModuleNode::internal(target, path),
                None => ModuleNode::external(target),
            };
            self.graph.insert(node);
        }
        self.graph.add_edge(source, target);
    }
}

/// Names bound by an import statement's `name` fields, aliases dropped.
fn imported_names(node: Node<'_>, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|child| match child.kind() {
            "aliased_import" => child.child_by_field_name("name"),
            _ => Some(child),
        })
        .map(|child| text(child, source).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Absolute module for a `relative_import` node, or `None` past the root.
fn resolve_relative(owner: &str, package: bool, node: Node<'_>, source: &str) -> Option<String> {
    let mut level = 0;
    let mut rest = "";
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_prefix" => level = text(child, source).matches('.').count(),
            "dotted_name" => rest = text(child, source),
            _ => {}
        }
    }
    resolve_relative_module(owner, package, level, rest)
}

fn resolve_relative_module(owner: &str, package: bool, level: usize, rest: &str) -> Option<String> {
    let mut parts: Vec<&str> = owner.split('.').filter(|p| !p.is_empty()).collect();
    if !package {
        parts.pop();
    }
    for _ in 1..level {
        parts.pop()?;
    }
    if !rest.is_empty() {
        parts.extend(rest.split('.'));
    }
    Some(parts.join("."))
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or_default()
}
