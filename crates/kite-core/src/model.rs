//! Core data structures shared by the indexer and its consumers

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One entry of the repository inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub is_dir: bool,
    pub name: String,
    /// Size in bytes; always 0 for directories.
    pub size: u64,
}

impl FileEntry {
    /// Lowercased extension of the entry, without the leading dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// A symbol extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub name: String,
    /// Lowercase category taken from the query capture label ("function", "class", ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// 0-indexed.
    pub start_line: usize,
    /// 0-indexed, inclusive.
    pub end_line: usize,
    /// Verbatim source span.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Whether a module resolves to a file inside the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Internal,
    External,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Internal => "internal",
            ModuleKind::External => "external",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the module dependency graph.
///
/// Edges live in the graph itself; see [`crate::DependencyGraph::dependencies`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Dotted module id, e.g. `pkg.sub.mod`.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    /// Present for internal modules only.
    pub path: Option<String>,
}

impl ModuleNode {
    pub fn internal(id: impl Into<String>, path: impl Into<String>) -> Self {
        ModuleNode {
            id: id.into(),
            kind: ModuleKind::Internal,
            path: Some(path.into()),
        }
    }

    pub fn external(id: impl Into<String>) -> Self {
        ModuleNode {
            id: id.into(),
            kind: ModuleKind::External,
            path: None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ModuleKind::Internal
    }
}

/// Serialized form of a module: `{type, path, dependencies}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub path: Option<String>,
    pub dependencies: Vec<String>,
}

/// A module related to a file, as reported by file-level dependency queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub module: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub path: Option<String>,
}

/// Dependency details for a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDependencies {
    pub file_path: String,
    pub module_name: String,
    pub dependencies: Vec<DependencyInfo>,
    pub dependents: Vec<DependencyInfo>,
}
