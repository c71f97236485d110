//! Repository facade: the surface consumed by the CLI and other collaborators

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kite_core::{
    DependencyGraph, DependencyInfo, DependencyReport, ExportFormat, ExportOutput, FileDependencies,
    FileEntry, KiteError, Result, SymbolRecord,
};
use serde::{Deserialize, Serialize};

use crate::config::KiteConfig;
use crate::dependencies;
use crate::extractor;
use crate::ignore_spec::IgnoreSpec;
use crate::registry::GrammarRegistry;
use crate::resolver::file_to_module;
use crate::scanner::{FileTreeScanner, to_slash};
use crate::search::{self, SearchMatch, SearchOptions};
use crate::symbol_cache::{CacheStats, SymbolCache};

/// File inventory plus symbols per relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMap {
    pub file_tree: Vec<FileEntry>,
    pub symbols: BTreeMap<String, Vec<SymbolRecord>>,
}

/// A definition of, or textual reference to, a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolUsage {
    pub file: String,
    /// Symbol type for definitions; absent for text hits.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 1-based.
    pub line: usize,
    pub context: String,
}

/// One indexed repository.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    config: KiteConfig,
    scanner: FileTreeScanner,
    registry: GrammarRegistry,
    symbols: SymbolCache,
    dependencies: Option<DependencyGraph>,
}

impl Repository {
    /// Open the repository rooted at `path`, loading `kite.toml` if present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = path
            .canonicalize()
            .map_err(|_| KiteError::NotADirectory(path.to_path_buf()))?;
        if !root.is_dir() {
            return Err(KiteError::NotADirectory(path.to_path_buf()));
        }

        let config = KiteConfig::load(&root)?;
        let ignore = Arc::new(IgnoreSpec::load(&root, &config.exclude));
        let registry = GrammarRegistry::new(config.queries_dir.clone());

        tracing::info!("Opened repository {}", root.display());
        Ok(Repository {
            scanner: FileTreeScanner::new(&root, ignore),
            symbols: SymbolCache::new(&root),
            root,
            config,
            registry,
            dependencies: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &KiteConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.symbols.stats()
    }

    /// Memoized inventory; see [`invalidate`](Self::invalidate).
    pub fn get_file_tree(&mut self) -> &[FileEntry] {
        self.scanner.scan()
    }

    /// Forget the inventory and the dependency graph.
    pub fn invalidate(&mut self) {
        self.scanner.invalidate();
        self.dependencies = None;
    }

    /// Symbols of a single file, always freshly extracted.
    ///
    /// Ignored, unsupported or unreadable files yield no symbols.
    pub fn extract_symbols(&mut self, file_path: &str) -> Vec<SymbolRecord> {
        let Some(relative) = self.relative_path(file_path) else {
            tracing::warn!("{} is outside the repository", file_path);
            return Vec::new();
        };
        if self.scanner.ignore_spec().is_ignored(Path::new(&relative), false) {
            tracing::debug!("{} is ignored", relative);
            return Vec::new();
        }
        let Some(ext) = Path::new(&relative).extension().and_then(|e| e.to_str()) else {
            return Vec::new();
        };
        let bytes = match std::fs::read(self.root.join(&relative)) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!("Cannot read {}: {}", relative, err);
                return Vec::new();
            }
        };

        let source = String::from_utf8_lossy(&bytes);
        let mut symbols = extractor::extract_symbols(&mut self.registry, ext, &source);
        for symbol in &mut symbols {
            symbol.file = Some(relative.clone());
        }
        symbols
    }

    /// Revalidate the symbol cache against the current inventory.
    pub fn scan_repo(&mut self) {
        let files = self.scanner.scan();
        self.symbols.scan_repo(files, &mut self.registry);
    }

    /// Fresh inventory and fully revalidated symbols.
    pub fn get_repo_map(&mut self) -> RepoMap {
        self.scanner.invalidate();
        self.scan_repo();
        RepoMap {
            file_tree: self.scanner.scan().to_vec(),
            symbols: self.symbols.symbols_by_file(),
        }
    }

    /// Alias of [`get_repo_map`](Self::get_repo_map).
    pub fn index(&mut self) -> RepoMap {
        self.get_repo_map()
    }

    pub fn get_file_content(&self, file_path: &str) -> Result<String> {
        let relative = self
            .relative_path(file_path)
            .ok_or_else(|| KiteError::FileNotFound(PathBuf::from(file_path)))?;
        let full_path = self.root.join(&relative);
        if !full_path.is_file() {
            return Err(KiteError::FileNotFound(PathBuf::from(file_path)));
        }
        std::fs::read_to_string(&full_path).map_err(|e| KiteError::io(&full_path, e))
    }

    /// Rebuild the dependency graph from a fresh inventory.
    pub fn build_dependency_graph(&mut self) -> &DependencyGraph {
        self.scanner.invalidate();
        let files = self.scanner.scan();
        let graph = dependencies::build_dependency_graph(&self.root, files, &mut self.registry);
        self.dependencies.insert(graph)
    }

    fn graph(&mut self) -> &DependencyGraph {
        if self.dependencies.is_none() {
            self.build_dependency_graph();
        }
        self.dependencies.get_or_insert_with(DependencyGraph::new)
    }

    pub fn find_cycles(&mut self) -> Vec<Vec<String>> {
        kite_core::find_cycles(self.graph())
    }

    pub fn get_module_dependencies(&mut self, module: &str, include_indirect: bool) -> Vec<String> {
        self.graph().module_dependencies(module, include_indirect)
    }

    pub fn get_dependents(&mut self, module: &str, include_indirect: bool) -> Vec<String> {
        self.graph().module_dependents(module, include_indirect)
    }

    /// Direct dependencies and dependents of the module defined by `file_path`.
    pub fn get_file_dependencies(&mut self, file_path: &str) -> FileDependencies {
        let relative = self
            .relative_path(file_path)
            .unwrap_or_else(|| file_path.to_string());
        let module_name = file_to_module(&relative);
        let graph = self.graph();

        let describe = |ids: Vec<String>| -> Vec<DependencyInfo> {
            ids.into_iter()
                .filter_map(|id| {
                    graph.node(&id).map(|node| DependencyInfo {
                        module: id.clone(),
                        kind: node.kind,
                        path: node.path.clone(),
                    })
                })
                .collect()
        };

        FileDependencies {
            dependencies: describe(graph.module_dependencies(&module_name, false)),
            dependents: describe(graph.module_dependents(&module_name, false)),
            file_path: file_path.to_string(),
            module_name,
        }
    }

    /// Summary report, also written as JSON to `output_path` when given.
    pub fn generate_dependency_report(&mut self, output_path: Option<&Path>) -> Result<DependencyReport> {
        let thresholds = self.config.thresholds;
        let report = DependencyReport::build(self.graph(), thresholds);
        if let Some(path) = output_path {
            report.write_to(path)?;
        }
        Ok(report)
    }

    /// Export as `json`, `dot`, `graphml` or `adjacency`.
    pub fn export_dependency_graph(
        &mut self,
        output_format: &str,
        output_path: Option<&Path>,
    ) -> Result<ExportOutput> {
        let format: ExportFormat = output_format.parse()?;
        kite_core::export(self.graph(), format, output_path)
    }

    pub fn search_text(&mut self, query: &str, options: &SearchOptions) -> Result<Vec<SearchMatch>> {
        let files = self.scanner.scan();
        search::search_text(&self.root, files, query, options)
    }

    /// Definitions named `name` (optionally of type `kind`) followed by every
    /// whole-word occurrence of `name` in the repository.
    pub fn find_symbol_usages(&mut self, name: &str, kind: Option<&str>) -> Result<Vec<SymbolUsage>> {
        let repo_map = self.get_repo_map();

        let mut usages: Vec<SymbolUsage> = repo_map
            .symbols
            .iter()
            .flat_map(|(file, symbols)| symbols.iter().map(move |symbol| (file, symbol)))
            .filter(|(_, symbol)| symbol.name == name && kind.is_none_or(|k| symbol.kind == k))
            .map(|(file, symbol)| SymbolUsage {
                file: file.clone(),
                kind: Some(symbol.kind.clone()),
                name: Some(symbol.name.clone()),
                line: symbol.start_line + 1,
                context: symbol.code.lines().next().unwrap_or_default().to_string(),
            })
            .collect();

        let pattern = format!(r"\b{}\b", regex::escape(name));
        let hits = search::search_text(&self.root, &repo_map.file_tree, &pattern, &SearchOptions::default())?;
        usages.extend(hits.into_iter().map(|hit| SymbolUsage {
            file: hit.file,
            kind: None,
            name: None,
            line: hit.line_number,
            context: hit.line,
        }));

        tracing::debug!("Found {} usages of {}", usages.len(), name);
        Ok(usages)
    }

    /// Repository-relative `/` path for a relative or absolute path under the root.
    fn relative_path(&self, file_path: &str) -> Option<String> {
        let path = Path::new(file_path);
        if !path.is_absolute() {
            return Some(to_slash(path));
        }
        if let Ok(relative) = path.strip_prefix(&self.root) {
            return Some(to_slash(relative));
        }
        let canonical = path.canonicalize().ok()?;
        canonical.strip_prefix(&self.root).ok().map(to_slash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_python_repo, create_repo_with_structure};

    #[test]
    fn test_open_rejects_missing_root() {
        let err = Repository::open("/definitely/not/here").unwrap_err();
        assert!(matches!(err, KiteError::NotADirectory(_)));
    }

    #[test]
    fn test_open_rejects_bad_config() {
        let repo = create_repo_with_structure(&[("kite.toml", "queries-dir = [")]);
        let err = Repository::open(repo.path()).unwrap_err();
        assert!(matches!(err, KiteError::Config { .. }));
    }

    #[test]
    fn test_extract_symbols_accepts_absolute_paths() {
        let repo = create_repo_with_structure(&[("lib/a.py", "def foo():\n    pass\n")]);
        let mut repository = Repository::open(repo.path()).unwrap();

        let relative = repository.extract_symbols("lib/a.py");
        let absolute_path = repository.root().join("lib/a.py");
        let absolute = repository.extract_symbols(absolute_path.to_str().unwrap());
        assert_eq!(relative, absolute);
        assert_eq!(relative[0].file.as_deref(), Some("lib/a.py"));
        assert!(repository.extract_symbols("missing.py").is_empty());
    }

    #[test]
    fn test_get_file_content() {
        let repo = create_repo_with_structure(&[("a.txt", "content")]);
        let repository = Repository::open(repo.path()).unwrap();
        assert_eq!(repository.get_file_content("a.txt").unwrap(), "content");
        assert!(matches!(
            repository.get_file_content("nope.txt"),
            Err(KiteError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_graph_queries() {
        let repo = create_python_repo();
        let mut repository = Repository::open(repo.path()).unwrap();

        assert_eq!(
            repository.get_module_dependencies("main", false),
            vec!["app.service", "os"]
        );
        let indirect = repository.get_module_dependencies("main", true);
        assert!(indirect.contains(&"app.models".to_string()));
        assert!(indirect.contains(&"json".to_string()));
        assert_eq!(repository.get_dependents("app.models", false), vec!["app.service"]);
        assert!(repository.get_module_dependencies("unknown", true).is_empty());
    }

    #[test]
    fn test_file_dependencies() {
        let repo = create_python_repo();
        let mut repository = Repository::open(repo.path()).unwrap();
        let deps = repository.get_file_dependencies("app/service.py");

        assert_eq!(deps.module_name, "app.service");
        let modules: Vec<&str> = deps.dependencies.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(modules, vec!["app.models", "json"]);
        assert_eq!(deps.dependencies[0].path.as_deref(), Some("app/models.py"));
        let dependents: Vec<&str> = deps.dependents.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(dependents, vec!["app.models", "main"]);

        let none = repository.get_file_dependencies("nowhere.py");
        assert!(none.dependencies.is_empty() && none.dependents.is_empty());
    }

    #[test]
    fn test_export_and_report() {
        let repo = create_python_repo();
        let mut repository = Repository::open(repo.path()).unwrap();

        let ExportOutput::Text(dot) = repository.export_dependency_graph("dot", None).unwrap() else {
            panic!("dot export should be text");
        };
        assert!(dot.contains(r#""main" -> "app.service";"#));
        assert!(matches!(
            repository.export_dependency_graph("yaml", None),
            Err(KiteError::UnsupportedFormat(_))
        ));

        let out = repo.path().join("report.json");
        let report = repository.generate_dependency_report(Some(&out)).unwrap();
        assert_eq!(report.summary.dependency_cycles, 1);
        assert_eq!(report.cycles[0], vec!["app.models", "app.service", "app.models"]);
        assert_eq!(report.external_dependencies, vec!["json", "os"]);
        assert!(out.is_file());
    }
}
