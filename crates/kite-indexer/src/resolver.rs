//! Python module naming and the module-name to path map

use std::collections::HashMap;

use kite_core::FileEntry;

const INIT_SUFFIX: &str = ".__init__";

/// Extension of files that take part in module resolution.
pub const PYTHON_EXTENSION: &str = "py";

/// Dotted module id for a relative file path.
///
/// `pkg/sub/mod.py` is `pkg.sub.mod`; `pkg/sub/__init__.py` is `pkg.sub`.
pub fn file_to_module(path: &str) -> String {
    let dotted = raw_module_name(path);
    match dotted.strip_suffix(INIT_SUFFIX) {
        Some(package) => package.to_string(),
        None => dotted,
    }
}

/// Whether `path` is a package initializer.
pub fn is_package_init(path: &str) -> bool {
    let name = raw_module_name(path);
    name == "__init__" || name.ends_with(INIT_SUFFIX)
}

fn raw_module_name(path: &str) -> String {
    let stem = match path.rfind('.') {
        Some(dot) if !path[dot..].contains(['/', '\\']) => &path[..dot],
        _ => path,
    };
    stem.replace(['/', '\\'], ".")
}

/// Maps module ids (and every dotted prefix of them) to repository paths.
#[derive(Debug, Clone, Default)]
pub struct ModuleResolver {
    modules: HashMap<String, String>,
}

impl ModuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from every `.py` file in the inventory.
    pub fn build(files: &[FileEntry]) -> Self {
        let mut resolver = Self::new();
        for file in files.iter().filter(|f| !f.is_dir) {
            if file.extension().as_deref() == Some(PYTHON_EXTENSION) {
                resolver.register(&file.path);
            }
        }
        tracing::debug!("Module map holds {} entries", resolver.modules.len());
        resolver
    }

    /// Record one source file.
    pub fn register(&mut self, path: &str) {
        let dotted = raw_module_name(path);

        if let Some(package) = dotted.strip_suffix(INIT_SUFFIX) {
            self.modules
                .insert(package.to_string(), parent_dir(path).to_string());
        }
        self.modules.insert(dotted.clone(), path.to_string());

        let parts: Vec<&str> = dotted.split('.').collect();
        for i in 1..parts.len() {
            let prefix = parts[..i].join(".");
            self.modules
                .entry(prefix)
                .or_insert_with(|| parts[..i].join("/"));
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Best-known repository path for `module`: a file or a package directory.
    pub fn resolve(&self, module: &str) -> Option<&str> {
        self.modules.get(module).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn parent_dir(path: &str) -> &str {
    path.rfind(['/', '\\']).map_or("", |i| &path[..i])
}
