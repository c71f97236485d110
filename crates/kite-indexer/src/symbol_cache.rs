//! Per-file symbol cache keyed by absolute path and validated by mtime

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use kite_core::{FileEntry, SymbolRecord};
use serde::Serialize;

use crate::extractor::extract_symbols;
use crate::registry::GrammarRegistry;

/// Symbols extracted from one file at a given modification time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub mtime: SystemTime,
    /// Repository-relative path, `/`-separated.
    pub relative_path: String,
    pub symbols: Vec<SymbolRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub tracked_files: usize,
}

#[derive(Debug)]
pub struct SymbolCache {
    root: PathBuf,
    entries: HashMap<PathBuf, CacheEntry>,
    hits: usize,
    misses: usize,
}

impl SymbolCache {
    pub fn new(root: &Path) -> Self {
        SymbolCache {
            root: root.to_path_buf(),
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Revalidate every supported file in `files`, re-extracting only those
    /// whose mtime changed. Entries for files no longer listed are dropped.
    pub fn scan_repo(&mut self, files: &[FileEntry], registry: &mut GrammarRegistry) {
        let mut seen = HashSet::new();
        let (hits_before, misses_before) = (self.hits, self.misses);

        for file in files.iter().filter(|f| !f.is_dir) {
            let Some(ext) = file.extension() else {
                continue;
            };
            if !registry.is_supported(&ext) {
                continue;
            }

            let path = self.root.join(&file.path);
            let mtime = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => mtime,
                Err(err) => {
                    tracing::warn!("Cannot stat {}: {}", path.display(), err);
                    continue;
                }
            };
            seen.insert(path.clone());

            if self.entries.get(&path).is_some_and(|e| e.mtime == mtime) {
                self.hits += 1;
                continue;
            }

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!("Cannot read {}: {}", path.display(), err);
                    seen.remove(&path);
                    continue;
                }
            };
            let source = String::from_utf8_lossy(&bytes);
            let mut symbols = extract_symbols(registry, &ext, &source);
            for symbol in &mut symbols {
                symbol.file = Some(file.path.clone());
            }

            self.misses += 1;
            self.entries.insert(
                path,
                CacheEntry {
                    mtime,
                    relative_path: file.path.clone(),
                    symbols,
                },
            );
        }

        let before = self.entries.len();
        self.entries.retain(|path, _| seen.contains(path));
        let pruned = before - self.entries.len();

        tracing::debug!(
            "Symbol scan: {} cached, {} extracted, {} pruned",
            self.hits - hits_before,
            self.misses - misses_before,
            pruned
        );
    }

    pub fn get(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Cached symbols grouped by relative path.
    pub fn symbols_by_file(&self) -> BTreeMap<String, Vec<SymbolRecord>> {
        self.entries
            .values()
            .map(|entry| (entry.relative_path.clone(), entry.symbols.clone()))
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            tracked_files: self.entries.len(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{bump_mtime, create_repo_with_structure};
    use crate::{FileTreeScanner, IgnoreSpec};
    use std::sync::Arc;

    fn inventory(root: &Path) -> Vec<FileEntry> {
        FileTreeScanner::new(root, Arc::new(IgnoreSpec::load(root, &[])))
            .scan()
            .to_vec()
    }

    #[test]
    fn test_unchanged_files_are_not_reparsed() {
        let repo = create_repo_with_structure(&[
            ("a.py", "def foo():\n    pass\n"),
            ("b.py", "class Bar:\n    pass\n"),
            ("notes.txt", "not code"),
        ]);
        let files = inventory(repo.path());
        let mut registry = GrammarRegistry::default();
        let mut cache = SymbolCache::new(repo.path());

        cache.scan_repo(&files, &mut registry);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2, tracked_files: 2 });

        cache.scan_repo(&files, &mut registry);
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 2, tracked_files: 2 });

        bump_mtime(&repo.path().join("a.py"));
        cache.scan_repo(&files, &mut registry);
        assert_eq!(cache.stats(), CacheStats { hits: 3, misses: 3, tracked_files: 2 });
    }

    #[test]
    fn test_symbols_carry_relative_file() {
        let repo = create_repo_with_structure(&[("pkg/mod.py", "def foo():\n    pass\n")]);
        let files = inventory(repo.path());
        let mut registry = GrammarRegistry::default();
        let mut cache = SymbolCache::new(repo.path());
        cache.scan_repo(&files, &mut registry);

        let by_file = cache.symbols_by_file();
        let symbols = &by_file["pkg/mod.py"];
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].file.as_deref(), Some("pkg/mod.py"));

        let entry = cache.get(&repo.path().join("pkg/mod.py")).unwrap();
        assert_eq!(entry.symbols, *symbols);
    }

    #[test]
    fn test_deleted_files_are_pruned() {
        let repo = create_repo_with_structure(&[("a.py", "def foo(): pass\n"), ("b.py", "")]);
        let mut registry = GrammarRegistry::default();
        let mut cache = SymbolCache::new(repo.path());
        cache.scan_repo(&inventory(repo.path()), &mut registry);
        assert_eq!(cache.stats().tracked_files, 2);

        std::fs::remove_file(repo.path().join("b.py")).unwrap();
        cache.scan_repo(&inventory(repo.path()), &mut registry);
        assert_eq!(cache.stats().tracked_files, 1);
        assert!(!cache.symbols_by_file().contains_key("b.py"));
    }
}
