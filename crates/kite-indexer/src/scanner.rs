//! Repository inventory walk

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use kite_core::FileEntry;

use crate::ignore_spec::IgnoreSpec;

/// Walks the root once and memoizes the inventory until [`invalidate`](Self::invalidate).
#[derive(Debug)]
pub struct FileTreeScanner {
    root: PathBuf,
    ignore: Arc<IgnoreSpec>,
    cache: Option<Vec<FileEntry>>,
}

impl FileTreeScanner {
    pub fn new(root: &Path, ignore: Arc<IgnoreSpec>) -> Self {
        FileTreeScanner {
            root: root.to_path_buf(),
            ignore,
            cache: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ignore_spec(&self) -> &IgnoreSpec {
        &self.ignore
    }

    /// Inventory of all non-ignored entries, ordered by path components.
    pub fn scan(&mut self) -> &[FileEntry] {
        if self.cache.is_none() {
            let entries = self.walk();
            tracing::debug!("Scanned {} entries under {}", entries.len(), self.root.display());
            self.cache = Some(entries);
        }
        self.cache.as_deref().unwrap_or_default()
    }

    /// Drop the memoized inventory; the next [`scan`](Self::scan) walks again.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    fn walk(&self) -> Vec<FileEntry> {
        let ignore = Arc::clone(&self.ignore);
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !ignore.is_ignored(entry.path(), is_dir)
            })
            .build();

        let mut entries = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let size = if is_dir {
                0
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            };

            entries.push(FileEntry {
                path: to_slash(relative),
                is_dir,
                name: entry.file_name().to_string_lossy().into_owned(),
                size,
            });
        }
        entries
    }
}

/// Relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
