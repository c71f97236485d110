//! Ignore rules: the root `.gitignore`, configured excludes and VCS metadata

use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Directory that is always excluded.
const VCS_DIR: &str = ".git";

/// Compiled ignore predicate for one repository root.
#[derive(Debug, Clone)]
pub struct IgnoreSpec {
    root: PathBuf,
    matcher: Option<Gitignore>,
}

impl IgnoreSpec {
    /// Compile `<root>/.gitignore` plus `extra_patterns`.
    ///
    /// Never fails: a missing, unreadable or malformed `.gitignore` leaves
    /// only the VCS exclusion and the extra patterns in effect.
    pub fn load(root: &Path, extra_patterns: &[String]) -> Self {
        let gitignore = root.join(".gitignore");
        let mut builder = GitignoreBuilder::new(root);

        if gitignore.is_file() {
            if let Some(err) = builder.add(&gitignore) {
                tracing::warn!(
                    "Ignoring {} after load failure: {}",
                    gitignore.display(),
                    err
                );
                builder = GitignoreBuilder::new(root);
            }
        } else {
            tracing::warn!("No .gitignore found at {}", root.display());
        }

        for pattern in extra_patterns {
            if let Err(err) = builder.add_line(None, pattern) {
                tracing::warn!("Skipping invalid exclude pattern {:?}: {}", pattern, err);
            }
        }

        let matcher = match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(err) => {
                tracing::warn!("Failed to compile ignore rules: {}", err);
                None
            }
        };

        IgnoreSpec {
            root: root.to_path_buf(),
            matcher,
        }
    }

    /// Spec that only excludes VCS metadata.
    pub fn vcs_only(root: &Path) -> Self {
        IgnoreSpec {
            root: root.to_path_buf(),
            matcher: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` (relative to the root, or absolute under it) is ignored.
    ///
    /// Absolute paths outside the root are never ignored.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => return false,
            }
        } else {
            path
        };

        if relative
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == VCS_DIR))
        {
            return true;
        }
        if relative.as_os_str().is_empty() {
            return false;
        }

        match &self.matcher {
            Some(matcher) => matcher
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore(),
            None => false,
        }
    }
}
