//! Regex search over the repository inventory

use std::path::Path;

use globset::{Glob, GlobMatcher};
use kite_core::{FileEntry, KiteError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub context_before: usize,
    pub context_after: usize,
    /// Glob matched against the file name, or the whole relative path when
    /// it contains a `/`. `None` searches every file.
    pub file_pattern: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            case_sensitive: true,
            context_before: 0,
            context_after: 0,
            file_pattern: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub file: String,
    /// 1-based.
    pub line_number: usize,
    pub line: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

/// Search `query` (a regex) in every file of `files`.
///
/// Invalid patterns are errors; unreadable files are skipped.
pub fn search_text(
    root: &Path,
    files: &[FileEntry],
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchMatch>> {
    let regex = RegexBuilder::new(query)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|e| KiteError::Pattern(e.to_string()))?;
    let matcher = options
        .file_pattern
        .as_deref()
        .map(|pattern| {
            Glob::new(pattern)
                .map(|g| g.compile_matcher())
                .map_err(|e| KiteError::Pattern(e.to_string()))
        })
        .transpose()?;

    let mut results = Vec::new();
    for file in files.iter().filter(|f| !f.is_dir) {
        if let Some(matcher) = &matcher {
            if !file_matches(matcher, options.file_pattern.as_deref(), file) {
                continue;
            }
        }
        let bytes = match std::fs::read(root.join(&file.path)) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!("Skipping {} in search: {}", file.path, err);
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        search_lines(&regex, &file.path, &content, options, &mut results);
    }

    tracing::debug!("Search {:?} matched {} lines", query, results.len());
    Ok(results)
}

fn file_matches(matcher: &GlobMatcher, pattern: Option<&str>, file: &FileEntry) -> bool {
    if pattern.is_some_and(|p| p.contains('/')) {
        matcher.is_match(&file.path)
    } else {
        matcher.is_match(&file.name)
    }
}

fn search_lines(
    regex: &Regex,
    file: &str,
    content: &str,
    options: &SearchOptions,
    out: &mut Vec<SearchMatch>,
) {
    let lines: Vec<&str> = content.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !regex.is_match(line) {
            continue;
        }
        let before = i.saturating_sub(options.context_before);
        let after = (i + 1 + options.context_after).min(lines.len());
        out.push(SearchMatch {
            file: file.to_string(),
            line_number: i + 1,
            line: line.to_string(),
            context_before: lines[before..i].iter().map(|l| l.to_string()).collect(),
            context_after: lines[i + 1..after].iter().map(|l| l.to_string()).collect(),
        });
    }
}
