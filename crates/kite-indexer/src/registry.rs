//! Memoized parsers and compiled tag queries, per file extension

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tree_sitter::{Parser, Query};

use crate::config::default_queries_dir;
use crate::languages::{self, LanguageSpec};

/// File name of a language's query definition.
pub const TAGS_FILE: &str = "tags.scm";

/// Parser, query and rules for one extension, borrowed from the registry.
pub struct Grammar<'a> {
    pub language: &'static LanguageSpec,
    pub parser: &'a mut Parser,
    pub query: &'a Query,
}

/// Owns every parser and query for one engine instance.
///
/// Failed lookups are memoized as well, so a missing or broken query file is
/// reported once per extension.
pub struct GrammarRegistry {
    queries_dir: PathBuf,
    parsers: HashMap<String, Option<Parser>>,
    queries: HashMap<String, Option<Query>>,
}

impl fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarRegistry")
            .field("queries_dir", &self.queries_dir)
            .field("parsers", &self.parsers.keys().collect::<Vec<_>>())
            .field("queries", &self.queries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new(default_queries_dir())
    }
}

impl GrammarRegistry {
    pub fn new(queries_dir: impl Into<PathBuf>) -> Self {
        GrammarRegistry {
            queries_dir: queries_dir.into(),
            parsers: HashMap::new(),
            queries: HashMap::new(),
        }
    }

    pub fn queries_dir(&self) -> &Path {
        &self.queries_dir
    }

    /// Whether `ext` maps to a registered language.
    pub fn is_supported(&self, ext: &str) -> bool {
        languages::for_extension(ext).is_some()
    }

    pub fn get_parser(&mut self, ext: &str) -> Option<&mut Parser> {
        let ext = languages::normalize_extension(ext);
        self.parsers
            .entry(ext)
            .or_insert_with_key(|ext| languages::for_extension(ext).and_then(build_parser))
            .as_mut()
    }

    pub fn get_query(&mut self, ext: &str) -> Option<&Query> {
        let ext = languages::normalize_extension(ext);
        let queries_dir = &self.queries_dir;
        self.queries
            .entry(ext)
            .or_insert_with_key(|ext| {
                languages::for_extension(ext).and_then(|lang| load_query(queries_dir, lang))
            })
            .as_ref()
    }

    /// Parser and query together, or `None` if either is unavailable.
    pub fn grammar(&mut self, ext: &str) -> Option<Grammar<'_>> {
        let ext = languages::normalize_extension(ext);
        let language = languages::for_extension(&ext)?;

        if !self.parsers.contains_key(&ext) {
            self.parsers.insert(ext.clone(), build_parser(language));
        }
        if !self.queries.contains_key(&ext) {
            let query = load_query(&self.queries_dir, language);
            self.queries.insert(ext.clone(), query);
        }

        let parser = self.parsers.get_mut(&ext)?.as_mut()?;
        let query = self.queries.get(&ext)?.as_ref()?;
        Some(Grammar {
            language,
            parser,
            query,
        })
    }
}

fn build_parser(language: &LanguageSpec) -> Option<Parser> {
    let mut parser = Parser::new();
    match parser.set_language(&(language.grammar)()) {
        Ok(()) => Some(parser),
        Err(err) => {
            tracing::error!("Grammar for {} is incompatible: {}", language.name, err);
            None
        }
    }
}

fn load_query(queries_dir: &Path, language: &LanguageSpec) -> Option<Query> {
    let path = queries_dir.join(language.query_dir).join(TAGS_FILE);
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(
                "No query definition for {} at {}: {}",
                language.name,
                path.display(),
                err
            );
            return None;
        }
    };

    match Query::new(&(language.grammar)(), &source) {
        Ok(query) => {
            tracing::debug!("Compiled {} for {}", path.display(), language.name);
            Some(query)
        }
        Err(err) => {
            tracing::error!("Invalid query definition {}: {}", path.display(), err);
            None
        }
    }
}
