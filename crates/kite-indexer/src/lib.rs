//! Repository scanning, symbol extraction and import analysis

pub mod config;
pub mod dependencies;
pub mod extractor;
pub mod ignore_spec;
pub mod languages;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod scanner;
pub mod search;
pub mod symbol_cache;

#[cfg(test)]
pub mod test_utils;

pub use config::KiteConfig;
pub use dependencies::{DependencyGraphBuilder, build_dependency_graph};
pub use extractor::extract_symbols;
pub use ignore_spec::IgnoreSpec;
pub use languages::{LanguageSpec, PostProcess};
pub use registry::{Grammar, GrammarRegistry};
pub use repository::{RepoMap, Repository, SymbolUsage};
pub use resolver::{ModuleResolver, file_to_module};
pub use scanner::FileTreeScanner;
pub use search::{SearchMatch, SearchOptions};
pub use symbol_cache::{CacheEntry, CacheStats, SymbolCache};
