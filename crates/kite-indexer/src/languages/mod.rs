//! Extension to grammar table
//!
//! Adding a language means adding a row here and a `queries/<name>/tags.scm`
//! file. Grammars whose captures need reshaping name a [`PostProcess`] rule.

pub mod hcl;

use kite_core::SymbolRecord;
use tree_sitter::Language;

/// Grammar-specific rewriting applied to normalized symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    None,
    Hcl,
}

impl PostProcess {
    /// Clean up a raw name capture.
    pub fn clean_name(&self, node_kind: &str, text: &str) -> String {
        match self {
            PostProcess::None => text.to_string(),
            PostProcess::Hcl => hcl::clean_name(node_kind, text),
        }
    }

    /// Final adjustment once name, type and span are known.
    pub fn finish(&self, symbol: &mut SymbolRecord, type_capture: Option<&str>) {
        match self {
            PostProcess::None => {}
            PostProcess::Hcl => hcl::qualify(symbol, type_capture),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LanguageSpec {
    pub name: &'static str,
    /// Directory under the queries root holding `tags.scm`.
    pub query_dir: &'static str,
    pub extensions: &'static [&'static str],
    pub grammar: fn() -> Language,
    pub post_process: PostProcess,
}

pub static LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        name: "python",
        query_dir: "python",
        extensions: &["py"],
        grammar: || tree_sitter_python::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "javascript",
        query_dir: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        grammar: || tree_sitter_javascript::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "typescript",
        query_dir: "typescript",
        extensions: &["ts"],
        grammar: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "tsx",
        query_dir: "typescript",
        extensions: &["tsx"],
        grammar: || tree_sitter_typescript::LANGUAGE_TSX.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "go",
        query_dir: "go",
        extensions: &["go"],
        grammar: || tree_sitter_go::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "rust",
        query_dir: "rust",
        extensions: &["rs"],
        grammar: || tree_sitter_rust::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "java",
        query_dir: "java",
        extensions: &["java"],
        grammar: || tree_sitter_java::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "c",
        query_dir: "c",
        extensions: &["c", "h"],
        grammar: || tree_sitter_c::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "cpp",
        query_dir: "cpp",
        extensions: &["cpp", "cc", "cxx", "hpp", "hh"],
        grammar: || tree_sitter_cpp::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "ruby",
        query_dir: "ruby",
        extensions: &["rb"],
        grammar: || tree_sitter_ruby::LANGUAGE.into(),
        post_process: PostProcess::None,
    },
    LanguageSpec {
        name: "hcl",
        query_dir: "hcl",
        extensions: &["hcl", "tf"],
        grammar: || tree_sitter_hcl::LANGUAGE.into(),
        post_process: PostProcess::Hcl,
    },
];

/// Lowercase an extension and drop a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Language registered for `ext` (with or without the leading dot).
pub fn for_extension(ext: &str) -> Option<&'static LanguageSpec> {
    let ext = normalize_extension(ext);
    LANGUAGES
        .iter()
        .find(|lang| lang.extensions.contains(&ext.as_str()))
}
