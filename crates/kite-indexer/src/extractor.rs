//! Query-driven symbol extraction
//!
//! Runs a language's `tags.scm` against the parse tree and normalizes each
//! match into a [`SymbolRecord`]. Capture labels drive everything:
//!
//! - `@name` (or `@type`, or the first capture) supplies the symbol name
//! - `@definition.<kind>` supplies the type and the body span

use anyhow::{Context, anyhow};
use kite_core::SymbolRecord;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor};

use crate::registry::{Grammar, GrammarRegistry};

const DEFINITION_PREFIX: &str = "definition.";
const DEFAULT_KIND: &str = "symbol";

/// Extract symbols from `source`, treating it as a file with extension `ext`.
///
/// Never fails: unsupported extensions and parse errors yield an empty list.
pub fn extract_symbols(registry: &mut GrammarRegistry, ext: &str, source: &str) -> Vec<SymbolRecord> {
    let Some(grammar) = registry.grammar(ext) else {
        tracing::debug!("No grammar available for extension {:?}", ext);
        return Vec::new();
    };
    let language = grammar.language.name;

    match try_extract(grammar, source) {
        Ok(symbols) => {
            tracing::debug!("Extracted {} {} symbols", symbols.len(), language);
            symbols
        }
        Err(err) => {
            tracing::warn!("Symbol extraction failed for {} source: {:#}", language, err);
            Vec::new()
        }
    }
}

fn try_extract(grammar: Grammar<'_>, source: &str) -> anyhow::Result<Vec<SymbolRecord>> {
    let Grammar {
        language,
        parser,
        query,
    } = grammar;
    let rule = language.post_process;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("parser returned no tree"))?;
    let bytes = source.as_bytes();
    let labels = query.capture_names();

    let mut symbols = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), bytes);

    while let Some(m) = matches.next() {
        let mut captures: Vec<(&str, Vec<Node>)> = Vec::new();
        for capture in m.captures {
            let label = labels
                .get(capture.index as usize)
                .copied()
                .context("capture index out of range")?;
            match captures.iter_mut().find(|(l, _)| *l == label) {
                Some((_, nodes)) => nodes.push(capture.node),
                None => captures.push((label, vec![capture.node])),
            }
        }

        let group = |label: &str| {
            captures
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, nodes)| nodes.as_slice())
        };

        let name_nodes = group("name")
            .or_else(|| group("type"))
            .or_else(|| captures.first().map(|(_, nodes)| nodes.as_slice()));
        let Some(&name_node) = name_nodes.and_then(|nodes| nodes.first()) else {
            continue;
        };
        let name = rule.clean_name(name_node.kind(), &node_text(name_node, source, ""));

        let definition = captures
            .iter()
            .find(|(label, _)| label.starts_with(DEFINITION_PREFIX));
        let kind = match definition {
            Some((label, _)) => label.rsplit('.').next().unwrap_or(DEFAULT_KIND).to_string(),
            None => fallback_kind(captures.first().map(|(label, _)| *label)),
        };

        let body = definition
            .and_then(|(_, nodes)| nodes.first().copied())
            .unwrap_or(name_node);

        let mut symbol = SymbolRecord {
            code: node_text(body, source, &name),
            name,
            kind,
            start_line: body.start_position().row,
            end_line: body.end_position().row,
            subtype: None,
            file: None,
        };

        let type_text = group("type")
            .and_then(|nodes| nodes.first())
            .map(|node| node_text(*node, source, ""));
        rule.finish(&mut symbol, type_text.as_deref());

        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Type for matches without a `@definition.*` capture.
fn fallback_kind(first_label: Option<&str>) -> String {
    let label = first_label.unwrap_or(DEFAULT_KIND);
    let label = label.strip_prefix(DEFINITION_PREFIX).unwrap_or(label);
    if label.is_empty() {
        DEFAULT_KIND.to_string()
    } else {
        label.to_string()
    }
}

fn node_text(node: Node<'_>, source: &str, fallback: &str) -> String {
    match node.utf8_text(source.as_bytes()) {
        Ok(text) => text.to_string(),
        Err(_) => source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or(fallback)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_and_kinds(symbols: &[SymbolRecord]) -> Vec<(String, String)> {
        symbols
            .iter()
            .map(|s| (s.name.clone(), s.kind.clone()))
            .collect()
    }

    #[test]
    fn test_python_functions_and_classes() {
        let source = "class Greeter:\n    def greet(self):\n        return 'hi'\n\n\ndef main():\n    Greeter().greet()\n";
        let mut registry = GrammarRegistry::default();
        let symbols = extract_symbols(&mut registry, "py", source);

        let mut found = names_and_kinds(&symbols);
        found.sort();
        assert_eq!(
            found,
            vec![
                ("Greeter".to_string(), "class".to_string()),
                ("greet".to_string(), "method".to_string()),
                ("main".to_string(), "function".to_string()),
            ]
        );

        let class = symbols.iter().find(|s| s.name == "Greeter").unwrap();
        assert_eq!(class.start_line, 0);
        assert_eq!(class.end_line, 2);
        assert!(class.code.starts_with("class Greeter:"));
        assert!(class.start_line <= class.end_line);
    }

    #[test]
    fn test_python_methods_and_top_level_functions() {
        let source = r#"import asyncio

def top_level_function(arg1, arg2):
    pass

class MyClass:
    def __init__(self, value):
        self.value = value

    def method_one(self, param):
        return self.value + param

    @staticmethod
    def helper():
        def inner():
            pass
        return inner

    class Nested:
        def run(self):
            pass

@decorator
def decorated():
    def wrapper():
        pass
    return wrapper

async def async_function():
    await asyncio.sleep(1)

CONSTANT_VALUE = 100
"#;
        let mut registry = GrammarRegistry::default();
        let symbols = extract_symbols(&mut registry, "py", source);

        let mut found = names_and_kinds(&symbols);
        found.sort();
        let mut expected: Vec<(String, String)> = [
            ("top_level_function", "function"),
            ("MyClass", "class"),
            ("__init__", "method"),
            ("method_one", "method"),
            ("helper", "method"),
            ("Nested", "class"),
            ("run", "method"),
            ("decorated", "function"),
            ("async_function", "function"),
        ]
        .iter()
        .map(|(n, k)| (n.to_string(), k.to_string()))
        .collect();
        expected.sort();
        assert_eq!(found, expected);

        let helper = symbols.iter().find(|s| s.name == "helper").unwrap();
        assert!(helper.code.starts_with("def helper():"));
    }

    #[test]
    fn test_rust_items() {
        let source = "pub struct Point { x: i32 }\n\nimpl Point {\n    fn norm(&self) -> i32 { self.x }\n}\n\nfn main() {}\n";
        let mut registry = GrammarRegistry::default();
        let symbols = extract_symbols(&mut registry, ".rs", source);
        let found = names_and_kinds(&symbols);

        assert!(found.contains(&("Point".to_string(), "struct".to_string())));
        assert!(found.contains(&("Point".to_string(), "implementation".to_string())));
        assert!(found.contains(&("norm".to_string(), "function".to_string())));
        assert!(found.contains(&("main".to_string(), "function".to_string())));
    }

    #[test]
    fn test_hcl_blocks() {
        let source = r#"
provider "aws" {
  region = "us-west-2"
}

resource "aws_instance" "web" {
  ami = "ami-123"
}

data "aws_ami" "ubuntu" {
  most_recent = true
}

variable "instance_count" {
  default = 2
}

locals {
  environment = "dev"
}
"#;
        let mut registry = GrammarRegistry::default();
        let symbols = extract_symbols(&mut registry, "tf", source);

        let web = symbols.iter().find(|s| s.kind == "resource").unwrap();
        assert_eq!(web.name, "aws_instance.web");
        assert_eq!(web.subtype.as_deref(), Some("aws_instance"));
        assert!(web.code.starts_with("resource \"aws_instance\" \"web\""));

        let ami = symbols.iter().find(|s| s.kind == "data").unwrap();
        assert_eq!(ami.name, "aws_ami.ubuntu");
        assert_eq!(ami.subtype.as_deref(), Some("aws_ami"));

        let found = names_and_kinds(&symbols);
        assert!(found.contains(&("aws".to_string(), "provider".to_string())));
        assert!(found.contains(&("instance_count".to_string(), "variable".to_string())));
        assert!(found.contains(&("locals".to_string(), "locals".to_string())));
        assert!(symbols.iter().filter(|s| s.kind != "resource" && s.kind != "data").all(|s| s.subtype.is_none()));
    }

    #[test]
    fn test_hcl_resource_with_matching_labels() {
        let source = "resource \"null_resource\" \"null_resource\" {\n  triggers = {}\n}\n";
        let mut registry = GrammarRegistry::default();
        for ext in ["tf", "hcl"] {
            let symbols = extract_symbols(&mut registry, ext, source);
            assert_eq!(symbols.len(), 1);
            assert_eq!(symbols[0].name, "null_resource.null_resource");
            assert_eq!(symbols[0].kind, "resource");
            assert_eq!(symbols[0].subtype.as_deref(), Some("null_resource"));
            assert_eq!(symbols[0].start_line, 0);
            assert_eq!(symbols[0].end_line, 2);
        }
    }

    #[test]
    fn test_unsupported_extension_is_empty() {
        let mut registry = GrammarRegistry::default();
        assert!(extract_symbols(&mut registry, "md", "# Title").is_empty());
    }

    #[test]
    fn test_broken_source_does_not_fail() {
        let mut registry = GrammarRegistry::default();
        let _ = extract_symbols(&mut registry, "py", "def broken(:\n    pass\n\x00\x01 ((((\n");
        let symbols = extract_symbols(&mut registry, "py", "def ok():\n    pass\n");
        assert_eq!(names_and_kinds(&symbols), vec![("ok".to_string(), "function".to_string())]);
    }

    #[test]
    fn test_fallback_kind() {
        assert_eq!(fallback_kind(Some("definition.function")), "function");
        assert_eq!(fallback_kind(Some("reference")), "reference");
        assert_eq!(fallback_kind(None), "symbol");
        assert_eq!(fallback_kind(Some("definition.")), "symbol");
    }

    #[test]
    fn test_query_without_definition_captures() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("python")).unwrap();
        std::fs::write(
            dir.path().join("python/tags.scm"),
            "(call function: (identifier) @reference)",
        )
        .unwrap();
        let mut registry = GrammarRegistry::new(dir.path());
        let symbols = extract_symbols(&mut registry, "py", "print(1)\n");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "print");
        assert_eq!(symbols[0].kind, "reference");
        assert_eq!(symbols[0].code, "print");
    }
}
