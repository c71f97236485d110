//! HCL / Terraform symbol rules
//!
//! Block labels are string literals, so names arrive quoted. `resource` and
//! `data` blocks carry two labels and are addressed as `<type>.<name>`.

use kite_core::SymbolRecord;

/// Symbol types whose name is qualified by the block's type label.
const QUALIFIED_KINDS: &[&str] = &["resource", "data"];

pub fn clean_name(node_kind: &str, text: &str) -> String {
    if node_kind == "string_lit" {
        unquote(text).to_string()
    } else {
        text.to_string()
    }
}

pub fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Compose `<type>.<name>` for resource and data blocks.
pub fn qualify(symbol: &mut SymbolRecord, type_capture: Option<&str>) {
    if !QUALIFIED_KINDS.contains(&symbol.kind.as_str()) {
        return;
    }
    let Some(resource_type) = type_capture.map(unquote) else {
        return;
    };
    if resource_type.is_empty() {
        return;
    }
    symbol.name = format!("{}.{}", resource_type, symbol.name);
    symbol.subtype = Some(resource_type.to_string());
}
