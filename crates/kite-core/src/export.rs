//! Serialization of the dependency graph to external formats

use crate::error::{KiteError, Result};
use crate::graph::DependencyGraph;
use crate::model::ModuleKind;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Dot,
    GraphMl,
    Adjacency,
}

impl FromStr for ExportFormat {
    type Err = KiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "dot" => Ok(ExportFormat::Dot),
            "graphml" => Ok(ExportFormat::GraphMl),
            "adjacency" => Ok(ExportFormat::Adjacency),
            _ => Err(KiteError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutput {
    /// Content was written to this path.
    Written(PathBuf),
    Json(serde_json::Value),
    Text(String),
}

impl ExportOutput {
    /// Render in-memory content as text; written exports yield their path.
    pub fn into_text(self) -> Result<String> {
        match self {
            ExportOutput::Written(path) => Ok(path.display().to_string()),
            ExportOutput::Json(value) => Ok(serde_json::to_string_pretty(&value)?),
            ExportOutput::Text(text) => Ok(text),
        }
    }
}

/// Export `graph` as `format`, writing to `output_path` when given.
pub fn export(
    graph: &DependencyGraph,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<ExportOutput> {
    let output = match format {
        ExportFormat::Json => ExportOutput::Json(serde_json::to_value(graph.to_entries())?),
        ExportFormat::Adjacency => ExportOutput::Json(serde_json::to_value(to_adjacency(graph))?),
        ExportFormat::Dot => ExportOutput::Text(to_dot(graph)),
        ExportFormat::GraphMl => ExportOutput::Text(to_graphml(graph)),
    };

    let Some(path) = output_path else {
        return Ok(output);
    };
    let content = output.into_text()?;
    std::fs::write(path, content).map_err(|e| KiteError::io(path, e))?;
    tracing::info!("Exported dependency graph ({:?}) to {}", format, path.display());
    Ok(ExportOutput::Written(path.to_path_buf()))
}

/// Module id -> dependency list.
pub fn to_adjacency(graph: &DependencyGraph) -> BTreeMap<String, Vec<String>> {
    graph
        .to_entries()
        .into_iter()
        .map(|(id, entry)| (id, entry.dependencies))
        .collect()
}

/// Graphviz digraph; internal modules light blue, external light green.
pub fn to_dot(graph: &DependencyGraph) -> String {
    let mut lines = vec![
        "digraph G {".to_string(),
        "  rankdir=\"LR\";".to_string(),
        "  node [shape=box];".to_string(),
    ];

    for node in graph.nodes() {
        let color = match node.kind {
            ModuleKind::Internal => "lightblue",
            ModuleKind::External => "lightgreen",
        };
        lines.push(format!(
            "  \"{}\" [style=filled, fillcolor={}];",
            dot_escape(&node.id),
            color
        ));
    }

    for node in graph.nodes() {
        for dep in graph.dependencies(&node.id) {
            if graph.contains(dep) {
                lines.push(format!("  \"{}\" -> \"{}\";", dot_escape(&node.id), dot_escape(dep)));
            }
        }
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// GraphML node/edge list with `type` and `path` node attributes.
pub fn to_graphml(graph: &DependencyGraph) -> String {
    let mut lines: Vec<String> = [
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns""#,
        r#"  xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
        r#"  xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns"#,
        r#"  http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">"#,
        r#"<key id="type" for="node" attr.name="type" attr.type="string"/>"#,
        r#"<key id="path" for="node" attr.name="path" attr.type="string"/>"#,
        r#"<graph id="G" edgedefault="directed">"#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for node in graph.nodes() {
        lines.push(format!("  <node id=\"{}\">", xml_escape(&node.id)));
        lines.push(format!("    <data key=\"type\">{}</data>", node.kind));
        if let Some(path) = &node.path {
            lines.push(format!("    <data key=\"path\">{}</data>", xml_escape(path)));
        }
        lines.push("  </node>".to_string());
    }

    let mut edge_id = 0usize;
    for node in graph.nodes() {
        for dep in graph.dependencies(&node.id) {
            if graph.contains(dep) {
                lines.push(format!(
                    "  <edge id=\"e{}\" source=\"{}\" target=\"{}\"/>",
                    edge_id,
                    xml_escape(&node.id),
                    xml_escape(dep)
                ));
                edge_id += 1;
            }
        }
    }

    lines.push("</graph>".to_string());
    lines.push("</graphml>".to_string());
    lines.join("\n")
}

fn dot_escape(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
