//! Summary report over a completed dependency graph

use crate::cycles::find_cycles;
use crate::error::{KiteError, Result};
use crate::graph::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds above which an internal module is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportThresholds {
    pub max_dependents: usize,
    pub max_dependencies: usize,
}

impl Default for ReportThresholds {
    fn default() -> Self {
        ReportThresholds {
            max_dependents: 5,
            max_dependencies: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_modules: usize,
    pub internal_modules: usize,
    pub external_modules: usize,
    pub dependency_cycles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighDependencyModule {
    pub module: String,
    pub path: Option<String>,
    pub dependent_count: usize,
    pub dependency_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub summary: ReportSummary,
    pub cycles: Vec<Vec<String>>,
    /// Most connected first.
    pub high_dependency_modules: Vec<HighDependencyModule>,
    /// Sorted.
    pub external_dependencies: Vec<String>,
}

impl DependencyReport {
    pub fn build(graph: &DependencyGraph, thresholds: ReportThresholds) -> Self {
        let cycles = find_cycles(graph);

        let mut high_dependency_modules: Vec<HighDependencyModule> = graph
            .internal_modules()
            .filter_map(|node| {
                let dependent_count = graph.dependents(&node.id).len();
                let dependency_count = graph.dependencies(&node.id).len();
                (dependent_count > thresholds.max_dependents
                    || dependency_count > thresholds.max_dependencies)
                    .then(|| HighDependencyModule {
                        module: node.id.clone(),
                        path: node.path.clone(),
                        dependent_count,
                        dependency_count,
                    })
            })
            .collect();
        high_dependency_modules.sort_by(|a, b| {
            (b.dependent_count + b.dependency_count)
                .cmp(&(a.dependent_count + a.dependency_count))
                .then_with(|| a.module.cmp(&b.module))
        });

        let mut external_dependencies: Vec<String> =
            graph.external_modules().map(|n| n.id.clone()).collect();
        external_dependencies.sort();

        DependencyReport {
            summary: ReportSummary {
                total_modules: graph.node_count(),
                internal_modules: graph.internal_modules().count(),
                external_modules: external_dependencies.len(),
                dependency_cycles: cycles.len(),
            },
            cycles,
            high_dependency_modules,
            external_dependencies,
        }
    }

    /// Write the report as pretty JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| KiteError::io(path, e))?;
        tracing::info!("Dependency report saved: {}", path.display());
        Ok(())
    }
}
