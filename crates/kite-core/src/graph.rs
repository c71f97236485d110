//! Module dependency graph using petgraph::StableDiGraph keyed by module id

use crate::model::*;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Directed graph of modules. Every edge target is a node of the graph.
#[derive(Clone)]
pub struct DependencyGraph {
    inner: StableDiGraph<ModuleNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a node unless one with the same id exists. Returns true if inserted.
    pub fn insert(&mut self, node: ModuleNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        let id = node.id.clone();
        let idx = self.inner.add_node(node);
        self.index.insert(id, idx);
        true
    }

    /// Make `id` an internal module owned by `path`.
    ///
    /// A placeholder created by an earlier import keeps its identity and edges.
    pub fn upsert_internal(&mut self, id: &str, path: &str) {
        match self.node_mut(id) {
            Some(node) => {
                node.kind = ModuleKind::Internal;
                node.path = Some(path.to_string());
            }
            None => {
                self.insert(ModuleNode::internal(id, path));
            }
        }
    }

    /// Add the edge `source -> target`. Both nodes must already exist.
    /// Returns false when either endpoint is unknown.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        let (Some(&s), Some(&t)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        self.inner.update_edge(s, t, ());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&ModuleNode> {
        self.index.get(id).and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut ModuleNode> {
        let idx = *self.index.get(id)?;
        self.inner.node_weight_mut(idx)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ModuleNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Direct dependencies of `id`, sorted.
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Modules that directly depend on `id`, sorted.
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let set: BTreeSet<&str> = self
            .inner
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.inner.node_weight(n))
            .map(|n| n.id.as_str())
            .collect();
        set.into_iter().collect()
    }

    /// Dependencies of `module`. With `include_indirect`, everything reachable from it,
    /// including `module` itself when it sits on a cycle.
    pub fn module_dependencies(&self, module: &str, include_indirect: bool) -> Vec<String> {
        self.walk(module, include_indirect, Direction::Outgoing)
    }

    /// Dependents of `module`. With `include_indirect`, everything that reaches it.
    pub fn module_dependents(&self, module: &str, include_indirect: bool) -> Vec<String> {
        self.walk(module, include_indirect, Direction::Incoming)
    }

    fn walk(&self, start: &str, transitive: bool, direction: Direction) -> Vec<String> {
        if !self.contains(start) {
            return Vec::new();
        }
        if !transitive {
            return self
                .neighbors(start, direction)
                .into_iter()
                .map(str::to_string)
                .collect();
        }

        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current, direction) {
                if seen.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Module id -> `{type, path, dependencies}`, sorted by id.
    pub fn to_entries(&self) -> BTreeMap<String, ModuleEntry> {
        self.nodes()
            .map(|node| {
                let entry = ModuleEntry {
                    kind: node.kind,
                    path: node.path.clone(),
                    dependencies: self
                        .dependencies(&node.id)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                };
                (node.id.clone(), entry)
            })
            .collect()
    }

    pub fn internal_modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes().filter(|n| n.is_internal())
    }

    pub fn external_modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes().filter(|n| !n.is_internal())
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DependencyGraph {
    /// Structural equality: same nodes, same edge sets, insertion order ignored.
    fn eq(&self, other: &Self) -> bool {
        self.to_entries() == other.to_entries()
    }
}
