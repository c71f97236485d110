//! Cycle detection over internal-to-internal dependency edges

use crate::graph::DependencyGraph;
use std::collections::{HashMap, HashSet};

/// Enumerate simple cycles between internal modules.
///
/// Each cycle starts with its smallest module id and repeats it at the end,
/// so `a -> b -> c -> a` is reported once as `[a, b, c, a]` regardless of
/// which module the walk entered from.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = Vec::new();
    let mut recorded: HashSet<Vec<String>> = HashSet::new();

    for start in graph.internal_modules() {
        let start = start.id.as_str();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = vec![start];
        let mut on_path: HashMap<&str, usize> = HashMap::from([(start, 0)]);
        let mut frames = vec![internal_dependencies(graph, start).into_iter()];
        visited.insert(start);

        loop {
            let Some(frame) = frames.last_mut() else {
                break;
            };
            match frame.next() {
                Some(next) => {
                    if let Some(&pos) = on_path.get(next) {
                        let cycle = canonicalize(&path[pos..]);
                        if recorded.insert(cycle.clone()) {
                            cycles.push(cycle);
                        }
                    } else if visited.insert(next) {
                        on_path.insert(next, path.len());
                        path.push(next);
                        frames.push(internal_dependencies(graph, next).into_iter());
                    }
                }
                None => {
                    frames.pop();
                    if let Some(done) = path.pop() {
                        on_path.remove(done);
                    }
                }
            }
        }
    }

    tracing::debug!("Found {} dependency cycles", cycles.len());
    cycles
}

fn internal_dependencies<'g>(graph: &'g DependencyGraph, id: &str) -> Vec<&'g str> {
    graph
        .dependencies(id)
        .into_iter()
        .filter(|dep| graph.node(dep).is_some_and(|n| n.is_internal()))
        .collect()
}

/// Rotate the open cycle so the smallest id leads, then close it.
fn canonicalize(open: &[&str]) -> Vec<String> {
    let lead = open
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map(|(pos, _)| pos)
        .unwrap_or(0);

    let mut cycle: Vec<String> = open[lead..]
        .iter()
        .chain(open[..lead].iter())
        .map(|id| id.to_string())
        .collect();
    if let Some(first) = cycle.first().cloned() {
        cycle.push(first);
    }
    cycle
}
