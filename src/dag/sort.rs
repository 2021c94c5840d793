// src/dag/sort.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::graph::StepName;

/// The active steps cannot be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle between steps: {}", .steps.join(", "))]
pub struct CycleError {
    /// Steps on the cycle, sorted.
    pub steps: Vec<StepName>,
}

/// Order `steps` so that every edge `(from, to)` has `from` first.
///
/// Kahn's algorithm. When several steps are ready at once the smallest name
/// goes first, but callers may only rely on the partial order: any linear
/// extension of the edges is a correct answer. Edges mentioning a step that
/// is not in `steps` are ignored.
pub fn topological_sort<'a>(
    steps: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Vec<StepName>, CycleError> {
    let graph = build_graph(steps, edges);

    let mut in_degree: BTreeMap<&str, usize> = graph
        .nodes()
        .map(|node| {
            (
                node,
                graph.neighbors_directed(node, Direction::Incoming).count(),
            )
        })
        .collect();

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| *node)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());

        for next in graph.neighbors_directed(node, Direction::Outgoing) {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(next);
                }
            }
        }
    }

    if order.len() < graph.node_count() {
        let cycle = find_cycles(&graph).into_iter().next().unwrap_or_else(|| {
            in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(node, _)| node.to_string())
                .collect()
        });
        warn!(steps = ?cycle, "dependency cycle among active steps");
        return Err(CycleError { steps: cycle });
    }

    debug!(order = ?order, "topological order");
    Ok(order)
}

/// First dependency cycle found among the given edges, if any.
pub fn detect_cycle<'a>(
    steps: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Option<CycleError> {
    detect_cycles(steps, edges).into_iter().next()
}

/// Every strongly connected component that forms a cycle, sorted by the
/// names on it.
pub fn detect_cycles<'a>(
    steps: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<CycleError> {
    let graph = build_graph(steps, edges);
    find_cycles(&graph)
        .into_iter()
        .map(|steps| CycleError { steps })
        .collect()
}

fn build_graph<'a>(
    steps: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> DiGraphMap<&'a str, ()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for step in steps {
        graph.add_node(step);
    }
    for (from, to) in edges {
        if graph.contains_node(from) && graph.contains_node(to) {
            graph.add_edge(from, to, ());
        }
    }
    graph
}

fn find_cycles(graph: &DiGraphMap<&str, ()>) -> Vec<Vec<StepName>> {
    let mut cycles: Vec<Vec<StepName>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        })
        .map(|component| {
            let mut names: Vec<StepName> = component.into_iter().map(str::to_string).collect();
            names.sort();
            names
        })
        .collect();

    cycles.sort();
    cycles
}
