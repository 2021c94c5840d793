// src/engine/resolve.rs

//! The two public operations of the engine.

use tracing::{debug, info, warn};

use crate::dag::{DependencyGraph, detect_cycles, topological_sort};
use crate::engine::params::{collect_params, collect_plugins};
use crate::engine::swap::{SwapChoices, resolve_swaps};
use crate::engine::{EngineError, ResolvedWorkflow};
use crate::graph::parse;
use crate::registry::TaskRegistry;
use crate::validate::{
    EntrypointParameter, Targets, ValidationIssue, check_parameters, is_valid, validate_bindings,
};

/// Resolve a task graph for one set of swap choices.
///
/// Stages run in order and the first failing one decides the error: parse,
/// swap selection, validation of the active steps, ordering. Warnings from
/// validation are logged and otherwise ignored.
pub fn resolve_dynamic_params<R>(
    graph_text: &str,
    registry: &R,
    choices: &SwapChoices,
) -> Result<ResolvedWorkflow, EngineError>
where
    R: TaskRegistry + ?Sized,
{
    let graph = parse(graph_text).map_err(EngineError::Syntax)?;
    let deps = DependencyGraph::build(&graph);
    let active = resolve_swaps(&graph, choices)?;

    let issues = validate_bindings(active.iter(), &Targets::active(&active), registry);
    if !is_valid(&issues) {
        warn!(issues = issues.len(), "active steps failed validation");
        return Err(EngineError::Invalid(issues));
    }
    for issue in &issues {
        warn!(message = %issue.message(), "validation warning");
    }

    let order = topological_sort(active.names(), deps.edges_for(active.selection()))?;
    let entrypoint_params = collect_params(&deps, &active);
    let active_plugins = collect_plugins(&active, registry);

    info!(
        steps = order.len(),
        params = entrypoint_params.len(),
        plugins = active_plugins.len(),
        "resolved task graph"
    );

    Ok(ResolvedWorkflow {
        entrypoint_params,
        topological_sort: order,
        active_plugins,
    })
}

/// Validate a task graph over every possible swap choice.
///
/// Returns every issue found; an empty list means the graph is fully valid.
/// A syntax error is returned alone, since nothing else can be checked.
pub fn validate_entrypoint<R>(
    graph_text: &str,
    registry: &R,
    declared_parameters: &[EntrypointParameter],
) -> Vec<ValidationIssue>
where
    R: TaskRegistry + ?Sized,
{
    let graph = match parse(graph_text) {
        Ok(graph) => graph,
        Err(issue) => {
            debug!(message = %issue.message(), "task graph failed to parse");
            return vec![issue];
        }
    };
    let deps = DependencyGraph::build(&graph);

    let mut issues = validate_bindings(graph.bindings(), &Targets::all(&graph), registry);
    issues.extend(check_parameters(&graph, &deps, declared_parameters, registry));
    issues.extend(check_cycles(&deps));

    info!(
        steps = graph.len(),
        issues = issues.len(),
        valid = is_valid(&issues),
        "validated task graph"
    );
    issues
}

/// One issue per cyclic component. A cycle over edges present under every
/// choice is an error; a component that only closes through some swap
/// alternatives is a warning.
fn check_cycles(deps: &DependencyGraph) -> Vec<ValidationIssue> {
    let certain = detect_cycles(deps.steps(), deps.unconditional_edges());
    let possible = detect_cycles(deps.steps(), deps.all_edges());

    let warnings = possible
        .into_iter()
        .filter(|cycle| {
            !certain
                .iter()
                .any(|known| known.steps.iter().all(|step| cycle.steps.contains(step)))
        })
        .map(|cycle| {
            ValidationIssue::semantic_warning(format!("some swap choices produce a {cycle}"))
        });

    certain
        .iter()
        .map(|cycle| ValidationIssue::semantic_error(cycle.to_string()))
        .chain(warnings)
        .collect()
}
