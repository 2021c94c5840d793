// src/engine/params.rs

use std::collections::BTreeSet;

use crate::dag::DependencyGraph;
use crate::engine::swap::ActiveSteps;
use crate::registry::{TaskLookup, TaskRegistry, lookup};

/// Global parameters referenced by the active steps only.
///
/// A parameter used solely by an unselected swap alternative is not part of
/// the result.
pub fn collect_params(deps: &DependencyGraph, active: &ActiveSteps<'_>) -> BTreeSet<String> {
    active
        .selection()
        .flat_map(|(step, choice)| deps.params_of(step, choice))
        .map(str::to_string)
        .collect()
}

/// Plugins owning the tasks of the active steps. Unresolvable tasks are
/// skipped; the validator reports them.
pub fn collect_plugins<R>(active: &ActiveSteps<'_>, registry: &R) -> BTreeSet<String>
where
    R: TaskRegistry + ?Sized,
{
    active
        .iter()
        .filter_map(|binding| match lookup(registry, &binding.invocation.task) {
            TaskLookup::Found(task) => Some(task.plugin.clone()),
            TaskLookup::Missing | TaskLookup::Ambiguous(_) => None,
        })
        .collect()
}
