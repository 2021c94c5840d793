// src/validate/semantic.rs

//! Checks every binding against the plugin registry.
//!
//! The checks are exhaustive: every problem found is reported, and the
//! caller decides what an `Error` means for it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::engine::swap::ActiveSteps;
use crate::graph::{ArgValue, Binding, Invocation, OutputRef, TaskGraph};
use crate::registry::{PluginTask, TaskLookup, TaskRegistry, lookup};
use crate::types::{ParamType, literal_type_name};
use crate::validate::issue::ValidationIssue;

/// Which invocations a step-output reference may end up reading from.
///
/// When validating a whole graph every alternative of a swap step is a
/// candidate; when resolving, only the selected one.
#[derive(Debug, Clone, Default)]
pub struct Targets<'g> {
    steps: BTreeMap<&'g str, Vec<&'g Invocation>>,
}

impl<'g> Targets<'g> {
    /// Every binding of the graph.
    pub fn all(graph: &'g TaskGraph) -> Self {
        let mut steps: BTreeMap<&'g str, Vec<&'g Invocation>> = BTreeMap::new();
        for binding in graph.bindings() {
            steps.entry(binding.step).or_default().push(binding.invocation);
        }
        Self { steps }
    }

    /// The active bindings only.
    pub fn active(active: &ActiveSteps<'g>) -> Self {
        let steps = active
            .iter()
            .map(|binding| (binding.step, vec![binding.invocation]))
            .collect();
        Self { steps }
    }

    fn get(&self, step: &str) -> Option<&[&'g Invocation]> {
        self.steps.get(step).map(Vec::as_slice)
    }
}

/// Validate the given bindings. Returns every issue found, in binding order.
pub fn validate_bindings<'g, R>(
    bindings: impl IntoIterator<Item = Binding<'g>>,
    targets: &Targets<'g>,
    registry: &R,
) -> Vec<ValidationIssue>
where
    R: TaskRegistry + ?Sized,
{
    let mut issues = Vec::new();
    let mut checked = 0usize;

    for binding in bindings {
        checked += 1;
        let here = binding.to_string();
        let task_ref = &binding.invocation.task;

        match lookup(registry, task_ref) {
            TaskLookup::Found(task) => check_arguments(&here, binding.invocation, task, &mut issues),
            TaskLookup::Missing => issues.push(ValidationIssue::semantic_error(format!(
                "{here}: unrecognized task plugin: {task_ref}"
            ))),
            TaskLookup::Ambiguous(plugins) => {
                issues.push(ValidationIssue::semantic_error(format!(
                    "{here}: ambiguous task plugin: {task_ref} (provided by {})",
                    plugins.join(", ")
                )))
            }
        }

        check_output_refs(&here, binding, targets, registry, &mut issues);
    }

    debug!(bindings = checked, issues = issues.len(), "semantic validation finished");
    issues
}

fn check_arguments(
    here: &str,
    invocation: &Invocation,
    task: &PluginTask,
    issues: &mut Vec<ValidationIssue>,
) {
    for (name, value) in &invocation.args {
        match task.input(name) {
            None => issues.push(ValidationIssue::semantic_error(format!(
                "{here}: unrecognized argument: {name}"
            ))),
            Some(spec) => {
                if let Some(actual) = literal_mismatch(&spec.param_type, value) {
                    issues.push(ValidationIssue::semantic_warning(format!(
                        "{here}: argument \"{name}\" expects {}, got {actual}",
                        spec.param_type
                    )));
                }
            }
        }
    }

    for input in task.inputs.iter().filter(|input| input.required) {
        if !invocation.args.contains_key(&input.name) {
            issues.push(ValidationIssue::semantic_error(format!(
                "{here}: missing required argument: {}",
                input.name
            )));
        }
    }
}

/// Literal type name when a literal value cannot satisfy `expected`.
/// References are never checked here.
fn literal_mismatch(expected: &ParamType, value: &ArgValue) -> Option<&'static str> {
    if expected.is_opaque() {
        return None;
    }
    match value {
        ArgValue::Literal(literal) => {
            (!expected.accepts_literal(literal)).then(|| literal_type_name(literal))
        }
        ArgValue::List(_) => (*expected != ParamType::List).then_some("list"),
        ArgValue::Table(_) => (*expected != ParamType::Mapping).then_some("mapping"),
        ArgValue::GlobalParamRef(_) | ArgValue::StepOutputRef(_) => None,
    }
}

fn check_output_refs<R>(
    here: &str,
    binding: Binding<'_>,
    targets: &Targets<'_>,
    registry: &R,
    issues: &mut Vec<ValidationIssue>,
) where
    R: TaskRegistry + ?Sized,
{
    let mut seen: BTreeSet<&OutputRef> = BTreeSet::new();

    for output_ref in binding.invocation.output_refs() {
        if !seen.insert(output_ref) {
            continue;
        }
        let target = output_ref.step.as_str();

        if target == binding.step {
            issues.push(ValidationIssue::semantic_error(format!(
                "{here}: step references its own output"
            )));
            continue;
        }

        let Some(candidates) = targets.get(target) else {
            issues.push(ValidationIssue::semantic_error(format!(
                "{here}: reference to unknown step: {target}"
            )));
            continue;
        };

        let resolved: Vec<&PluginTask> = candidates
            .iter()
            .filter_map(|invocation| match lookup(registry, &invocation.task) {
                TaskLookup::Found(task) => Some(task),
                TaskLookup::Missing | TaskLookup::Ambiguous(_) => None,
            })
            .collect();

        let providing = resolved
            .iter()
            .filter(|task| match &output_ref.output {
                Some(output) => task.output(output).is_some(),
                None => !task.outputs.is_empty(),
            })
            .count();

        if providing == resolved.len() {
            continue;
        }

        let issue = match (&output_ref.output, providing == 0) {
            (Some(output), true) => ValidationIssue::semantic_error(format!(
                "{here}: step \"{target}\" has no output named \"{output}\""
            )),
            (Some(output), false) => ValidationIssue::semantic_warning(format!(
                "{here}: step \"{target}\" has output \"{output}\" only in some alternatives"
            )),
            (None, true) => ValidationIssue::semantic_error(format!(
                "{here}: step \"{target}\" produces no output"
            )),
            (None, false) => ValidationIssue::semantic_warning(format!(
                "{here}: step \"{target}\" produces no output in some alternatives"
            )),
        };
        issues.push(issue);
    }
}
