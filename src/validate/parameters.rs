// src/validate/parameters.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dag::DependencyGraph;
use crate::graph::{ArgValue, TaskGraph};
use crate::registry::{TaskLookup, TaskRegistry, lookup};
use crate::types::ParamType;
use crate::validate::issue::ValidationIssue;

/// A global parameter declared by an entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntrypointParameter {
    pub name: String,

    #[serde(rename = "default", default)]
    pub default_value: Option<String>,

    #[serde(rename = "type", default)]
    pub parameter_type: ParamType,
}

impl EntrypointParameter {
    pub fn new(name: impl Into<String>, parameter_type: ParamType) -> Self {
        Self {
            name: name.into(),
            default_value: None,
            parameter_type,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Compare declared global parameters with the ones the graph references
/// (over every swap alternative).
pub fn check_parameters<R>(
    graph: &TaskGraph,
    deps: &DependencyGraph,
    declared: &[EntrypointParameter],
    registry: &R,
) -> Vec<ValidationIssue>
where
    R: TaskRegistry + ?Sized,
{
    let mut issues = Vec::new();
    let referenced = deps.all_params();
    let mut declared_types: BTreeMap<&str, &ParamType> = BTreeMap::new();

    for param in declared {
        if declared_types
            .insert(param.name.as_str(), &param.parameter_type)
            .is_some()
        {
            issues.push(ValidationIssue::semantic_error(format!(
                "global parameter \"{}\" is declared more than once",
                param.name
            )));
        }

        if let Some(default) = &param.default_value {
            if !param.parameter_type.parses_default(default) {
                issues.push(ValidationIssue::semantic_error(format!(
                    "global parameter \"{}\" has a default value that is not a valid {}",
                    param.name, param.parameter_type
                )));
            }
        }
    }

    for name in &referenced {
        if !declared_types.contains_key(name) {
            issues.push(ValidationIssue::semantic_error(format!(
                "global parameter \"{name}\" is referenced but not declared"
            )));
        }
    }

    for name in declared_types.keys() {
        if !referenced.contains(name) {
            issues.push(ValidationIssue::semantic_error(format!(
                "global parameter \"{name}\" is declared but never referenced"
            )));
        }
    }

    // Parameters passed straight into a task input.
    for binding in graph.bindings() {
        let TaskLookup::Found(task) = lookup(registry, &binding.invocation.task) else {
            continue;
        };
        for (arg, value) in &binding.invocation.args {
            let ArgValue::GlobalParamRef(param) = value else {
                continue;
            };
            let (Some(declared_type), Some(input)) =
                (declared_types.get(param.as_str()), task.input(arg))
            else {
                continue;
            };
            if !declared_type.feeds(&input.param_type) {
                issues.push(ValidationIssue::semantic_warning(format!(
                    "{binding}: global parameter \"{param}\" of type {declared_type} feeds argument \"{arg}\" of type {}",
                    input.param_type
                )));
            }
        }
    }

    issues
}
