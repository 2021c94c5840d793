// src/graph/parser.rs

//! Task-graph text -> [`TaskGraph`].
//!
//! The document is a TOML mapping of step name to step table:
//!
//! ```toml
//! [step1]
//! task = "plugin1.task1"
//! args = { a = "$global1" }
//!
//! [step2]
//! swap = "step2_choice"
//!
//! [step2.alternatives.fast]
//! task = "plugin9.task2"
//! args = { x = "$step1", y = "$step1.output" }
//! ```
//!
//! Argument strings are classified once here:
//! - `$$text` is the literal `$text`,
//! - `$name` is a step-output reference when `name` is a step of this graph,
//!   otherwise a global parameter reference,
//! - `$step.output` is always a step-output reference,
//! - anything else is a literal.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::graph::model::{
    ArgValue, Invocation, OutputRef, Step, StepName, SwapStep, TaskGraph, TaskRef, location,
};
use crate::validate::ValidationIssue;

static IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"));

static TASK_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z_][A-Za-z0-9_]*)\.)?([A-Za-z_][A-Za-z0-9_]*)$")
        .expect("static pattern")
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)(?:\.([A-Za-z_][A-Za-z0-9_]*))?$")
        .expect("static pattern")
});

/// Raw document as deserialized by `toml`, before any semantic conversion.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct RawTaskGraph {
    pub steps: BTreeMap<String, RawStep>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStep {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub args: Option<BTreeMap<String, toml::Value>>,
    /// Choice key for swap steps.
    #[serde(default)]
    pub swap: Option<String>,
    #[serde(default)]
    pub alternatives: Option<BTreeMap<String, RawInvocation>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawInvocation {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub args: BTreeMap<String, toml::Value>,
}

/// Parse task-graph source text.
///
/// Every failure is a single `Syntactic`/`Error` issue.
pub fn parse(text: &str) -> Result<TaskGraph, ValidationIssue> {
    let raw: RawTaskGraph = toml::from_str(text)
        .map_err(|err| ValidationIssue::syntax_error(describe_toml_error(text, &err)))?;
    let graph = TaskGraph::try_from(raw)?;

    debug!(
        steps = graph.len(),
        swaps = graph.swap_steps().count(),
        "parsed task graph"
    );
    Ok(graph)
}

impl TryFrom<RawTaskGraph> for TaskGraph {
    type Error = ValidationIssue;

    fn try_from(raw: RawTaskGraph) -> Result<Self, Self::Error> {
        let step_names: BTreeSet<StepName> = raw.steps.keys().cloned().collect();
        for name in &step_names {
            ensure_ident(name, "step name")?;
        }

        // choice key -> step that declared it
        let mut choice_keys: BTreeMap<String, StepName> = BTreeMap::new();
        let mut steps = BTreeMap::new();

        for (name, raw_step) in raw.steps {
            let step = convert_step(&name, raw_step, &step_names)?;
            if let Step::Swap(swap) = &step {
                if let Some(other) = choice_keys.insert(swap.choice_key.clone(), name.clone()) {
                    return Err(ValidationIssue::syntax_error(format!(
                        "duplicate swap choice key \"{}\" in steps \"{other}\" and \"{name}\"",
                        swap.choice_key
                    )));
                }
            }
            steps.insert(name, step);
        }

        Ok(TaskGraph::new_unchecked(steps))
    }
}

fn convert_step(
    name: &str,
    raw: RawStep,
    step_names: &BTreeSet<StepName>,
) -> Result<Step, ValidationIssue> {
    let here = location(name, None);

    match (raw.task, raw.swap) {
        (Some(_), Some(_)) => Err(ValidationIssue::syntax_error(format!(
            "{here}: a step cannot have both `task` and `swap`"
        ))),
        (None, None) => Err(ValidationIssue::syntax_error(format!(
            "{here}: step has no task reference"
        ))),
        (Some(task), None) => {
            if raw.alternatives.is_some() {
                return Err(ValidationIssue::syntax_error(format!(
                    "{here}: `alternatives` is only allowed on swap steps"
                )));
            }
            let invocation =
                convert_invocation(&here, &task, raw.args.unwrap_or_default(), step_names)?;
            Ok(Step::Plain(invocation))
        }
        (None, Some(choice_key)) => {
            if raw.args.is_some() {
                return Err(ValidationIssue::syntax_error(format!(
                    "{here}: swap steps take `args` per alternative, not on the step"
                )));
            }
            ensure_ident(&choice_key, "swap choice key")?;

            let raw_alternatives = raw.alternatives.unwrap_or_default();
            if raw_alternatives.is_empty() {
                return Err(ValidationIssue::syntax_error(format!(
                    "{here}: swap step has no alternatives"
                )));
            }

            let mut alternatives = BTreeMap::new();
            for (label, alternative) in raw_alternatives {
                ensure_ident(&label, "swap alternative label")?;
                let there = location(name, Some(&label));
                let task = alternative.task.ok_or_else(|| {
                    ValidationIssue::syntax_error(format!(
                        "{there}: alternative has no task reference"
                    ))
                })?;
                let invocation = convert_invocation(&there, &task, alternative.args, step_names)?;
                alternatives.insert(label, invocation);
            }

            Ok(Step::Swap(SwapStep {
                choice_key,
                alternatives,
            }))
        }
    }
}

fn convert_invocation(
    here: &str,
    task: &str,
    args: BTreeMap<String, toml::Value>,
    step_names: &BTreeSet<StepName>,
) -> Result<Invocation, ValidationIssue> {
    let task = parse_task_ref(here, task)?;

    let mut parsed = BTreeMap::new();
    for (arg, value) in args {
        parsed.insert(arg, parse_value(here, value, step_names)?);
    }

    Ok(Invocation { task, args: parsed })
}

fn parse_task_ref(here: &str, raw: &str) -> Result<TaskRef, ValidationIssue> {
    let caps = TASK_REF.captures(raw.trim()).ok_or_else(|| {
        ValidationIssue::syntax_error(format!("{here}: invalid task reference: {raw:?}"))
    })?;

    Ok(TaskRef {
        plugin: caps.get(1).map(|m| m.as_str().to_string()),
        task: caps[2].to_string(),
    })
}

fn parse_value(
    here: &str,
    value: toml::Value,
    step_names: &BTreeSet<StepName>,
) -> Result<ArgValue, ValidationIssue> {
    match value {
        toml::Value::String(s) => parse_string(here, s, step_names),
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| parse_value(here, item, step_names))
            .collect::<Result<Vec<_>, _>>()
            .map(ArgValue::List),
        toml::Value::Table(entries) => entries
            .into_iter()
            .map(|(key, item)| Ok((key, parse_value(here, item, step_names)?)))
            .collect::<Result<BTreeMap<_, _>, ValidationIssue>>()
            .map(ArgValue::Table),
        scalar => Ok(ArgValue::Literal(scalar)),
    }
}

fn parse_string(
    here: &str,
    s: String,
    step_names: &BTreeSet<StepName>,
) -> Result<ArgValue, ValidationIssue> {
    if let Some(rest) = s.strip_prefix("$$") {
        return Ok(ArgValue::Literal(toml::Value::String(format!("${rest}"))));
    }
    if !s.starts_with('$') {
        return Ok(ArgValue::Literal(toml::Value::String(s)));
    }

    let caps = REFERENCE.captures(&s).ok_or_else(|| {
        ValidationIssue::syntax_error(format!("{here}: malformed reference: {s:?}"))
    })?;
    let name = caps[1].to_string();

    let value = match caps.get(2) {
        Some(output) => ArgValue::StepOutputRef(OutputRef {
            step: name,
            output: Some(output.as_str().to_string()),
        }),
        None if step_names.contains(&name) => ArgValue::StepOutputRef(OutputRef {
            step: name,
            output: None,
        }),
        None => ArgValue::GlobalParamRef(name),
    };
    Ok(value)
}

/// Check that `value` is a plain identifier, usable in `$name` references.
pub(crate) fn ensure_ident(value: &str, what: &str) -> Result<(), ValidationIssue> {
    if IDENT.is_match(value) {
        Ok(())
    } else {
        Err(ValidationIssue::syntax_error(format!(
            "invalid {what}: {value:?} (expected letters, digits and underscores)"
        )))
    }
}

pub(crate) fn is_ident(value: &str) -> bool {
    IDENT.is_match(value)
}

fn describe_toml_error(text: &str, err: &toml::de::Error) -> String {
    let line = err
        .span()
        .and_then(|span| text.get(..span.start))
        .map(|before| before.matches('\n').count() + 1);

    match line {
        Some(line) => format!("invalid task graph document (line {line}): {}", err.message()),
        None => format!("invalid task graph document: {}", err.message()),
    }
}
