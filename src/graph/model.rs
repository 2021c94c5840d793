// src/graph/model.rs

use std::collections::BTreeMap;
use std::fmt;

/// Name of a step within a task graph.
pub type StepName = String;

/// A parsed task graph: step name -> step, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGraph {
    steps: BTreeMap<StepName, Step>,
}

/// One node of the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A fixed task invocation.
    Plain(Invocation),
    /// A choice between several invocations, selected by `choice_key`.
    Swap(SwapStep),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapStep {
    pub choice_key: String,
    /// Alternative label -> invocation. Never empty.
    pub alternatives: BTreeMap<String, Invocation>,
}

/// A task reference plus its argument bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub task: TaskRef,
    pub args: BTreeMap<String, ArgValue>,
}

/// `plugin.task`, or a bare `task` resolved by name across the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskRef {
    pub plugin: Option<String>,
    pub task: String,
}

/// Reference to the output of another step: `$step` or `$step.output`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputRef {
    pub step: StepName,
    pub output: Option<String>,
}

/// An argument value after reference parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Scalar TOML literal (never an array or table).
    Literal(toml::Value),
    GlobalParamRef(String),
    StepOutputRef(OutputRef),
    List(Vec<ArgValue>),
    Table(BTreeMap<String, ArgValue>),
}

/// A single place where an invocation lives in the graph: a plain step, or
/// one alternative of a swap step.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'g> {
    pub step: &'g str,
    /// Alternative label for swap steps.
    pub choice: Option<&'g str>,
    pub invocation: &'g Invocation,
}

impl TaskGraph {
    pub(crate) fn new_unchecked(steps: BTreeMap<StepName, Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &BTreeMap<StepName, Step> {
        &self.steps
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Swap steps with their names.
    pub fn swap_steps(&self) -> impl Iterator<Item = (&str, &SwapStep)> {
        self.steps.iter().filter_map(|(name, step)| match step {
            Step::Swap(swap) => Some((name.as_str(), swap)),
            Step::Plain(_) => None,
        })
    }

    /// Every invocation in the graph, including every swap alternative.
    pub fn bindings(&self) -> impl Iterator<Item = Binding<'_>> {
        self.steps.iter().flat_map(|(name, step)| step.bindings(name))
    }
}

impl Step {
    pub fn is_swap(&self) -> bool {
        matches!(self, Step::Swap(_))
    }

    /// All bindings of this step (one for plain, one per alternative for swap).
    pub fn bindings<'g>(&'g self, name: &'g str) -> Vec<Binding<'g>> {
        match self {
            Step::Plain(invocation) => vec![Binding {
                step: name,
                choice: None,
                invocation,
            }],
            Step::Swap(swap) => swap
                .alternatives
                .iter()
                .map(|(label, invocation)| Binding {
                    step: name,
                    choice: Some(label.as_str()),
                    invocation,
                })
                .collect(),
        }
    }
}

impl Invocation {
    /// Every step-output reference in the arguments, in argument order.
    pub fn output_refs(&self) -> Vec<&OutputRef> {
        let mut refs = Vec::new();
        for value in self.args.values() {
            value.visit(&mut |v| {
                if let ArgValue::StepOutputRef(r) = v {
                    refs.push(r);
                }
            });
        }
        refs
    }

    /// Every global parameter named in the arguments.
    pub fn global_params(&self) -> Vec<&str> {
        let mut params = Vec::new();
        for value in self.args.values() {
            value.visit(&mut |v| {
                if let ArgValue::GlobalParamRef(name) = v {
                    params.push(name.as_str());
                }
            });
        }
        params
    }
}

impl ArgValue {
    /// Depth-first walk over this value and every nested value.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a ArgValue)) {
        f(self);
        match self {
            ArgValue::List(items) => {
                for item in items {
                    item.visit(f);
                }
            }
            ArgValue::Table(entries) => {
                for item in entries.values() {
                    item.visit(f);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => write!(f, "{plugin}.{}", self.task),
            None => f.write_str(&self.task),
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.output {
            Some(output) => write!(f, "${}.{output}", self.step),
            None => write!(f, "${}", self.step),
        }
    }
}

impl fmt::Display for Binding<'_> {
    /// Diagnostic prefix: `In step "<name>"` or `In step "<name>", alternative "<label>"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&location(self.step, self.choice))
    }
}

pub(crate) fn location(step: &str, choice: Option<&str>) -> String {
    match choice {
        Some(label) => format!("In step \"{step}\", alternative \"{label}\""),
        None => format!("In step \"{step}\""),
    }
}
