// src/engine/swap.rs

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use crate::graph::{Binding, Step, TaskGraph};

/// Caller-supplied `choice_key -> alternative label`.
pub type SwapChoices = BTreeMap<String, String>;

/// The supplied choices do not match the graph's swap steps.
///
/// All variants are the same class of failure for callers ("bad request");
/// they only differ in the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    #[error("missing swap choices: {}", join(.0))]
    Missing(BTreeSet<String>),

    #[error("unrecognized swap choices: {}", join(.0))]
    Extra(BTreeSet<String>),

    #[error(
        "invalid choice \"{label}\" for swap \"{choice_key}\" (expected one of: {})",
        .expected.join(", ")
    )]
    InvalidChoice {
        choice_key: String,
        label: String,
        expected: Vec<String>,
    },
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// The steps taking part in one resolution: every plain step plus the
/// selected alternative of every swap step, keyed by step name.
#[derive(Debug, Clone, Default)]
pub struct ActiveSteps<'g> {
    steps: BTreeMap<&'g str, Binding<'g>>,
}

impl<'g> ActiveSteps<'g> {
    pub fn iter(&self) -> impl Iterator<Item = Binding<'g>> + '_ {
        self.steps.values().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'g str> + '_ {
        self.steps.keys().copied()
    }

    /// `(step, alternative)` pairs, for picking dependency edges.
    pub fn selection(&self) -> impl Iterator<Item = (&'g str, Option<&'g str>)> + '_ {
        self.steps.values().map(|b| (b.step, b.choice))
    }

    pub fn get(&self, step: &str) -> Option<Binding<'g>> {
        self.steps.get(step).copied()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Select one alternative per swap step.
///
/// The supplied keys must be exactly the graph's swap choice keys: missing
/// keys are reported first, then unknown ones, then labels naming no
/// alternative.
pub fn resolve_swaps<'g>(
    graph: &'g TaskGraph,
    choices: &SwapChoices,
) -> Result<ActiveSteps<'g>, SwapError> {
    let declared: BTreeSet<&str> = graph
        .swap_steps()
        .map(|(_, swap)| swap.choice_key.as_str())
        .collect();
    let supplied: BTreeSet<&str> = choices.keys().map(String::as_str).collect();

    let missing: BTreeSet<String> = declared
        .difference(&supplied)
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SwapError::Missing(missing));
    }

    let extra: BTreeSet<String> = supplied
        .difference(&declared)
        .map(|k| k.to_string())
        .collect();
    if !extra.is_empty() {
        return Err(SwapError::Extra(extra));
    }

    let mut steps = BTreeMap::new();
    for (name, step) in graph.steps() {
        let binding = match step {
            Step::Plain(invocation) => Binding {
                step: name,
                choice: None,
                invocation,
            },
            Step::Swap(swap) => {
                // Key presence was checked above.
                let label = choices.get(&swap.choice_key).map(String::as_str).unwrap_or_default();
                let (label, invocation) =
                    swap.alternatives.get_key_value(label).ok_or_else(|| {
                        SwapError::InvalidChoice {
                            choice_key: swap.choice_key.clone(),
                            label: label.to_string(),
                            expected: swap.alternatives.keys().cloned().collect(),
                        }
                    })?;
                debug!(step = %name, choice = %label, "selected swap alternative");
                Binding {
                    step: name,
                    choice: Some(label.as_str()),
                    invocation,
                }
            }
        };
        steps.insert(name.as_str(), binding);
    }

    Ok(ActiveSteps { steps })
}
