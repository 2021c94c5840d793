// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::graph::{StepName, TaskGraph};

/// Identifies one binding: a plain step (`choice == None`) or one
/// alternative of a swap step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    pub step: StepName,
    pub choice: Option<String>,
}

impl BindingKey {
    fn new(step: &str, choice: Option<&str>) -> Self {
        Self {
            step: step.to_string(),
            choice: choice.map(str::to_string),
        }
    }
}

/// What one binding references.
#[derive(Debug, Clone, Default)]
struct BindingRefs {
    /// Steps whose output this binding consumes.
    deps: BTreeSet<StepName>,
    /// Referenced names that are not steps of the graph.
    dangling: BTreeSet<StepName>,
    /// Global parameters named in the arguments.
    params: BTreeSet<String>,
}

/// Dependency information for every binding of a task graph.
///
/// Edge direction is `dependency -> dependent`. Edges of every swap
/// alternative are recorded here; callers pick the active ones with
/// [`DependencyGraph::edges_for`]. References to unknown steps never become
/// edges (the validator reports them), and cycles are not detected here.
///
/// A self reference (`$s` inside step `s`) is not an edge either. It is
/// reported as a semantic error on the binding, so resolving such a graph
/// fails with [`EngineError::Invalid`](crate::engine::EngineError::Invalid)
/// rather than with a one-step cycle.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    steps: BTreeSet<StepName>,
    bindings: BTreeMap<BindingKey, BindingRefs>,
}

impl DependencyGraph {
    pub fn build(graph: &TaskGraph) -> Self {
        let steps: BTreeSet<StepName> = graph.step_names().map(str::to_string).collect();
        let mut bindings = BTreeMap::new();

        for binding in graph.bindings() {
            let mut refs = BindingRefs::default();

            for output_ref in binding.invocation.output_refs() {
                if output_ref.step == binding.step {
                    continue;
                }
                if steps.contains(&output_ref.step) {
                    refs.deps.insert(output_ref.step.clone());
                } else {
                    refs.dangling.insert(output_ref.step.clone());
                }
            }

            refs.params.extend(
                binding
                    .invocation
                    .global_params()
                    .into_iter()
                    .map(str::to_string),
            );

            bindings.insert(BindingKey::new(binding.step, binding.choice), refs);
        }

        let built = Self { steps, bindings };
        debug!(
            steps = built.steps.len(),
            bindings = built.bindings.len(),
            edges = built.all_edges().len(),
            "built dependency graph"
        );
        built
    }

    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(String::as_str)
    }

    /// Steps a binding depends on directly.
    pub fn dependencies_of(&self, step: &str, choice: Option<&str>) -> Vec<&str> {
        self.refs_of(step, choice)
            .map(|refs| refs.deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Global parameters a binding references.
    pub fn params_of(&self, step: &str, choice: Option<&str>) -> Vec<&str> {
        self.refs_of(step, choice)
            .map(|refs| refs.params.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Union of global parameters over every binding.
    pub fn all_params(&self) -> BTreeSet<&str> {
        self.bindings
            .values()
            .flat_map(|refs| refs.params.iter().map(String::as_str))
            .collect()
    }

    /// Whether any binding references a name that is not a step.
    pub fn has_dangling_refs(&self) -> bool {
        self.bindings.values().any(|refs| !refs.dangling.is_empty())
    }

    /// Edges contributed by the selected bindings, deduplicated.
    pub fn edges_for<'s>(
        &self,
        selection: impl IntoIterator<Item = (&'s str, Option<&'s str>)>,
    ) -> Vec<(&str, &str)> {
        let mut edges = BTreeSet::new();
        for (step, choice) in selection {
            if let Some((key, refs)) = self.bindings.get_key_value(&BindingKey::new(step, choice)) {
                for dep in &refs.deps {
                    edges.insert((dep.as_str(), key.step.as_str()));
                }
            }
        }
        edges.into_iter().collect()
    }

    /// Edges present under every swap choice: those of plain steps plus,
    /// for each swap step, the dependencies shared by all its alternatives.
    pub fn unconditional_edges(&self) -> Vec<(&str, &str)> {
        let mut shared: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (key, refs) in &self.bindings {
            let deps: BTreeSet<&str> = refs.deps.iter().map(String::as_str).collect();
            match shared.get_mut(key.step.as_str()) {
                Some(common) => common.retain(|dep| deps.contains(dep)),
                None => {
                    shared.insert(key.step.as_str(), deps);
                }
            }
        }

        let mut edges: Vec<(&str, &str)> = shared
            .into_iter()
            .flat_map(|(step, deps)| deps.into_iter().map(move |dep| (dep, step)))
            .collect();
        edges.sort();
        edges
    }

    /// Edges of every binding, including every swap alternative.
    pub fn all_edges(&self) -> Vec<(&str, &str)> {
        let mut edges = BTreeSet::new();
        for (key, refs) in &self.bindings {
            for dep in &refs.deps {
                edges.insert((dep.as_str(), key.step.as_str()));
            }
        }
        edges.into_iter().collect()
    }

    fn refs_of(&self, step: &str, choice: Option<&str>) -> Option<&BindingRefs> {
        self.bindings.get(&BindingKey::new(step, choice))
    }
}
