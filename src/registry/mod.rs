// src/registry/mod.rs

//! Read-only lookup over a list of plugin snapshots.
//!
//! The engine only talks to [`TaskRegistry`]; [`PluginRegistry`] is the
//! in-memory implementation built from whatever snapshots the caller hands
//! in for one call.

pub mod model;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::errors::{Result, StepgraphError};
use crate::graph::TaskRef;
use crate::graph::parser::is_ident;

pub use model::{ParamSpec, PluginSnapshot, PluginTask, RawRegistryFile};

/// Query surface the engine needs from a plugin registry.
pub trait TaskRegistry {
    /// Look up `task` inside `plugin`.
    fn resolve_task(&self, plugin: &str, task: &str) -> Option<&PluginTask>;

    /// Every plugin task named `task`, across all plugins.
    fn providers_of(&self, task: &str) -> Vec<&PluginTask>;
}

/// Outcome of resolving a [`TaskRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLookup<'r> {
    Found(&'r PluginTask),
    Missing,
    /// Unqualified name provided by several plugins.
    Ambiguous(Vec<String>),
}

/// Resolve a task reference: qualified refs directly, bare names only when
/// exactly one plugin provides them.
pub fn lookup<'r, R>(registry: &'r R, task: &TaskRef) -> TaskLookup<'r>
where
    R: TaskRegistry + ?Sized,
{
    match &task.plugin {
        Some(plugin) => match registry.resolve_task(plugin, &task.task) {
            Some(found) => TaskLookup::Found(found),
            None => TaskLookup::Missing,
        },
        None => {
            let mut providers = registry.providers_of(&task.task);
            match providers.len() {
                0 => TaskLookup::Missing,
                1 => TaskLookup::Found(providers.remove(0)),
                _ => TaskLookup::Ambiguous(providers.into_iter().map(|t| t.plugin.clone()).collect()),
            }
        }
    }
}

/// In-memory registry indexed by plugin and task name.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    /// plugin -> task -> definition
    tasks: BTreeMap<String, BTreeMap<String, PluginTask>>,
    snapshots: BTreeMap<String, Option<u64>>,
}

impl PluginRegistry {
    /// Index the given snapshots. A plugin listed twice keeps the later one.
    pub fn new(plugins: impl IntoIterator<Item = PluginSnapshot>) -> Self {
        let mut registry = Self::default();

        for plugin in plugins {
            if registry.snapshots.contains_key(&plugin.name) {
                warn!(plugin = %plugin.name, "plugin listed twice; keeping the later snapshot");
            }
            registry
                .snapshots
                .insert(plugin.name.clone(), plugin.snapshot);

            let tasks = plugin
                .tasks
                .into_iter()
                .map(|task| (task.name.clone(), task))
                .collect();
            registry.tasks.insert(plugin.name, tasks);
        }

        debug!(
            plugins = registry.snapshots.len(),
            tasks = registry.tasks.values().map(BTreeMap::len).sum::<usize>(),
            "indexed plugin registry"
        );
        registry
    }

    /// Parse a registry TOML document and index it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(Self::new(parse_registry(text)?))
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    pub fn snapshot_of(&self, plugin: &str) -> Option<u64> {
        self.snapshots.get(plugin).copied().flatten()
    }

    pub fn contains_plugin(&self, plugin: &str) -> bool {
        self.snapshots.contains_key(plugin)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl TaskRegistry for PluginRegistry {
    fn resolve_task(&self, plugin: &str, task: &str) -> Option<&PluginTask> {
        self.tasks.get(plugin)?.get(task)
    }

    fn providers_of(&self, task: &str) -> Vec<&PluginTask> {
        self.tasks
            .values()
            .filter_map(|tasks| tasks.get(task))
            .collect()
    }
}

/// Parse a registry document into plugin snapshots.
pub fn parse_registry(text: &str) -> Result<Vec<PluginSnapshot>> {
    let raw: RawRegistryFile = toml::from_str(text)?;
    Vec::<PluginSnapshot>::try_from(raw)
}

impl TryFrom<RawRegistryFile> for Vec<PluginSnapshot> {
    type Error = StepgraphError;

    fn try_from(raw: RawRegistryFile) -> std::result::Result<Self, Self::Error> {
        let mut plugins = Vec::with_capacity(raw.plugin.len());

        for (plugin_name, raw_plugin) in raw.plugin {
            ensure_name(&plugin_name, "plugin")?;

            let mut tasks = Vec::with_capacity(raw_plugin.task.len());
            for (task_name, raw_task) in raw_plugin.task {
                ensure_name(&task_name, "task")?;
                let qualified = format!("{plugin_name}.{task_name}");
                ensure_unique_params(&qualified, "input", &raw_task.inputs)?;
                ensure_unique_params(&qualified, "output", &raw_task.outputs)?;

                tasks.push(PluginTask {
                    name: task_name,
                    plugin: plugin_name.clone(),
                    inputs: raw_task.inputs,
                    outputs: raw_task.outputs,
                });
            }

            plugins.push(PluginSnapshot {
                name: plugin_name,
                snapshot: raw_plugin.snapshot,
                tasks,
            });
        }

        Ok(plugins)
    }
}

fn ensure_name(name: &str, what: &str) -> Result<()> {
    if is_ident(name) {
        Ok(())
    } else {
        Err(StepgraphError::RegistryError(format!(
            "invalid {what} name {name:?}"
        )))
    }
}

fn ensure_unique_params(task: &str, what: &str, params: &[ParamSpec]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for param in params {
        if !seen.insert(param.name.as_str()) {
            return Err(StepgraphError::RegistryError(format!(
                "task '{task}' declares {what} '{}' more than once",
                param.name
            )));
        }
    }
    Ok(())
}
