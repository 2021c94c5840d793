// src/registry/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ParamType;

/// A declared input or output of a plugin task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParamSpec {
    pub name: String,

    #[serde(rename = "type", default)]
    pub param_type: ParamType,

    /// Only meaningful for inputs.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A task provided by a plugin snapshot. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginTask {
    pub name: String,
    pub plugin: String,
    pub inputs: Vec<ParamSpec>,
    pub outputs: Vec<ParamSpec>,
}

impl PluginTask {
    pub fn input(&self, name: &str) -> Option<&ParamSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&ParamSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.plugin, self.name)
    }
}

/// One plugin as materialized by the persistence layer for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSnapshot {
    pub name: String,
    /// Snapshot identifier, when the caller tracks one.
    pub snapshot: Option<u64>,
    pub tasks: Vec<PluginTask>,
}

/// Registry file layout:
///
/// ```toml
/// [plugin.plugin1]
/// snapshot = 3
///
/// [plugin.plugin1.task.task1]
/// inputs = [{ name = "a", type = "any" }]
/// outputs = [{ name = "output", type = "string" }]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRegistryFile {
    #[serde(default)]
    pub plugin: BTreeMap<String, RawPlugin>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPlugin {
    #[serde(default)]
    pub snapshot: Option<u64>,

    #[serde(default)]
    pub task: BTreeMap<String, RawTask>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTask {
    #[serde(default)]
    pub inputs: Vec<ParamSpec>,

    #[serde(default)]
    pub outputs: Vec<ParamSpec>,
}
