#![allow(dead_code)]

use std::collections::BTreeMap;

use stepgraph::registry::{ParamSpec, PluginRegistry, PluginSnapshot, PluginTask};
use stepgraph::types::ParamType;

/// Builder for a `PluginRegistry` to simplify test setup.
pub struct RegistryBuilder {
    plugins: Vec<PluginSnapshot>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self { plugins: vec![] }
    }

    pub fn with_plugin(mut self, plugin: PluginSnapshot) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn build(self) -> PluginRegistry {
        PluginRegistry::new(self.plugins)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `PluginSnapshot`.
pub struct PluginBuilder {
    plugin: PluginSnapshot,
}

impl PluginBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            plugin: PluginSnapshot {
                name: name.to_string(),
                snapshot: None,
                tasks: vec![],
            },
        }
    }

    pub fn snapshot(mut self, id: u64) -> Self {
        self.plugin.snapshot = Some(id);
        self
    }

    /// Add a task; its `plugin` field is set to this plugin.
    pub fn with_task(mut self, task: TaskBuilder) -> Self {
        let mut task = task.task;
        task.plugin = self.plugin.name.clone();
        self.plugin.tasks.push(task);
        self
    }

    pub fn build(self) -> PluginSnapshot {
        self.plugin
    }
}

/// Builder for a `PluginTask`.
pub struct TaskBuilder {
    task: PluginTask,
}

impl TaskBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: PluginTask {
                name: name.to_string(),
                plugin: String::new(),
                inputs: vec![],
                outputs: vec![],
            },
        }
    }

    pub fn input(mut self, name: &str, param_type: ParamType) -> Self {
        self.task.inputs.push(ParamSpec::new(name, param_type));
        self
    }

    pub fn optional_input(mut self, name: &str, param_type: ParamType) -> Self {
        self.task
            .inputs
            .push(ParamSpec::new(name, param_type).optional());
        self
    }

    pub fn output(mut self, name: &str, param_type: ParamType) -> Self {
        self.task.outputs.push(ParamSpec::new(name, param_type));
        self
    }
}

/// Builds task-graph TOML text step by step.
///
/// Argument values are written as TOML strings, so `"$step1"` and
/// `"$global1"` become references after parsing.
pub struct GraphTextBuilder {
    text: String,
}

impl GraphTextBuilder {
    pub fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    pub fn plain(mut self, step: &str, task: &str, args: &[(&str, &str)]) -> Self {
        self.text.push_str(&format!("[{step}]\ntask = {}\n", quote(task)));
        self.push_args(args);
        self
    }

    /// A swap step; each alternative is `(label, task, args)`.
    pub fn swap(
        mut self,
        step: &str,
        choice_key: &str,
        alternatives: &[(&str, &str, &[(&str, &str)])],
    ) -> Self {
        self.text
            .push_str(&format!("[{step}]\nswap = {}\n\n", quote(choice_key)));
        for (label, task, args) in alternatives {
            self.text.push_str(&format!(
                "[{step}.alternatives.{label}]\ntask = {}\n",
                quote(task)
            ));
            self.push_args(args);
        }
        self
    }

    fn push_args(&mut self, args: &[(&str, &str)]) {
        if !args.is_empty() {
            let args: BTreeMap<&str, &str> = args.iter().copied().collect();
            let rendered: Vec<String> = args
                .iter()
                .map(|(name, value)| format!("{name} = {}", quote(value)))
                .collect();
            self.text
                .push_str(&format!("args = {{ {} }}\n", rendered.join(", ")));
        }
        self.text.push('\n');
    }

    pub fn build(self) -> String {
        self.text
    }
}

impl Default for GraphTextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
