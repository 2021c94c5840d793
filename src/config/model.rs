// src/config/model.rs

use serde::Deserialize;

use crate::engine::{EngineError, ResolvedWorkflow, SwapChoices};
use crate::engine::{resolve_dynamic_params, validate_entrypoint};
use crate::registry::PluginRegistry;
use crate::validate::{EntrypointParameter, ValidationIssue};

/// Manifest as read from a TOML file.
///
/// ```toml
/// [entrypoint]
/// name = "swap_test"
/// task_graph = "swap_test.graph.toml"
/// plugins = ["plugins/*.toml"]
///
/// [[parameter]]
/// name = "global1"
/// type = "string"
/// default = "hello"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawManifest {
    pub entrypoint: EntrypointSection,

    /// Declared global parameters, in declaration order.
    #[serde(default)]
    pub parameter: Vec<EntrypointParameter>,
}

/// `[entrypoint]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntrypointSection {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Task graph file, relative to the manifest's directory.
    pub task_graph: String,

    /// Glob patterns for registry files, relative to the manifest's
    /// directory. Every pattern must match at least one file.
    #[serde(default)]
    pub plugins: Vec<String>,
}

/// A manifest whose own invariants hold. Paths are not resolved yet.
#[derive(Debug, Clone)]
pub struct Manifest {
    entrypoint: EntrypointSection,
    parameters: Vec<EntrypointParameter>,
}

impl Manifest {
    pub(crate) fn new_unchecked(
        entrypoint: EntrypointSection,
        parameters: Vec<EntrypointParameter>,
    ) -> Self {
        Self {
            entrypoint,
            parameters,
        }
    }

    pub fn entrypoint(&self) -> &EntrypointSection {
        &self.entrypoint
    }

    pub fn parameters(&self) -> &[EntrypointParameter] {
        &self.parameters
    }
}

/// A manifest with its task graph text and plugin registry loaded; the
/// input of both engine operations.
#[derive(Debug, Clone)]
pub struct Entrypoint {
    pub name: String,
    pub description: Option<String>,
    pub graph_text: String,
    pub registry: PluginRegistry,
    pub parameters: Vec<EntrypointParameter>,
}

impl Entrypoint {
    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate_entrypoint(&self.graph_text, &self.registry, &self.parameters)
    }

    pub fn resolve(&self, choices: &SwapChoices) -> Result<ResolvedWorkflow, EngineError> {
        resolve_dynamic_params(&self.graph_text, &self.registry, choices)
    }
}
