// src/config/validate.rs

use globset::Glob;

use crate::config::model::{Manifest, RawManifest};
use crate::errors::{Result, StepgraphError};
use crate::graph::parser::is_ident;

impl TryFrom<RawManifest> for Manifest {
    type Error = StepgraphError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_raw_manifest(&raw)?;
        Ok(Manifest::new_unchecked(raw.entrypoint, raw.parameter))
    }
}

fn validate_raw_manifest(raw: &RawManifest) -> Result<()> {
    validate_entrypoint_section(raw)?;
    validate_plugin_patterns(raw)?;
    validate_parameter_names(raw)?;
    Ok(())
}

fn validate_entrypoint_section(raw: &RawManifest) -> Result<()> {
    if raw.entrypoint.name.trim().is_empty() {
        return Err(StepgraphError::ConfigError(
            "[entrypoint].name must not be empty".to_string(),
        ));
    }
    if raw.entrypoint.task_graph.trim().is_empty() {
        return Err(StepgraphError::ConfigError(
            "[entrypoint].task_graph must name a file".to_string(),
        ));
    }
    Ok(())
}

fn validate_plugin_patterns(raw: &RawManifest) -> Result<()> {
    if raw.entrypoint.plugins.is_empty() {
        return Err(StepgraphError::ConfigError(
            "[entrypoint].plugins must list at least one registry file pattern".to_string(),
        ));
    }
    for pattern in &raw.entrypoint.plugins {
        Glob::new(pattern).map_err(|e| {
            StepgraphError::ConfigError(format!("invalid plugin file pattern '{pattern}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_parameter_names(raw: &RawManifest) -> Result<()> {
    for param in &raw.parameter {
        if !is_ident(&param.name) {
            return Err(StepgraphError::ConfigError(format!(
                "parameter name '{}' is not an identifier",
                param.name
            )));
        }
    }
    Ok(())
}
