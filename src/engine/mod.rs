// src/engine/mod.rs

//! Resolution engine for entrypoint task graphs.
//!
//! This module ties together:
//! - swap selection ([`swap`])
//! - parameter and plugin collection for the active steps ([`params`])
//! - the two public operations ([`resolve`]):
//!   [`resolve_dynamic_params`] and [`validate_entrypoint`]
//!
//! Every call is a pure function of its inputs: the registry is passed in
//! explicitly and nothing is retained between calls.

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::dag::CycleError;
use crate::graph::StepName;
use crate::validate::{ValidationIssue, render_issues};

pub mod params;
pub mod resolve;
pub mod swap;

pub use params::{collect_params, collect_plugins};
pub use resolve::{resolve_dynamic_params, validate_entrypoint};
pub use swap::{ActiveSteps, SwapChoices, SwapError, resolve_swaps};

/// Successful result of [`resolve_dynamic_params`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWorkflow {
    /// Global parameters the active steps need.
    pub entrypoint_params: BTreeSet<String>,
    /// One valid execution order of the active steps.
    pub topological_sort: Vec<StepName>,
    /// Plugins providing the active steps' tasks.
    #[serde(serialize_with = "plugins_as_objects")]
    pub active_plugins: BTreeSet<String>,
}

fn plugins_as_objects<S: Serializer>(
    plugins: &BTreeSet<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Named<'a> {
        name: &'a str,
    }

    serializer.collect_seq(plugins.iter().map(|name| Named { name }))
}

/// Why [`resolve_dynamic_params`] failed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{}", .0.message())]
    Syntax(ValidationIssue),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error("{}", render_issues(.0))]
    Invalid(Vec<ValidationIssue>),

    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// How a caller should treat an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is wrong: bad document, bad swap choices, or a
    /// graph that cannot be ordered.
    BadRequest,
    /// The graph does not validate against the registry.
    Unprocessable,
}

impl EngineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::Syntax(_) | EngineError::Swap(_) | EngineError::Cycle(_) => {
                ErrorClass::BadRequest
            }
            EngineError::Invalid(_) => ErrorClass::Unprocessable,
        }
    }

    /// Diagnostics carried by the error, if any.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            EngineError::Syntax(issue) => std::slice::from_ref(issue),
            EngineError::Invalid(issues) => issues,
            EngineError::Swap(_) | EngineError::Cycle(_) => &[],
        }
    }
}
