// src/validate/mod.rs

//! Diagnostics and semantic checks.
//!
//! - [`issue`] defines [`ValidationIssue`] and its wire rendering.
//! - [`semantic`] checks bindings against the plugin registry.
//! - [`parameters`] checks global-parameter declarations of an entrypoint.

pub mod issue;
pub mod parameters;
pub mod semantic;

pub use issue::{
    IssueKind, IssueSeverity, ValidationIssue, ValidationReport, is_valid, render_issues,
};
pub use parameters::{EntrypointParameter, check_parameters};
pub use semantic::{Targets, validate_bindings};
