// src/config/mod.rs

//! Entrypoint manifests.
//!
//! Responsibilities:
//! - Define the TOML-backed manifest model (`model.rs`).
//! - Load a manifest, its task graph and its registry files (`loader.rs`).
//! - Validate manifest-level invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_entrypoint, load_entrypoint_with, load_from_path};
pub use model::{Entrypoint, EntrypointSection, Manifest, RawManifest};
