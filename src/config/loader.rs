// src/config/loader.rs

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSetBuilder};
use tracing::{debug, info};

use crate::config::model::{Entrypoint, Manifest, RawManifest};
use crate::errors::{Result, StepgraphError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::registry::{PluginRegistry, PluginSnapshot, parse_registry};

/// Load a manifest file and return the raw `RawManifest`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// manifest-level checks.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawManifest> {
    let contents = fs.read_to_string(path.as_ref())?;
    let raw: RawManifest = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a manifest and check its own invariants (non-empty name, valid
/// plugin patterns, identifier parameter names).
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(fs, &path)?;
    Manifest::try_from(raw)
}

/// [`load_entrypoint_with`] on the real filesystem.
pub fn load_entrypoint(path: impl AsRef<Path>) -> Result<Entrypoint> {
    load_entrypoint_with(&RealFileSystem, path)
}

/// Load a manifest together with its task graph text and registry files.
///
/// Paths in the manifest are relative to the manifest's directory. Every
/// plugin pattern must match at least one file, and a plugin may only be
/// defined by one registry file.
pub fn load_entrypoint_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Entrypoint> {
    let path = path.as_ref();
    let manifest = load_and_validate(fs, path)?;
    let root = manifest_root_dir(path);
    let section = manifest.entrypoint();

    let graph_path = root.join(&section.task_graph);
    let graph_text = fs.read_to_string(&graph_path)?;
    debug!(path = ?graph_path, "read task graph");

    let registry_files = collect_registry_files(fs, &root, &section.plugins)?;
    let registry = load_registry(fs, &registry_files)?;

    info!(
        entrypoint = %section.name,
        registry_files = registry_files.len(),
        parameters = manifest.parameters().len(),
        "loaded entrypoint manifest"
    );

    Ok(Entrypoint {
        name: section.name.clone(),
        description: section.description.clone(),
        graph_text,
        registry,
        parameters: manifest.parameters().to_vec(),
    })
}

/// Directory manifest-relative paths are resolved against; `"."` for a bare
/// file name.
fn manifest_root_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Walk `root` and return every file matched by one of `patterns`, sorted.
fn collect_registry_files(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
) -> Result<Vec<PathBuf>> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            StepgraphError::ConfigError(format!("invalid plugin file pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| StepgraphError::ConfigError(format!("building plugin patterns: {e}")))?;

    let mut matched_patterns = vec![false; patterns.len()];
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                let rel = relative_slash_path(root, &path);
                let hits = set.matches(&rel);
                if !hits.is_empty() {
                    for idx in hits {
                        matched_patterns[idx] = true;
                    }
                    files.push(path);
                }
            }
        }
    }

    if let Some(idx) = matched_patterns.iter().position(|matched| !matched) {
        return Err(StepgraphError::ConfigError(format!(
            "plugin file pattern '{}' matched no files under {:?}",
            patterns[idx], root
        )));
    }

    files.sort();
    Ok(files)
}

/// `path` relative to `root`, with `/` separators and no `.` components.
fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn load_registry(fs: &dyn FileSystem, files: &[PathBuf]) -> Result<PluginRegistry> {
    // plugin name -> file that defined it
    let mut origins: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut plugins: Vec<PluginSnapshot> = Vec::new();

    for file in files {
        let text = fs.read_to_string(file)?;
        let snapshots = parse_registry(&text).map_err(|e| {
            StepgraphError::ConfigError(format!("registry file {:?}: {e}", file))
        })?;

        for snapshot in snapshots {
            if let Some(previous) = origins.insert(snapshot.name.clone(), file.clone()) {
                return Err(StepgraphError::ConfigError(format!(
                    "plugin '{}' is defined in both {:?} and {:?}",
                    snapshot.name, previous, file
                )));
            }
            plugins.push(snapshot);
        }
        debug!(file = ?file, "read registry file");
    }

    Ok(PluginRegistry::new(plugins))
}
