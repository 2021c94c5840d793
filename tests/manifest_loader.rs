// tests/manifest_loader.rs

mod common;

use std::collections::BTreeMap;
use std::fs;

use common::{TestResult, fixture_path, init_tracing, set};
use stepgraph::config::{load_and_validate, load_entrypoint, load_entrypoint_with};
use stepgraph::errors::StepgraphError;
use stepgraph::fs::mock::MockFileSystem;
use stepgraph::types::ParamType;

const GRAPH: &str = r#"
[fetch]
task = "net.fetch"
args = { url = "$source" }

[store]
task = "disk.store"
args = { data = "$fetch", dir = "$target" }
"#;

const NET: &str = r#"
[plugin.net]
snapshot = 4

[plugin.net.task.fetch]
inputs = [{ name = "url", type = "uri" }]
outputs = [{ name = "body", type = "string" }]
"#;

const DISK: &str = r#"
[plugin.disk.task.store]
inputs = [
    { name = "data", type = "any" },
    { name = "dir", type = "path" },
]
"#;

const MANIFEST: &str = r#"
[entrypoint]
name = "mirror"
description = "Fetch a page and store it"
task_graph = "mirror.graph.toml"
plugins = ["plugins/*.toml"]

[[parameter]]
name = "source"
type = "uri"

[[parameter]]
name = "target"
type = "path"
default = "/tmp/mirror"
"#;

fn mock_project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("Entrypoint.toml", MANIFEST);
    fs.add_file("mirror.graph.toml", GRAPH);
    fs.add_file("plugins/net.toml", NET);
    fs.add_file("plugins/disk.toml", DISK);
    fs.add_file("README.md", "not a registry file");
    fs
}

fn config_error(err: StepgraphError) -> String {
    match err {
        StepgraphError::ConfigError(msg) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn loads_manifest_graph_and_registry_from_mock_fs() -> TestResult {
    init_tracing();

    let fs = mock_project();
    let entrypoint = load_entrypoint_with(&fs, "Entrypoint.toml")?;

    assert_eq!(entrypoint.name, "mirror");
    assert_eq!(entrypoint.description.as_deref(), Some("Fetch a page and store it"));
    assert_eq!(entrypoint.graph_text, GRAPH);
    assert_eq!(
        entrypoint.registry.plugin_names().collect::<Vec<_>>(),
        vec!["disk", "net"]
    );
    assert_eq!(entrypoint.registry.snapshot_of("net"), Some(4));
    assert_eq!(entrypoint.registry.snapshot_of("disk"), None);

    assert_eq!(entrypoint.parameters.len(), 2);
    assert_eq!(entrypoint.parameters[1].parameter_type, ParamType::Path);
    assert_eq!(
        entrypoint.parameters[1].default_value.as_deref(),
        Some("/tmp/mirror")
    );

    assert!(entrypoint.validate().is_empty());
    let workflow = entrypoint.resolve(&BTreeMap::new())?;
    assert_eq!(workflow.topological_sort, vec!["fetch", "store"]);
    assert_eq!(workflow.entrypoint_params, set(&["source", "target"]));
    assert_eq!(workflow.active_plugins, set(&["disk", "net"]));
    Ok(())
}

#[test]
fn manifest_paths_are_relative_to_its_directory() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("project/Entrypoint.toml", MANIFEST);
    fs.add_file("project/mirror.graph.toml", GRAPH);
    fs.add_file("project/plugins/net.toml", NET);
    fs.add_file("project/plugins/disk.toml", DISK);
    // Outside the manifest directory; never matched.
    fs.add_file("plugins/other.toml", "[plugin.other]\n");

    let entrypoint = load_entrypoint_with(&fs, "project/Entrypoint.toml")?;
    assert!(!entrypoint.registry.contains_plugin("other"));
    assert!(entrypoint.registry.contains_plugin("net"));
    Ok(())
}

#[test]
fn pattern_without_matches_is_an_error() {
    init_tracing();

    let fs = mock_project();
    fs.add_file(
        "Entrypoint.toml",
        MANIFEST.replace(r#"["plugins/*.toml"]"#, r#"["plugins/*.toml", "vendor/*.toml"]"#),
    );

    let msg = config_error(load_entrypoint_with(&fs, "Entrypoint.toml").unwrap_err());
    assert!(msg.contains("'vendor/*.toml' matched no files"), "{msg}");
}

#[test]
fn plugin_defined_twice_is_an_error() {
    init_tracing();

    let fs = mock_project();
    fs.add_file("plugins/net_copy.toml", NET);

    let msg = config_error(load_entrypoint_with(&fs, "Entrypoint.toml").unwrap_err());
    assert!(msg.contains("plugin 'net' is defined in both"), "{msg}");
}

#[test]
fn broken_registry_file_names_the_file() {
    init_tracing();

    let fs = mock_project();
    fs.add_file(
        "plugins/disk.toml",
        r#"
[plugin.disk.task.store]
inputs = [{ name = "data" }, { name = "data" }]
"#,
    );

    let msg = config_error(load_entrypoint_with(&fs, "Entrypoint.toml").unwrap_err());
    assert!(msg.contains("disk.toml"), "{msg}");
    assert!(
        msg.contains("task 'disk.store' declares input 'data' more than once"),
        "{msg}"
    );
}

#[test]
fn missing_task_graph_file_is_an_error() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("Entrypoint.toml", MANIFEST);
    fs.add_file("plugins/net.toml", NET);

    assert!(load_entrypoint_with(&fs, "Entrypoint.toml").is_err());
}

#[test]
fn manifest_invariants_are_checked() {
    init_tracing();

    let cases = [
        (
            MANIFEST.replace("name = \"mirror\"", "name = \"  \""),
            "[entrypoint].name must not be empty",
        ),
        (
            MANIFEST.replace(r#"["plugins/*.toml"]"#, "[]"),
            "[entrypoint].plugins must list at least one registry file pattern",
        ),
        (
            MANIFEST.replace(r#"["plugins/*.toml"]"#, r#"["plugins/[.toml"]"#),
            "invalid plugin file pattern 'plugins/[.toml'",
        ),
        (
            MANIFEST.replace("name = \"source\"", "name = \"not valid\""),
            "parameter name 'not valid' is not an identifier",
        ),
    ];

    for (text, expected) in cases {
        let fs = MockFileSystem::new();
        fs.add_file("Entrypoint.toml", text);

        let msg = config_error(load_and_validate(&fs, "Entrypoint.toml").unwrap_err());
        assert!(msg.contains(expected), "expected {expected:?} in {msg:?}");
    }
}

#[test]
fn unknown_manifest_fields_are_rejected() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(
        "Entrypoint.toml",
        MANIFEST.replace("[entrypoint]", "[entrypoint]\nwatch = true"),
    );

    match load_and_validate(&fs, "Entrypoint.toml") {
        Err(StepgraphError::TomlError(_)) => {}
        other => panic!("expected TomlError, got {other:?}"),
    }
}

#[test]
fn loads_from_real_directory() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("plugins/nested"))?;
    fs::write(
        dir.path().join("Entrypoint.toml"),
        MANIFEST.replace(r#"["plugins/*.toml"]"#, r#"["plugins/**/*.toml"]"#),
    )?;
    fs::write(dir.path().join("mirror.graph.toml"), GRAPH)?;
    fs::write(dir.path().join("plugins/net.toml"), NET)?;
    fs::write(dir.path().join("plugins/nested/disk.toml"), DISK)?;

    let entrypoint = load_entrypoint(dir.path().join("Entrypoint.toml"))?;
    assert_eq!(
        entrypoint.registry.plugin_names().collect::<Vec<_>>(),
        vec!["disk", "net"]
    );
    assert!(entrypoint.validate().is_empty());
    Ok(())
}

#[test]
fn fixture_manifests_load() -> TestResult {
    init_tracing();

    let entrypoint = load_entrypoint(fixture_path("swap_test.toml"))?;
    assert_eq!(entrypoint.name, "swap_test");
    assert_eq!(
        entrypoint.registry.plugin_names().collect::<Vec<_>>(),
        vec!["plugin1", "plugin13", "plugin9"]
    );
    assert_eq!(entrypoint.parameters.len(), 5);
    Ok(())
}
