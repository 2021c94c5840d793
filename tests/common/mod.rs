#![allow(dead_code)]

use std::path::PathBuf;

use stepgraph::config::{Entrypoint, load_entrypoint};

pub use stepgraph_test_utils::{init_tracing, sample_registry};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Path of a file under `fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Text of a task graph under `fixtures/graphs/`.
pub fn graph_fixture(name: &str) -> String {
    let path = fixture_path("graphs").join(format!("{name}.graph.toml"));
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("reading fixture {}: {e}", path.display()))
}

/// Load `fixtures/<name>.toml` with its graph and registry files.
pub fn load_fixture(name: &str) -> Entrypoint {
    let path = fixture_path(&format!("{name}.toml"));
    load_entrypoint(&path).unwrap_or_else(|e| panic!("loading {}: {e}", path.display()))
}

/// Whether `order` contains exactly `steps` and puts every `from` before `to`.
pub fn respects(order: &[String], steps: &[&str], edges: &[(&str, &str)]) -> bool {
    let mut sorted: Vec<&str> = order.iter().map(String::as_str).collect();
    sorted.sort();
    let mut expected = steps.to_vec();
    expected.sort();
    if sorted != expected {
        return false;
    }

    let pos = |name: &str| order.iter().position(|s| s == name);
    edges
        .iter()
        .all(|(from, to)| matches!((pos(from), pos(to)), (Some(a), Some(b)) if a < b))
}

pub fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
