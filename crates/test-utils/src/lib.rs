pub mod builders;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use stepgraph::registry::PluginRegistry;
use stepgraph::types::ParamType;

use builders::{PluginBuilder, RegistryBuilder, TaskBuilder};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// The registry behind the `no_swap_test` and `swap_test` graphs.
///
/// - `plugin1.task1(a: any, b?: string) -> output: string`
/// - `plugin9.task2(x: any, y: string) -> output`
/// - `plugin9.task4(x: any, y: string) -> output`
/// - `plugin13.task10(x: any, y: string) -> output`
pub fn sample_registry() -> PluginRegistry {
    RegistryBuilder::new()
        .with_plugin(
            PluginBuilder::new("plugin1")
                .snapshot(1)
                .with_task(
                    TaskBuilder::new("task1")
                        .input("a", ParamType::Any)
                        .optional_input("b", ParamType::String)
                        .output("output", ParamType::String),
                )
                .build(),
        )
        .with_plugin(
            PluginBuilder::new("plugin9")
                .snapshot(9)
                .with_task(xy_task("task2"))
                .with_task(xy_task("task4"))
                .build(),
        )
        .with_plugin(
            PluginBuilder::new("plugin13")
                .snapshot(13)
                .with_task(xy_task("task10"))
                .build(),
        )
        .build()
}

fn xy_task(name: &str) -> TaskBuilder {
    TaskBuilder::new(name)
        .input("x", ParamType::Any)
        .input("y", ParamType::String)
        .output("output", ParamType::Any)
}
