// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod registry;
pub mod types;
pub mod validate;

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::{Entrypoint, load_entrypoint};
use crate::dag::DependencyGraph;
use crate::engine::{ErrorClass, SwapChoices};
use crate::graph::{Step, parse};
use crate::validate::{IssueSeverity, ValidationReport};

pub use crate::engine::{
    EngineError, ResolvedWorkflow, SwapError, resolve_dynamic_params, validate_entrypoint,
};
pub use crate::registry::{PluginRegistry, TaskRegistry};
pub use crate::validate::{EntrypointParameter, ValidationIssue};

/// High-level entry point used by `main.rs`.
///
/// Loads the manifest named on the command line and runs the selected
/// command. Returns `Ok(false)` when the graph or the swap choices were
/// rejected (the reason has been printed), and `Err` for anything that kept
/// the command from running at all.
pub fn run(args: CliArgs) -> Result<bool> {
    let entrypoint = load_entrypoint(&args.manifest)
        .with_context(|| format!("loading manifest {}", args.manifest))?;

    match args.command {
        Command::Validate { json } => run_validate(&entrypoint, json),
        Command::Resolve { choices, json } => {
            let choices: SwapChoices = choices.into_iter().collect();
            run_resolve(&entrypoint, &choices, json)
        }
        Command::Show => {
            print_show(&entrypoint);
            Ok(true)
        }
    }
}

fn run_validate(entrypoint: &Entrypoint, json: bool) -> Result<bool> {
    let issues = entrypoint.validate();
    let report = ValidationReport::from_issues(&issues);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if issues.is_empty() {
        println!("{}: valid", entrypoint.name);
    } else {
        println!("{}: {} issue(s)", entrypoint.name, issues.len());
        for issue in &issues {
            let severity = match issue.severity() {
                IssueSeverity::Error => "error",
                IssueSeverity::Warning => "warning",
            };
            println!("  {severity}: {}", issue.message());
        }
    }

    Ok(report.is_valid())
}

fn run_resolve(entrypoint: &Entrypoint, choices: &SwapChoices, json: bool) -> Result<bool> {
    match entrypoint.resolve(choices) {
        Ok(workflow) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&workflow)?);
            } else {
                print_workflow(&workflow);
            }
            Ok(true)
        }
        Err(err) => {
            let class = match err.class() {
                ErrorClass::BadRequest => "bad request",
                ErrorClass::Unprocessable => "invalid task graph",
            };
            if json {
                let body = serde_json::json!({ "message": err.to_string() });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            eprintln!("{class}: {err}");
            Ok(false)
        }
    }
}

fn print_workflow(workflow: &ResolvedWorkflow) {
    println!("order:");
    for (idx, step) in workflow.topological_sort.iter().enumerate() {
        println!("  {}. {step}", idx + 1);
    }
    println!("entrypoint params: {:?}", workflow.entrypoint_params);
    println!("active plugins: {:?}", workflow.active_plugins);
}

/// Describe the graph without validating it.
fn print_show(entrypoint: &Entrypoint) {
    println!("stepgraph show: {}", entrypoint.name);
    if let Some(ref description) = entrypoint.description {
        println!("  {description}");
    }
    println!();

    println!("parameters ({}):", entrypoint.parameters.len());
    for param in &entrypoint.parameters {
        match &param.default_value {
            Some(default) => println!("  - {}: {} = {default}", param.name, param.parameter_type),
            None => println!("  - {}: {}", param.name, param.parameter_type),
        }
    }
    println!();

    let graph = match parse(&entrypoint.graph_text) {
        Ok(graph) => graph,
        Err(issue) => {
            println!("task graph does not parse: {}", issue.message());
            return;
        }
    };
    let deps = DependencyGraph::build(&graph);

    println!("steps ({}):", graph.len());
    for (name, step) in graph.steps() {
        println!("  - {name}");
        match step {
            Step::Plain(invocation) => {
                println!("      task: {}", invocation.task);
                print_refs("      ", &deps, name, None);
            }
            Step::Swap(swap) => {
                println!("      swap: {}", swap.choice_key);
                for (label, invocation) in &swap.alternatives {
                    println!("      [{label}] task: {}", invocation.task);
                    print_refs("        ", &deps, name, Some(label.as_str()));
                }
            }
        }
    }

    debug!("show complete (no validation)");
}

fn print_refs(indent: &str, deps: &DependencyGraph, step: &str, choice: Option<&str>) {
    let after = deps.dependencies_of(step, choice);
    if !after.is_empty() {
        println!("{indent}after: {after:?}");
    }
    let params = deps.params_of(step, choice);
    if !params.is_empty() {
        println!("{indent}params: {params:?}");
    }
}
