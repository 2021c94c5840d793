// tests/resolve_dynamic_params.rs

mod common;

use common::{TestResult, graph_fixture, init_tracing, respects, sample_registry, set};
use stepgraph::engine::{ErrorClass, SwapChoices};
use stepgraph::{EngineError, SwapError, resolve_dynamic_params};

fn choices(pairs: &[(&str, &str)]) -> SwapChoices {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn no_swap_graph_resolves_with_empty_choices() -> TestResult {
    init_tracing();

    let workflow = resolve_dynamic_params(
        &graph_fixture("no_swap_test"),
        &sample_registry(),
        &SwapChoices::new(),
    )?;

    assert_eq!(
        workflow.entrypoint_params,
        set(&["global1", "global6", "global12"])
    );
    assert_eq!(
        workflow.active_plugins,
        set(&["plugin1", "plugin9", "plugin13"])
    );
    // The chain admits a single order.
    assert_eq!(
        workflow.topological_sort,
        vec!["step1", "step3", "step4", "step2"]
    );
    Ok(())
}

#[test]
fn swap_graph_resolves_task2_task1() -> TestResult {
    init_tracing();

    let workflow = resolve_dynamic_params(
        &graph_fixture("swap_test"),
        &sample_registry(),
        &choices(&[("step2_choice", "task2"), ("step3_choice", "task1")]),
    )?;

    assert_eq!(
        workflow.entrypoint_params,
        set(&["global1", "global3", "global6", "global9"])
    );
    assert_eq!(workflow.active_plugins, set(&["plugin1", "plugin9"]));

    let accepted: [[&str; 4]; 3] = [
        ["step1", "step2", "step3", "step4"],
        ["step1", "step3", "step2", "step4"],
        ["step1", "step3", "step4", "step2"],
    ];
    assert!(
        accepted
            .iter()
            .any(|order| workflow.topological_sort == order.to_vec()),
        "unexpected order {:?}",
        workflow.topological_sort
    );
    assert!(respects(
        &workflow.topological_sort,
        &["step1", "step2", "step3", "step4"],
        &[("step1", "step2"), ("step1", "step3"), ("step3", "step4")],
    ));
    Ok(())
}

#[test]
fn swap_graph_resolves_task10_task2() -> TestResult {
    init_tracing();

    let workflow = resolve_dynamic_params(
        &graph_fixture("swap_test"),
        &sample_registry(),
        &choices(&[("step2_choice", "task10"), ("step3_choice", "task2")]),
    )?;

    assert_eq!(
        workflow.entrypoint_params,
        set(&["global1", "global6", "global12"])
    );
    assert_eq!(
        workflow.active_plugins,
        set(&["plugin1", "plugin9", "plugin13"])
    );
    assert_eq!(
        workflow.topological_sort,
        vec!["step1", "step3", "step4", "step2"]
    );
    Ok(())
}

#[test]
fn empty_choices_on_swap_graph_is_a_bad_request() {
    init_tracing();

    let err = resolve_dynamic_params(
        &graph_fixture("swap_test"),
        &sample_registry(),
        &SwapChoices::new(),
    )
    .unwrap_err();

    assert_eq!(err.class(), ErrorClass::BadRequest);
    match err {
        EngineError::Swap(SwapError::Missing(keys)) => {
            assert_eq!(keys, set(&["step2_choice", "step3_choice"]));
        }
        other => panic!("expected missing swap choices, got {other:?}"),
    }
}

#[test]
fn extra_choice_key_is_a_bad_request() {
    init_tracing();

    let err = resolve_dynamic_params(
        &graph_fixture("swap_test"),
        &sample_registry(),
        &choices(&[
            ("step2_choice", "task2"),
            ("step3_choice", "task1"),
            ("step9_choice", "task1"),
        ]),
    )
    .unwrap_err();

    assert_eq!(err.class(), ErrorClass::BadRequest);
    match err {
        EngineError::Swap(SwapError::Extra(keys)) => assert_eq!(keys, set(&["step9_choice"])),
        other => panic!("expected unrecognized swap choices, got {other:?}"),
    }
}

#[test]
fn unknown_alternative_label_is_a_bad_request() {
    init_tracing();

    let err = resolve_dynamic_params(
        &graph_fixture("swap_test"),
        &sample_registry(),
        &choices(&[("step2_choice", "task2"), ("step3_choice", "doesnt_exist2")]),
    )
    .unwrap_err();

    assert_eq!(err.class(), ErrorClass::BadRequest);
    match &err {
        EngineError::Swap(SwapError::InvalidChoice {
            choice_key,
            label,
            expected,
        }) => {
            assert_eq!(choice_key, "step3_choice");
            assert_eq!(label, "doesnt_exist2");
            assert_eq!(expected, &vec!["task1".to_string(), "task2".to_string()]);
        }
        other => panic!("expected invalid choice, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "invalid choice \"doesnt_exist2\" for swap \"step3_choice\" (expected one of: task1, task2)"
    );
}

#[test]
fn missing_keys_are_reported_before_extra_ones() {
    init_tracing();

    let err = resolve_dynamic_params(
        &graph_fixture("swap_test"),
        &sample_registry(),
        &choices(&[("step2_choice", "task2"), ("other", "x")]),
    )
    .unwrap_err();

    assert!(matches!(err, EngineError::Swap(SwapError::Missing(_))));
    assert_eq!(err.to_string(), "missing swap choices: step3_choice");
}

#[test]
fn choices_on_graph_without_swaps_are_rejected() {
    init_tracing();

    let err = resolve_dynamic_params(
        &graph_fixture("no_swap_test"),
        &sample_registry(),
        &choices(&[("step2_choice", "task2")]),
    )
    .unwrap_err();

    assert!(matches!(err, EngineError::Swap(SwapError::Extra(_))));
}

#[test]
fn syntax_error_is_a_bad_request() {
    init_tracing();

    let err = resolve_dynamic_params("[step1\ntask = ", &sample_registry(), &SwapChoices::new())
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::BadRequest);
    assert!(matches!(err, EngineError::Syntax(_)));
    assert_eq!(err.issues().len(), 1);
}

#[test]
fn invalid_active_step_is_unprocessable() {
    init_tracing();

    let graph = r#"
[step1]
task = "plugin1.task1"
args = { a = 1, c = 2 }
"#;
    let err = resolve_dynamic_params(graph, &sample_registry(), &SwapChoices::new()).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Unprocessable);
    assert_eq!(
        err.to_string(),
        "[ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, 'In step \"step1\": unrecognized argument: c')]"
    );
}

#[test]
fn problems_in_unselected_alternatives_do_not_block_resolution() -> TestResult {
    init_tracing();

    let graph = r#"
[step1]
task = "plugin1.task1"
args = { a = "$global1" }

[step2]
swap = "pick"

[step2.alternatives.good]
task = "plugin9.task2"
args = { x = "$step1", y = "$global2" }

[step2.alternatives.broken]
task = "plugin42.nothing"
args = { z = "$global3" }
"#;
    let workflow =
        resolve_dynamic_params(graph, &sample_registry(), &choices(&[("pick", "good")]))?;

    assert_eq!(workflow.entrypoint_params, set(&["global1", "global2"]));
    assert_eq!(workflow.topological_sort, vec!["step1", "step2"]);

    let err = resolve_dynamic_params(graph, &sample_registry(), &choices(&[("pick", "broken")]))
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Unprocessable);
    Ok(())
}

#[test]
fn cycle_among_active_steps_is_a_bad_request() {
    init_tracing();

    let graph = r#"
[a]
task = "plugin9.task2"
args = { x = "$b", y = "s" }

[b]
task = "plugin9.task4"
args = { x = "$a", y = "s" }
"#;
    let err = resolve_dynamic_params(graph, &sample_registry(), &SwapChoices::new()).unwrap_err();

    assert_eq!(err.class(), ErrorClass::BadRequest);
    assert_eq!(err.to_string(), "dependency cycle between steps: a, b");
}

#[test]
fn self_reference_is_unprocessable_not_a_cycle() {
    init_tracing();

    let graph = r#"
[a]
task = "plugin9.task2"
args = { x = "$a", y = "s" }
"#;
    let err = resolve_dynamic_params(graph, &sample_registry(), &SwapChoices::new()).unwrap_err();

    assert!(matches!(err, EngineError::Invalid(_)), "{err:?}");
    assert_eq!(err.class(), ErrorClass::Unprocessable);
    assert_eq!(
        err.to_string(),
        "[ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, 'In step \"a\": step references its own output')]"
    );
}

#[test]
fn cycle_only_in_unselected_alternative_does_not_matter() -> TestResult {
    init_tracing();

    let graph = r#"
[a]
task = "plugin9.task2"
args = { x = "$b", y = "s" }

[b]
swap = "b_choice"

[b.alternatives.loop]
task = "plugin9.task4"
args = { x = "$a", y = "s" }

[b.alternatives.root]
task = "plugin1.task1"
args = { a = "$seed" }
"#;
    let workflow =
        resolve_dynamic_params(graph, &sample_registry(), &choices(&[("b_choice", "root")]))?;
    assert_eq!(workflow.topological_sort, vec!["b", "a"]);

    let err = resolve_dynamic_params(graph, &sample_registry(), &choices(&[("b_choice", "loop")]))
        .unwrap_err();
    assert!(matches!(err, EngineError::Cycle(_)));
    Ok(())
}

#[test]
fn workflow_serializes_to_response_shape() -> TestResult {
    init_tracing();

    let workflow = resolve_dynamic_params(
        &graph_fixture("swap_test"),
        &sample_registry(),
        &choices(&[("step2_choice", "task10"), ("step3_choice", "task2")]),
    )?;

    let json = serde_json::to_value(&workflow)?;
    assert_eq!(
        json,
        serde_json::json!({
            "entrypointParams": ["global1", "global12", "global6"],
            "topologicalSort": ["step1", "step3", "step4", "step2"],
            "activePlugins": [
                { "name": "plugin1" },
                { "name": "plugin13" },
                { "name": "plugin9" }
            ]
        })
    );
    Ok(())
}
