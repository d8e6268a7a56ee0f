//! Integration tests for the editor crate: real pipeline behind the scheduler

use livemark_editor::{
    compile, insert_template, CompileOutcome, ComponentRegistry, ErrorKind, Fragment, Pipeline,
    PreviewState, Scheduler, SchedulerConfig, UnknownTagFallback,
};
use livemark_evaluator::{CustomComponentSpec, VNode};
use livemark_parser::extract_headings;
use std::time::Duration;
use tokio::sync::watch;

async fn wait_for_sequence(preview: &mut watch::Receiver<PreviewState>, sequence: u64) -> PreviewState {
    tokio::time::timeout(Duration::from_secs(10), preview.wait_for(|state| state.sequence >= sequence))
        .await
        .expect("Timed out waiting for the preview")
        .expect("Scheduler stopped")
        .clone()
}

fn quick() -> SchedulerConfig {
    SchedulerConfig::with_debounce(Duration::from_millis(20))
}

#[tokio::test]
async fn test_scheduler_publishes_compiled_document() {
    let handle = Scheduler::spawn(Pipeline::new(ComponentRegistry::with_builtins()), quick());
    let mut preview = handle.subscribe();

    handle
        .submit("# Guide\n\n<Callout type=\"tip\" title=\"Hint\">\n\nTwo is {1 + 1}.\n\n</Callout>")
        .unwrap();

    let state = wait_for_sequence(&mut preview, 1).await;
    let tree = state.outcome.tree().expect("compile should succeed");

    assert_eq!(tree.nodes.len(), 2);
    assert!(matches!(&tree.nodes[1], VNode::Component { name, .. } if name == "Callout"));
    assert!(tree.nodes[1].text_content().contains("Two is 2."));
}

#[tokio::test]
async fn test_error_display_scenario() {
    let handle = Scheduler::spawn(Pipeline::new(ComponentRegistry::with_builtins()), quick());
    let mut preview = handle.subscribe();

    handle.submit("<Callout>unterminated").unwrap();
    let state = wait_for_sequence(&mut preview, 1).await;

    match &state.outcome {
        CompileOutcome::Failure(err) => {
            assert_eq!(err.kind, ErrorKind::Parse);
            assert!(err.message.starts_with("1:1: "), "message: {}", err.message);
        }
        other => panic!("expected a failure, got {:?}", other),
    }

    // Fixing the source replaces the error with a tree
    handle.submit("<Callout>terminated</Callout>").unwrap();
    let state = wait_for_sequence(&mut preview, 2).await;
    assert!(state.outcome.tree().is_some());
}

#[tokio::test]
async fn test_unknown_tag_round_trip() {
    let registry = ComponentRegistry::with_builtins();
    let tree = compile("<Sparkle intensity={3}>\nshiny\n</Sparkle>", &registry).await.unwrap();

    assert_eq!(tree.unknown_tags(), vec!["Sparkle".to_string()]);
    match &tree.nodes[0] {
        VNode::Unknown {
            name,
            props,
            fallback,
            ..
        } => {
            assert_eq!(name, "Sparkle");
            assert_eq!(props.get("intensity").and_then(|v| v.as_number()), Some(3.0));
            assert_eq!(*fallback, UnknownTagFallback::Label);
        }
        other => panic!("expected an unknown node, got {:?}", other),
    }
}

#[tokio::test]
async fn test_toc_scenario_matches_heading_ids() {
    let source = "# Title\n\nIntro\n\n## Sub Heading\n\n### Another One\n";

    let toc = extract_headings(source);
    let ids: Vec<_> = toc.iter().map(|entry| entry.id.as_str()).collect();
    let levels: Vec<_> = toc.iter().map(|entry| entry.level).collect();
    assert_eq!(ids, vec!["title", "sub-heading", "another-one"]);
    assert_eq!(levels, vec![1, 2, 3]);

    let tree = compile(source, &ComponentRegistry::with_builtins()).await.unwrap();
    let mut heading_ids = Vec::new();
    tree.walk(&mut |node| {
        if let VNode::Element { tag, attributes, .. } = node {
            if matches!(tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
                if let Some(id) = attributes.get("id") {
                    heading_ids.push(id.clone());
                }
            }
        }
    });
    assert_eq!(heading_ids, ids);
}

#[tokio::test]
async fn test_custom_component_from_authoring_flow() {
    let registry = ComponentRegistry::with_builtins();
    let spec = CustomComponentSpec {
        name: "PricingTable".to_string(),
        label: "Pricing table".to_string(),
        template: "<PricingTable plan=\"pro\" />".to_string(),
        description: Some("Plan comparison".to_string()),
    };
    registry.register_custom(&spec).unwrap();

    let mut fragments = vec![Fragment::new("# Pricing")];
    insert_template(&mut fragments, usize::MAX, &spec);

    let handle = Scheduler::spawn(Pipeline::new(registry), quick());
    let mut preview = handle.subscribe();
    handle.submit(fragments).unwrap();

    let state = wait_for_sequence(&mut preview, 1).await;
    let tree = state.outcome.tree().expect("compile should succeed");
    assert!(tree.unknown_tags().is_empty());

    let mut found = false;
    tree.walk(&mut |node| {
        if node.attribute("data-component") == Some("PricingTable") {
            found = true;
            assert_eq!(node.attribute("data-plan"), Some("pro"));
        }
    });
    assert!(found);
}

#[tokio::test]
async fn test_empty_input_publishes_empty_tree() {
    let handle = Scheduler::spawn(Pipeline::new(ComponentRegistry::with_builtins()), quick());
    let mut preview = handle.subscribe();

    handle.submit("").unwrap();
    let state = wait_for_sequence(&mut preview, 1).await;
    assert!(state.outcome.tree().map(|tree| tree.is_empty()).unwrap_or(false));
}
