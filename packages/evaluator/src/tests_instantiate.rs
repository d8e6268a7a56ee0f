/// Instantiation against the component registry
use crate::*;
use livemark_parser::parse;

fn module(source: &str) -> CompiledModule {
    compile_module(&parse(source).unwrap(), source).unwrap()
}

fn render_with(source: &str, registry: &ComponentRegistry, fallback: UnknownTagFallback) -> EvalResult<DocumentTree> {
    instantiate(&module(source), &registry.snapshot(), fallback)
}

fn render(source: &str) -> DocumentTree {
    render_with(source, &ComponentRegistry::with_builtins(), UnknownTagFallback::Label).unwrap()
}

fn output(node: &VNode) -> &VNode {
    match node {
        VNode::Component { output, .. } => output,
        other => panic!("expected a component, got {:?}", other),
    }
}

#[test]
fn test_markdown_elements_use_prose_overrides() {
    let tree = render("# Title\n\nSome text");
    assert_eq!(tree.nodes.len(), 2);

    let heading = output(&tree.nodes[0]);
    assert_eq!(heading.attribute("class"), Some("md-h1"));
    assert_eq!(heading.attribute("id"), Some("title"));

    let paragraph = output(&tree.nodes[1]);
    assert_eq!(paragraph.attribute("class"), Some("md-p"));
}

#[test]
fn test_elements_without_override_are_plain() {
    let tree = render("Some *emphasis* and `code`");
    let paragraph = output(&tree.nodes[0]);
    assert!(matches!(&paragraph.children()[1], VNode::Element { tag, .. } if tag == "em"));
    assert!(matches!(&paragraph.children()[3], VNode::Element { tag, .. } if tag == "code"));
}

#[test]
fn test_heading_ids_match_toc() {
    let source = "# Getting Started\n\n## Install & Configure\n\n### Step 1: Run it";
    let tree = render(source);
    let ids: Vec<&str> = tree
        .nodes
        .iter()
        .map(|node| output(node).attribute("id").unwrap())
        .collect();
    let toc: Vec<String> = livemark_parser::extract_headings(source)
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, toc);
}

#[test]
fn test_links_open_in_new_tab() {
    let tree = render("[Docs](https://example.com \"The docs\")");
    let paragraph = output(&tree.nodes[0]);
    let link = output(&paragraph.children()[0]);
    assert_eq!(link.attribute("href"), Some("https://example.com"));
    assert_eq!(link.attribute("title"), Some("The docs"));
    assert_eq!(link.attribute("target"), Some("_blank"));
}

#[test]
fn test_callout_component() {
    let tree = render("<Callout type=\"warning\" title=\"Heads up\">\nBe **careful**.\n</Callout>");
    match &tree.nodes[0] {
        VNode::Component {
            name,
            props,
            output,
        } => {
            assert_eq!(name, "Callout");
            assert_eq!(props.get("type"), Some(&Value::from("warning")));
            assert_eq!(output.attribute("class"), Some("callout callout-warning"));
            assert_eq!(output.text_content(), "Heads upBe careful.");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_expression_props() {
    let tree = render("<CardGroup cols={1 + 2}>\n<Card title=\"A\" />\n</CardGroup>");
    match &tree.nodes[0] {
        VNode::Component { props, output, .. } => {
            assert_eq!(props.get("cols"), Some(&Value::Number(3.0)));
            assert_eq!(
                output.attribute("style"),
                Some("grid-template-columns: repeat(3, 1fr)")
            );
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_component_rejecting_props_is_an_error() {
    let err = render_with(
        "Text\n\n<Callout type=\"danger\">\nx\n</Callout>",
        &ComponentRegistry::with_builtins(),
        UnknownTagFallback::Label,
    )
    .unwrap_err();
    assert!(matches!(err, EvalError::Component { .. }));
    assert_eq!(err.span().start, 6);
}

#[test]
fn test_unknown_tag_never_errors() {
    let tree = render("<FooWidget size={2}>\ninside\n</FooWidget>");
    match &tree.nodes[0] {
        VNode::Unknown {
            name,
            props,
            children,
            fallback,
        } => {
            assert_eq!(name, "FooWidget");
            assert_eq!(props.get("size"), Some(&Value::Number(2.0)));
            assert_eq!(children.len(), 1);
            assert_eq!(*fallback, UnknownTagFallback::Label);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unknown_lowercase_tag() {
    let tree = render("Text with <blink>old</blink> markup");
    let paragraph = output(&tree.nodes[0]);
    assert!(matches!(&paragraph.children()[1], VNode::Unknown { name, .. } if name == "blink"));
}

#[test]
fn test_fallback_policy_is_recorded() {
    let tree = render_with(
        "<Mystery />",
        &ComponentRegistry::with_builtins(),
        UnknownTagFallback::Hidden,
    )
    .unwrap();
    assert!(matches!(
        &tree.nodes[0],
        VNode::Unknown { fallback: UnknownTagFallback::Hidden, .. }
    ));
}

#[test]
fn test_html_elements_in_source() {
    let tree = render("<div className=\"note\" hidden>\nText\n</div>");
    match &tree.nodes[0] {
        VNode::Element { tag, attributes, .. } => {
            assert_eq!(tag, "div");
            assert_eq!(attributes.get("class").map(String::as_str), Some("note"));
            assert_eq!(attributes.get("hidden").map(String::as_str), Some(""));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_custom_component_renders_after_registration() {
    let registry = ComponentRegistry::with_builtins();
    let source = "<PricingTable plan=\"pro\" />";

    let before = render_with(source, &registry, UnknownTagFallback::Label).unwrap();
    assert!(matches!(before.nodes[0], VNode::Unknown { .. }));

    registry
        .register_custom(&CustomComponentSpec {
            name: "PricingTable".to_string(),
            label: "Pricing table".to_string(),
            template: source.to_string(),
            description: None,
        })
        .unwrap();

    let after = render_with(source, &registry, UnknownTagFallback::Label).unwrap();
    let rendered = output(&after.nodes[0]);
    assert_eq!(rendered.attribute("data-plan"), Some("pro"));
}

#[test]
fn test_registry_override_of_markdown_element() {
    let registry = ComponentRegistry::empty();
    registry
        .register(ComponentDescriptor::new("p", |_: &Props, children: Vec<VNode>| -> Result<VNode, RenderError> {
            Ok(VNode::element("section").with_children(children))
        }))
        .unwrap();

    let tree = render_with("Plain", &registry, UnknownTagFallback::Label).unwrap();
    assert!(matches!(output(&tree.nodes[0]), VNode::Element { tag, .. } if tag == "section"));
}

#[test]
fn test_empty_registry_renders_plain_html() {
    let tree = render_with("# Title", &ComponentRegistry::empty(), UnknownTagFallback::Label).unwrap();
    match &tree.nodes[0] {
        VNode::Element { tag, attributes, .. } => {
            assert_eq!(tag, "h1");
            assert_eq!(attributes.get("id").map(String::as_str), Some("title"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_tabs_with_nested_tab_components() {
    let source = "<Tabs>\n  <Tab label=\"npm\">\n    npm install\n  </Tab>\n  <Tab label=\"yarn\">\n    yarn add\n  </Tab>\n</Tabs>";
    let tree = render(source);
    let tabs = output(&tree.nodes[0]);
    let labels: Vec<String> = tabs.children()[0]
        .children()
        .iter()
        .map(VNode::text_content)
        .collect();
    assert_eq!(labels, vec!["npm".to_string(), "yarn".to_string()]);
}

#[test]
fn test_instantiation_is_deterministic() {
    let source = "export const n = 3\n\n# Title\n\n<Steps>\n<Step title=\"One\">\nFirst {n}\n</Step>\n</Steps>\n\n- a\n- b";
    let registry = ComponentRegistry::with_builtins();
    let compiled = module(source);

    let results: Vec<DocumentTree> = (0..5)
        .map(|_| instantiate(&compiled, &registry.snapshot(), UnknownTagFallback::Label).unwrap())
        .collect();
    for result in &results[1..] {
        assert_eq!(&results[0], result);
    }
}

#[test]
fn test_empty_document() {
    assert!(render("").is_empty());
}

fn node_count(tree: &DocumentTree) -> usize {
    let mut count = 0;
    tree.walk(&mut |_| count += 1);
    count
}

#[test]
fn test_nested_components_grow_linearly() {
    let nested = |depth: usize| {
        let source = format!("{}x\n{}", "<Card>\n".repeat(depth), "</Card>\n".repeat(depth));
        node_count(&render(&source))
    };

    let base = nested(1);
    let per_level = nested(2) - base;
    for depth in [4, 16, 64] {
        assert_eq!(nested(depth), base + per_level * (depth - 1), "depth {}", depth);
    }

    let inline = |depth: usize| {
        let source = format!("{}x{}", "<Badge>".repeat(depth), "</Badge>".repeat(depth));
        node_count(&render(&source))
    };
    let per_level = inline(2) - inline(1);
    assert_eq!(inline(40), inline(1) + per_level * 39);
}
