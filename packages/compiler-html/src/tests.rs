use crate::{render_error_html, render_to_html, RenderOptions};
use livemark_evaluator::{
    compile_module, instantiate, ComponentRegistry, DocumentTree, UnknownTagFallback, VNode,
};
use livemark_parser::parse;

fn tree_with(source: &str, fallback: UnknownTagFallback) -> DocumentTree {
    let document = parse(source).expect("Failed to parse");
    let module = compile_module(&document, source).expect("Failed to compile");
    instantiate(&module, &ComponentRegistry::with_builtins().snapshot(), fallback)
        .expect("Failed to instantiate")
}

fn render(source: &str) -> String {
    let tree = tree_with(source, UnknownTagFallback::Label);
    render_to_html(&tree, &RenderOptions::default())
}

#[test]
fn test_render_heading_and_paragraph() {
    let html = render("# Hello World\n\nSome *text* here.");

    println!("Generated HTML:\n{}", html);

    assert!(html.contains("<h1 class=\"md-h1\" id=\"hello-world\">Hello World</h1>"));
    assert!(html.contains("<p class=\"md-p\">Some <em>text</em> here.</p>"));
    assert!(!html.contains("<!DOCTYPE html>"));
}

#[test]
fn test_render_escapes_text() {
    let html = render("Tom & Jerry say {\"<hi>\"}");

    assert!(html.contains("Tom &amp; Jerry say &lt;hi&gt;"));
    assert!(!html.contains("<hi>"));
}

#[test]
fn test_render_callout_component_output() {
    let html = render("<Callout type=\"warning\" title=\"Careful\">\n\nMind the gap.\n\n</Callout>");

    println!("Generated HTML:\n{}", html);

    assert!(html.contains("<div class=\"callout callout-warning\">"));
    assert!(html.contains("<div class=\"callout-title\">Careful</div>"));
    assert!(html.contains("Mind the gap."));
    assert!(html.contains("data-icon=\"alert-triangle\""));
}

#[test]
fn test_render_code_block_keeps_content_verbatim() {
    let html = render("```rust\nfn main() {\n    run();\n}\n```");

    println!("Generated HTML:\n{}", html);

    assert!(html.contains("<pre><code class=\"language-rust\">fn main() {\n    run();\n}"));
}

#[test]
fn test_render_void_elements() {
    let html = render("Line one\n\n---\n\n![Logo](/logo.png)");

    assert!(html.contains("<hr class=\"md-hr\" />"));
    assert!(html.contains("<img alt=\"Logo\" src=\"/logo.png\" />"));
    assert!(!html.contains("</hr>"));
    assert!(!html.contains("</img>"));
}

#[test]
fn test_render_unknown_tag_label() {
    let html = render("<Mystery kind=\"x\">\n\nInside\n\n</Mystery>");

    println!("Generated HTML:\n{}", html);

    assert!(html.contains("class=\"unknown-component\""));
    assert!(html.contains("data-component=\"Mystery\""));
    assert!(html.contains("&lt;Mystery&gt;"));
    assert!(html.contains("Inside"));
}

#[test]
fn test_render_inline_unknown_tag_stays_inline() {
    let html = render("Before <Shiny>glow</Shiny> after");

    assert!(html.contains("<span class=\"unknown-component\" data-component=\"Shiny\">"));
    assert!(!html.contains("<div class=\"unknown-component\""));
}

#[test]
fn test_render_unknown_tag_children_fallback() {
    let tree = tree_with("<Mystery>\n\nInside\n\n</Mystery>", UnknownTagFallback::Children);
    let html = render_to_html(&tree, &RenderOptions::default());

    assert!(html.contains("<p class=\"md-p\">Inside</p>"));
    assert!(!html.contains("Mystery"));
}

#[test]
fn test_render_unknown_tag_hidden_fallback() {
    let tree = tree_with("Visible\n\n<Mystery>\n\nSecret\n\n</Mystery>", UnknownTagFallback::Hidden);
    let html = render_to_html(&tree, &RenderOptions::default());

    assert!(html.contains("Visible"));
    assert!(!html.contains("Secret"));
    assert!(!html.contains("Mystery"));
}

#[test]
fn test_render_pretty_indents_block_children() {
    let html = render("- one\n- two");

    println!("Generated HTML:\n{}", html);

    assert!(html.contains("<ul class=\"md-ul\">\n  <li class=\"md-li\">one</li>\n  <li class=\"md-li\">two</li>\n</ul>"));
}

#[test]
fn test_render_compact() {
    let tree = tree_with("- one\n- two", UnknownTagFallback::Label);
    let options = RenderOptions {
        pretty: false,
        ..RenderOptions::default()
    };
    let html = render_to_html(&tree, &options);

    assert_eq!(html, "<ul class=\"md-ul\"><li class=\"md-li\">one</li><li class=\"md-li\">two</li></ul>");
}

#[test]
fn test_render_standalone_document() {
    let tree = tree_with("# Doc", UnknownTagFallback::Label);
    let options = RenderOptions {
        standalone: true,
        title: "Guide <draft>".to_string(),
        stylesheet: Some("preview.css".to_string()),
        ..RenderOptions::default()
    };
    let html = render_to_html(&tree, &options);

    println!("Generated HTML:\n{}", html);

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Guide &lt;draft&gt;</title>"));
    assert!(html.contains("<link rel=\"stylesheet\" href=\"preview.css\">"));
    assert!(html.contains("<article class=\"livemark-document\">"));
    assert!(html.contains("<h1 class=\"md-h1\" id=\"doc\">Doc</h1>"));
    assert!(html.trim_end().ends_with("</html>"));
}

#[test]
fn test_render_empty_tree() {
    let html = render_to_html(&DocumentTree::default(), &RenderOptions::default());
    assert!(html.is_empty());
}

#[test]
fn test_render_bare_boolean_attribute() {
    let tree = DocumentTree::new(vec![VNode::element("details")
        .with_attr("open", "")
        .with_child(VNode::text("More"))]);
    let html = render_to_html(&tree, &RenderOptions::default());

    assert_eq!(html, "<details open>More</details>\n");
}

#[test]
fn test_render_fragment_children() {
    let tree = DocumentTree::new(vec![VNode::fragment(vec![
        VNode::element("p").with_child(VNode::text("a")),
        VNode::element("p").with_child(VNode::text("b")),
    ])]);
    let html = render_to_html(&tree, &RenderOptions::default());

    assert_eq!(html, "<p>a</p>\n<p>b</p>\n");
}

#[test]
fn test_render_error_page() {
    let html = render_error_html("3:1: Unexpected <tag>", &RenderOptions::default());

    assert!(html.contains("class=\"compile-error\""));
    assert!(html.contains("3:1: Unexpected &lt;tag&gt;"));
}
