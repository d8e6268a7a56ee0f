//! Built-in components and markdown element overrides

use crate::registry::{ComponentDescriptor, RenderComponent, RenderError};
use crate::value::Value;
use crate::vdom::{kebab_case, Props, VNode};

const CALLOUT_TYPES: [&str; 5] = ["info", "warning", "error", "success", "tip"];
const BADGE_VARIANTS: [&str; 4] = ["default", "success", "warning", "error"];
const ICON_NAMES: [&str; 5] = ["zap", "star", "info", "check", "external"];

/// Every built-in descriptor, in registration order
pub fn descriptors() -> Vec<ComponentDescriptor> {
    let mut all = vec![
        ComponentDescriptor::new("Callout", Callout)
            .with_description("Highlighted note: info, warning, error, success or tip"),
        ComponentDescriptor::new("Card", Card).with_description("Boxed content with optional link"),
        ComponentDescriptor::new("CardGroup", CardGroup)
            .with_label("Card group")
            .with_description("Grid of cards"),
        ComponentDescriptor::new("CodeBlock", CodeBlock)
            .with_label("Code block")
            .with_description("Code with a language and optional filename"),
        ComponentDescriptor::new("Tabs", Tabs).with_description("Tabbed panels; the first tab is active"),
        ComponentDescriptor::new("Tab", Tab).with_description("One panel of <Tabs>"),
        ComponentDescriptor::new("Steps", Steps).with_description("Numbered sequence of steps"),
        ComponentDescriptor::new("Step", Step).with_description("One step of <Steps>"),
        ComponentDescriptor::new("Accordion", Accordion).with_description("Collapsible section"),
        ComponentDescriptor::new("Badge", Badge).with_description("Inline status label"),
        ComponentDescriptor::new("Icon", Icon).with_description("Inline icon"),
    ];

    for tag in ["h1", "h2", "h3", "h4", "p", "ul", "ol", "li", "blockquote", "th", "td", "hr"] {
        all.push(ComponentDescriptor::new(tag, Prose { tag }).with_description("Markdown element"));
    }
    all.push(ComponentDescriptor::new("table", ProseTable).with_description("Markdown table"));
    all.push(ComponentDescriptor::new("a", ProseLink).with_description("Link opening in a new tab"));

    all
}

fn prop_text(props: &Props, name: &str) -> Option<String> {
    props.get(name).and_then(Value::as_text)
}

fn prop_flag(props: &Props, name: &str) -> bool {
    props
        .get(name)
        .map(|value| value.as_bool().unwrap_or_else(|| value.is_truthy()))
        .unwrap_or(false)
}

/// A string prop restricted to a closed set of values
fn prop_choice(
    component: &str,
    props: &Props,
    name: &str,
    allowed: &[&str],
    default: &str,
) -> Result<String, RenderError> {
    let Some(value) = props.get(name) else {
        return Ok(default.to_string());
    };
    match value.as_text() {
        Some(text) if allowed.contains(&text.as_str()) => Ok(text),
        _ => Err(RenderError::invalid_prop(
            component,
            name,
            format!("expected one of {}, got `{}`", allowed.join(", "), value),
        )),
    }
}

/// A prop that must be a positive whole number
fn prop_count(component: &str, props: &Props, name: &str, default: u32) -> Result<u32, RenderError> {
    let Some(value) = props.get(name) else {
        return Ok(default);
    };
    match value.as_number() {
        Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(n as u32),
        _ => Err(RenderError::invalid_prop(
            component,
            name,
            format!("expected a positive whole number, got `{}`", value),
        )),
    }
}

/// Variant class: `("callout", "warning")` -> `callout-warning`
fn modifier(base: &str, variant: &str) -> String {
    format!("{}-{}", base, variant)
}

/// Icon placeholder; the render surface decides how to draw `data-icon`
fn glyph(name: &str, size: u32) -> VNode {
    VNode::element("span")
        .with_class("glyph")
        .with_attr("data-icon", name)
        .with_attr("data-size", size.to_string())
        .with_attr("aria-hidden", "true")
}

fn content_children(children: Vec<VNode>) -> Vec<VNode> {
    children.into_iter().filter(|child| !child.is_blank_text()).collect()
}

struct Callout;

impl RenderComponent for Callout {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let kind = prop_choice("Callout", props, "type", &CALLOUT_TYPES, "info")?;
        let icon = match kind.as_str() {
            "warning" => "alert-triangle",
            "error" => "alert-circle",
            "success" => "check-circle",
            "tip" => "lightbulb",
            _ => "info",
        };

        let mut content = VNode::element("div").with_class("callout-content");
        if let Some(title) = prop_text(props, "title").filter(|t| !t.is_empty()) {
            content = content.with_child(
                VNode::element("div")
                    .with_class("callout-title")
                    .with_child(VNode::text(title)),
            );
        }
        content = content.with_child(
            VNode::element("div")
                .with_class("callout-body")
                .with_children(children),
        );

        Ok(VNode::element("div")
            .with_class("callout")
            .with_class(modifier("callout", &kind))
            .with_child(
                VNode::element("div")
                    .with_class("callout-icon")
                    .with_child(glyph(icon, 20)),
            )
            .with_child(content))
    }
}

struct Card;

impl RenderComponent for Card {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let href = prop_text(props, "href").filter(|h| !h.is_empty());

        let mut card = VNode::element("div").with_class("card");
        if let Some(icon) = prop_text(props, "icon").filter(|i| !i.is_empty()) {
            card = card.with_child(
                VNode::element("div")
                    .with_class("card-icon")
                    .with_child(VNode::text(icon)),
            );
        }

        let mut content = VNode::element("div").with_class("card-content");
        if let Some(title) = prop_text(props, "title").filter(|t| !t.is_empty()) {
            content = content.with_child(
                VNode::element("h3")
                    .with_class("card-title")
                    .with_child(VNode::text(title)),
            );
        }
        content = content.with_child(
            VNode::element("div")
                .with_class("card-body")
                .with_children(children),
        );
        card = card.with_child(content);

        let Some(href) = href else {
            return Ok(card);
        };

        card = card.with_child(glyph("arrow-right", 16).with_class("card-arrow"));
        Ok(VNode::element("a")
            .with_class("card-link")
            .with_attr("href", href)
            .with_attr("target", "_blank")
            .with_attr("rel", "noopener noreferrer")
            .with_child(card))
    }
}

struct CardGroup;

impl RenderComponent for CardGroup {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let cols = prop_count("CardGroup", props, "cols", 2)?;
        Ok(VNode::element("div")
            .with_class("card-group")
            .with_attr("style", format!("grid-template-columns: repeat({}, 1fr)", cols))
            .with_children(content_children(children)))
    }
}

struct CodeBlock;

impl RenderComponent for CodeBlock {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let language = prop_text(props, "language").unwrap_or_else(|| "typescript".to_string());
        let code: String = children.iter().map(VNode::text_content).collect();

        let mut block = VNode::element("div").with_class("code-block");
        if let Some(filename) = prop_text(props, "filename").filter(|f| !f.is_empty()) {
            block = block.with_child(
                VNode::element("div").with_class("code-header").with_child(
                    VNode::element("span")
                        .with_class("code-filename")
                        .with_child(VNode::text(filename)),
                ),
            );
        }

        Ok(block.with_child(
            VNode::element("pre").with_attr("data-language", language.clone()).with_child(
                VNode::element("code")
                    .with_class(format!("language-{}", language))
                    .with_child(VNode::text(code.trim())),
            ),
        ))
    }
}

struct Tabs;

impl RenderComponent for Tabs {
    fn render(&self, _props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let tabs = content_children(children);

        let mut list = VNode::element("div")
            .with_class("tab-list")
            .with_attr("role", "tablist");
        let mut panels = VNode::element("div").with_class("tab-content");

        for (index, tab) in tabs.into_iter().enumerate() {
            let label = match &tab {
                VNode::Component { props, .. } => prop_text(props, "label").unwrap_or_default(),
                _ => String::new(),
            };

            let mut button = VNode::element("button")
                .with_class("tab-button")
                .with_attr("role", "tab")
                .with_child(VNode::text(label));
            let mut panel = VNode::element("div")
                .with_class("tab-panel")
                .with_attr("role", "tabpanel")
                .with_child(tab);
            if index == 0 {
                button = button
                    .with_class("tab-button-active")
                    .with_attr("aria-selected", "true");
            } else {
                panel = panel.with_attr("hidden", "");
            }

            list = list.with_child(button);
            panels = panels.with_child(panel);
        }

        Ok(VNode::element("div")
            .with_class("tabs")
            .with_child(list)
            .with_child(panels))
    }
}

struct Tab;

impl RenderComponent for Tab {
    fn render(&self, _props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        Ok(VNode::element("div").with_class("tab").with_children(children))
    }
}

struct Steps;

impl RenderComponent for Steps {
    fn render(&self, _props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let items = content_children(children)
            .into_iter()
            .enumerate()
            .map(|(index, step)| {
                VNode::element("div")
                    .with_class("step-item")
                    .with_child(
                        VNode::element("div")
                            .with_class("step-number")
                            .with_child(VNode::text((index + 1).to_string())),
                    )
                    .with_child(VNode::element("div").with_class("step-body").with_child(step))
            })
            .collect();

        Ok(VNode::element("div").with_class("steps").with_children(items))
    }
}

struct Step;

impl RenderComponent for Step {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let title = prop_text(props, "title").unwrap_or_default();
        Ok(VNode::element("div")
            .with_class("step")
            .with_child(
                VNode::element("div")
                    .with_class("step-title")
                    .with_child(VNode::text(title)),
            )
            .with_child(
                VNode::element("div")
                    .with_class("step-content")
                    .with_children(children),
            ))
    }
}

struct Accordion;

impl RenderComponent for Accordion {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let title = prop_text(props, "title").unwrap_or_default();
        let open = prop_flag(props, "defaultOpen");

        let mut icon = glyph("arrow-right", 16).with_class("accordion-icon");
        if open {
            icon = icon.with_class("accordion-icon-open");
        }

        let mut accordion = VNode::element("div").with_class("accordion").with_child(
            VNode::element("button")
                .with_class("accordion-header")
                .with_attr("aria-expanded", open.to_string())
                .with_child(VNode::element("span").with_child(VNode::text(title)))
                .with_child(icon),
        );
        if open {
            accordion = accordion.with_child(
                VNode::element("div")
                    .with_class("accordion-content")
                    .with_children(children),
            );
        }
        Ok(accordion)
    }
}

struct Badge;

impl RenderComponent for Badge {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let variant = prop_choice("Badge", props, "variant", &BADGE_VARIANTS, "default")?;
        Ok(VNode::element("span")
            .with_class("badge")
            .with_class(modifier("badge", &variant))
            .with_children(children))
    }
}

struct Icon;

impl RenderComponent for Icon {
    fn render(&self, props: &Props, _children: Vec<VNode>) -> Result<VNode, RenderError> {
        if !props.contains_key("name") {
            return Err(RenderError::invalid_prop(
                "Icon",
                "name",
                format!("required, one of {}", ICON_NAMES.join(", ")),
            ));
        }
        let name = prop_choice("Icon", props, "name", &ICON_NAMES, "info")?;
        let size = prop_count("Icon", props, "size", 16)?;
        let glyph_name = match name.as_str() {
            "check" => "check-circle",
            "external" => "external-link",
            other => other,
        };
        Ok(VNode::element("span")
            .with_class("icon")
            .with_child(glyph(glyph_name, size)))
    }
}

/// Markdown element with a styling class; the element's own props pass through
struct Prose {
    tag: &'static str,
}

impl RenderComponent for Prose {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        Ok(VNode::element_with_props(self.tag, props)
            .with_class(format!("md-{}", self.tag))
            .with_children(children))
    }
}

struct ProseTable;

impl RenderComponent for ProseTable {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        Ok(VNode::element("div").with_class("md-table-wrapper").with_child(
            VNode::element_with_props("table", props)
                .with_class("md-table")
                .with_children(children),
        ))
    }
}

struct ProseLink;

impl RenderComponent for ProseLink {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        Ok(VNode::element_with_props("a", props)
            .with_class("md-link")
            .with_attr("target", "_blank")
            .with_attr("rel", "noopener noreferrer")
            .with_children(children)
            .with_child(glyph("external-link", 12).with_class("md-link-icon")))
    }
}

/// Generic container for user-registered components: the props become
/// `data-*` attributes so the render surface can still show what was passed
pub struct CustomContainer {
    name: String,
}

impl CustomContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl RenderComponent for CustomContainer {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<VNode, RenderError> {
        let mut node = VNode::element("div")
            .with_class("custom-component")
            .with_attr("data-component", self.name.clone());

        for (name, value) in props {
            let rendered = match value {
                Value::Null | Value::Undefined | Value::Boolean(false) => continue,
                Value::Boolean(true) => String::new(),
                Value::Array(_) | Value::Object(_) => value.to_json(),
                other => other.to_string(),
            };
            node = node.with_attr(format!("data-{}", kebab_case(name)), rendered);
        }

        Ok(node.with_children(children))
    }
}
