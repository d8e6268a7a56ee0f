use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Component props, ordered by name so trees compare and serialize stably
pub type Props = BTreeMap<String, Value>;

/// How a render surface shows a tag that matched no registry entry and is not
/// an HTML element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTagFallback {
    /// Visible placeholder naming the tag, children rendered inside it
    #[default]
    Label,
    /// Children only, as if the tag were a fragment
    Children,
    /// Nothing at all
    Hidden,
}

/// Render-ready document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// HTML element
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<VNode>,
    },

    /// Text node
    Text { content: String },

    /// Invocation of a registered component. The evaluated children are moved
    /// into `output` by the renderer and are not kept separately.
    Component {
        name: String,
        props: Props,
        output: Box<VNode>,
    },

    /// Tag with no registry entry
    Unknown {
        name: String,
        props: Props,
        children: Vec<VNode>,
        fallback: UnknownTagFallback,
    },

    Fragment { children: Vec<VNode> },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Element whose attributes are converted from component props
    pub fn element_with_props(tag: impl Into<String>, props: &Props) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: attributes_from_props(props),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn fragment(children: Vec<VNode>) -> Self {
        VNode::Fragment { children }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Append to the `class` attribute
    pub fn with_class(mut self, class: impl AsRef<str>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            let class = class.as_ref();
            attributes
                .entry("class".to_string())
                .and_modify(|existing| {
                    existing.push(' ');
                    existing.push_str(class);
                })
                .or_insert_with(|| class.to_string());
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        }
        | VNode::Fragment {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element {
            ref mut children, ..
        }
        | VNode::Fragment {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            _ => None,
        }
    }

    /// Child nodes; a component's only child is its rendered output
    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Component { output, .. } => std::slice::from_ref(output.as_ref()),
            VNode::Element { children, .. }
            | VNode::Unknown { children, .. }
            | VNode::Fragment { children } => children,
            VNode::Text { .. } => &[],
        }
    }

    /// Text content as it would appear on screen. Components contribute their
    /// rendered output, unknown tags their children.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            VNode::Text { content } => out.push_str(content),
            other => {
                for child in other.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Whether this is a text node holding only whitespace
    pub fn is_blank_text(&self) -> bool {
        matches!(self, VNode::Text { content } if content.trim().is_empty())
    }
}

/// Convert props to HTML attributes. `className` becomes `class`, style
/// objects become declarations, `true` becomes an empty (present) attribute and
/// `false`/`null`/`undefined` are dropped.
pub fn attributes_from_props(props: &Props) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for (name, value) in props {
        let name = match name.as_str() {
            "className" => "class",
            "htmlFor" => "for",
            "children" => continue,
            other => other,
        };
        let rendered = match value {
            Value::Boolean(false) | Value::Null | Value::Undefined => continue,
            Value::Boolean(true) => String::new(),
            Value::Object(map) if name == "style" => style_declarations(map),
            other => other.to_string(),
        };
        attributes.insert(name.to_string(), rendered);
    }
    attributes
}

fn style_declarations(map: &BTreeMap<String, Value>) -> String {
    map.iter()
        .filter(|(_, value)| !value.is_nullish())
        .map(|(key, value)| format!("{}: {}", kebab_case(key), value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// `gridTemplateColumns` -> `grid-template-columns`
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Render-ready document: the root nodes in source order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentTree {
    pub nodes: Vec<VNode>,
}

impl DocumentTree {
    pub fn new(nodes: Vec<VNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first visit of every node, including component outputs
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a VNode)) {
        fn walk_node<'a>(node: &'a VNode, visit: &mut impl FnMut(&'a VNode)) {
            visit(node);
            for child in node.children() {
                walk_node(child, visit);
            }
        }

        for node in &self.nodes {
            walk_node(node, visit);
        }
    }

    /// Names of every tag that fell back to an `Unknown` node
    pub fn unknown_tags(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.walk(&mut |node| {
            if let VNode::Unknown { name, .. } = node {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        });
        names
    }
}
