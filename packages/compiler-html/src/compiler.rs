use livemark_evaluator::{DocumentTree, UnknownTagFallback, VNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Options for HTML rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Wrap the output in a complete HTML document
    pub standalone: bool,
    /// `<title>` of a standalone document
    pub title: String,
    /// Stylesheet linked from a standalone document
    pub stylesheet: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            standalone: false,
            title: "Livemark preview".to_string(),
            stylesheet: None,
        }
    }
}

struct Context<'a> {
    options: &'a RenderOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        self.newline();
    }

    fn add_indent(&mut self) {
        if !self.options.pretty {
            return;
        }
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn newline(&mut self) {
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Render a document tree to HTML
pub fn render_to_html(tree: &DocumentTree, options: &RenderOptions) -> String {
    let mut resolved = Vec::with_capacity(tree.nodes.len());
    for node in &tree.nodes {
        resolve(node, &mut resolved);
    }
    debug!(roots = resolved.len(), "Rendering document tree to HTML");

    let mut ctx = Context::new(options);
    if options.standalone {
        open_document(&mut ctx);
    }

    // Root nodes always go on their own lines
    for node in &resolved {
        render_block(node, &mut ctx);
    }

    if options.standalone {
        close_document(&mut ctx);
    }
    ctx.get_output()
}

/// Render a compilation failure in place of the document
pub fn render_error_html(message: &str, options: &RenderOptions) -> String {
    let mut ctx = Context::new(options);
    if options.standalone {
        open_document(&mut ctx);
    }

    ctx.add_line("<div class=\"compile-error\" role=\"alert\">");
    ctx.indent();
    ctx.add_line("<strong class=\"compile-error-title\">Compilation failed</strong>");
    ctx.add_indent();
    ctx.add("<pre class=\"compile-error-message\">");
    ctx.add(&escape_html(message));
    ctx.add("</pre>");
    ctx.newline();
    ctx.dedent();
    ctx.add_line("</div>");

    if options.standalone {
        close_document(&mut ctx);
    }
    ctx.get_output()
}

fn open_document(ctx: &mut Context) {
    ctx.add_line("<!DOCTYPE html>");
    ctx.add_line("<html>");
    ctx.indent();

    ctx.add_line("<head>");
    ctx.indent();
    ctx.add_line("<meta charset=\"UTF-8\">");
    ctx.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    let title = format!("<title>{}</title>", escape_html(&ctx.options.title));
    ctx.add_line(&title);
    if let Some(href) = ctx.options.stylesheet.clone() {
        ctx.add_line(&format!("<link rel=\"stylesheet\" href=\"{}\">", escape_html(&href)));
    }
    ctx.dedent();
    ctx.add_line("</head>");

    ctx.add_line("<body>");
    ctx.indent();
    ctx.add_line("<article class=\"livemark-document\">");
    ctx.indent();
}

fn close_document(ctx: &mut Context) {
    ctx.dedent();
    ctx.add_line("</article>");
    ctx.dedent();
    ctx.add_line("</body>");
    ctx.dedent();
    ctx.add_line("</html>");
}

/// Reduce a node to plain elements and text: components are replaced by
/// their output, unknown tags by their fallback, fragments by their children
fn resolve(node: &VNode, out: &mut Vec<VNode>) {
    match node {
        VNode::Text { .. } => out.push(node.clone()),
        VNode::Element {
            tag,
            attributes,
            children,
        } => out.push(VNode::Element {
            tag: tag.clone(),
            attributes: attributes.clone(),
            children: resolve_all(children),
        }),
        VNode::Component { output, .. } => resolve(output, out),
        VNode::Fragment { children } => out.extend(resolve_all(children)),
        VNode::Unknown {
            name,
            children,
            fallback,
            ..
        } => match fallback {
            UnknownTagFallback::Label => out.push(unknown_label(name, resolve_all(children))),
            UnknownTagFallback::Children => out.extend(resolve_all(children)),
            UnknownTagFallback::Hidden => {}
        },
    }
}

fn resolve_all(children: &[VNode]) -> Vec<VNode> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        resolve(child, &mut out);
    }
    out
}

/// Placeholder for an unregistered tag. Inline content keeps it a `span` so
/// it stays valid inside paragraphs.
fn unknown_label(name: &str, children: Vec<VNode>) -> VNode {
    let wrapper = if children.iter().any(is_block) { "div" } else { "span" };
    VNode::element(wrapper)
        .with_class("unknown-component")
        .with_attr("data-component", name)
        .with_child(
            VNode::element("span")
                .with_class("unknown-component-label")
                .with_child(VNode::text(format!("<{}>", name))),
        )
        .with_children(children)
}

fn render_block(node: &VNode, ctx: &mut Context) {
    match node {
        VNode::Element {
            tag,
            attributes,
            children,
        } => {
            ctx.add_indent();
            open_tag(tag, attributes, ctx);

            if is_void(tag) {
                ctx.newline();
                return;
            }

            if ctx.options.pretty && has_block_layout(children) {
                ctx.newline();
                ctx.indent();
                for child in children {
                    render_block(child, ctx);
                }
                ctx.dedent();
                ctx.add_indent();
            } else {
                for child in children {
                    render_inline(child, ctx);
                }
            }

            ctx.add(&format!("</{}>", tag));
            ctx.newline();
        }
        VNode::Text { content } => {
            let text = escape_html(content);
            ctx.add_line(&text);
        }
        other => {
            ctx.add_indent();
            render_inline(other, ctx);
            ctx.newline();
        }
    }
}

fn render_inline(node: &VNode, ctx: &mut Context) {
    match node {
        VNode::Element {
            tag,
            attributes,
            children,
        } => {
            open_tag(tag, attributes, ctx);
            if is_void(tag) {
                return;
            }
            for child in children {
                render_inline(child, ctx);
            }
            ctx.add(&format!("</{}>", tag));
        }
        VNode::Text { content } => ctx.add(&escape_html(content)),
        VNode::Component { output, .. } => render_inline(output, ctx),
        VNode::Unknown { .. } | VNode::Fragment { .. } => {
            let mut resolved = Vec::new();
            resolve(node, &mut resolved);
            for child in &resolved {
                render_inline(child, ctx);
            }
        }
    }
}

fn open_tag(tag: &str, attributes: &BTreeMap<String, String>, ctx: &mut Context) {
    ctx.add("<");
    ctx.add(tag);
    for (name, value) in attributes {
        ctx.add(" ");
        ctx.add(name);
        if !value.is_empty() {
            ctx.add("=\"");
            ctx.add(&escape_html(value));
            ctx.add("\"");
        }
    }
    ctx.add(if is_void(tag) { " />" } else { ">" });
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "img"
            | "input"
            | "br"
            | "hr"
            | "meta"
            | "link"
            | "area"
            | "base"
            | "col"
            | "embed"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_block(node: &VNode) -> bool {
    match node {
        VNode::Element { tag, .. } => matches!(
            tag.as_str(),
            "address"
                | "article"
                | "aside"
                | "blockquote"
                | "details"
                | "dialog"
                | "div"
                | "dl"
                | "dt"
                | "dd"
                | "fieldset"
                | "figcaption"
                | "figure"
                | "footer"
                | "form"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "header"
                | "hgroup"
                | "hr"
                | "li"
                | "main"
                | "nav"
                | "ol"
                | "p"
                | "pre"
                | "section"
                | "summary"
                | "table"
                | "thead"
                | "tbody"
                | "tfoot"
                | "tr"
                | "th"
                | "td"
                | "ul"
        ),
        _ => false,
    }
}

/// Children go on their own lines only when every one of them is a block;
/// mixed content is kept on one line so no whitespace is introduced
fn has_block_layout(children: &[VNode]) -> bool {
    !children.is_empty() && children.iter().all(is_block)
}
