//! Compile a parsed document into an executable module
//!
//! Markdown nodes become element ops named after the HTML tag they produce, so
//! a registry entry for `h1` or `a` overrides them exactly like a component.
//! Every `{...}` region is parsed here; instantiation never sees raw source.

use crate::value::Value;
use livemark_parser::{
    parse_exports, parse_expression, slugify, AttributeValue, Block, ComponentNode, Document,
    ExportDecl, Expression, Inline, ListItem, ParseError, Span,
};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModuleError {
    /// Malformed `{...}` expression
    #[error("{0}")]
    Expression(ParseError),

    /// Export block that is not `export const name = expr`
    #[error("{0}")]
    Export(ParseError),

    #[error("Attribute `{name}` has an empty expression")]
    EmptyAttribute { name: String, span: Span },

    #[error("Identifier '{name}' has already been declared")]
    DuplicateExport { name: String, span: Span },
}

impl ModuleError {
    pub fn span(&self) -> Span {
        match self {
            ModuleError::Expression(err) | ModuleError::Export(err) => err.span(),
            ModuleError::EmptyAttribute { span, .. } | ModuleError::DuplicateExport { span, .. } => {
                *span
            }
        }
    }
}

pub type ModuleResult<T> = Result<T, ModuleError>;

/// Executable form of a document
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompiledModule {
    /// `export const` bindings in declaration order
    pub exports: Vec<ExportDecl>,
    pub body: Vec<Op>,
}

impl CompiledModule {
    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.body.is_empty()
    }

    /// Number of ops in the body, counting nested ones
    pub fn op_count(&self) -> usize {
        fn count(ops: &[Op]) -> usize {
            ops.iter()
                .map(|op| match op {
                    Op::Element { children, .. } => 1 + count(children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum Op {
    /// Render `tag` (registry entry, HTML element or unknown) with props and children
    Element {
        tag: String,
        props: Vec<PropOp>,
        children: Vec<Op>,
        span: Span,
    },

    Text { value: String },

    /// Interpolated `{...}`
    Expression { expression: Expression },
}

impl Op {
    fn element(tag: impl Into<String>, span: Span) -> Self {
        Op::Element {
            tag: tag.into(),
            props: Vec::new(),
            children: Vec::new(),
            span,
        }
    }

    fn with_prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        if let Op::Element { ref mut props, .. } = self {
            props.push(PropOp {
                name: name.to_string(),
                value: PropValue::Static(value.into()),
            });
        }
        self
    }

    fn with_children(mut self, new_children: Vec<Op>) -> Self {
        if let Op::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    fn text(value: impl Into<String>) -> Self {
        Op::Text {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropOp {
    pub name: String,
    pub value: PropValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum PropValue {
    Static(Value),
    Dynamic(Expression),
}

/// Compile `document`, parsed from `source`, into a module
#[instrument(skip_all, fields(blocks = document.children.len()))]
pub fn compile_module(document: &Document, source: &str) -> ModuleResult<CompiledModule> {
    let mut compiler = ModuleCompiler {
        source,
        exports: Vec::new(),
    };
    let body = compiler.compile_blocks(&document.children, false)?;

    let mut seen = HashSet::new();
    for export in &compiler.exports {
        if !seen.insert(export.name.as_str()) {
            return Err(ModuleError::DuplicateExport {
                name: export.name.clone(),
                span: export.span,
            });
        }
    }

    let module = CompiledModule {
        exports: compiler.exports,
        body,
    };
    debug!(
        exports = module.exports.len(),
        ops = module.op_count(),
        "Compiled module"
    );
    Ok(module)
}

struct ModuleCompiler<'a> {
    source: &'a str,
    exports: Vec<ExportDecl>,
}

impl<'a> ModuleCompiler<'a> {
    /// `tight` unwraps paragraphs, as list items of a tight list render them
    fn compile_blocks(&mut self, blocks: &[Block], tight: bool) -> ModuleResult<Vec<Op>> {
        let mut ops = Vec::with_capacity(blocks.len());
        for block in blocks {
            match block {
                Block::Paragraph { children, .. } if tight => {
                    ops.extend(self.compile_inlines(children)?);
                }
                other => {
                    if let Some(op) = self.compile_block(other)? {
                        ops.push(op);
                    }
                }
            }
        }
        Ok(ops)
    }

    fn compile_block(&mut self, block: &Block) -> ModuleResult<Option<Op>> {
        let op = match block {
            Block::Heading {
                depth,
                children,
                span,
            } => Op::element(format!("h{}", depth), *span)
                .with_prop("id", self.heading_id(children, *span))
                .with_children(self.compile_inlines(children)?),

            Block::Paragraph { children, span } => {
                Op::element("p", *span).with_children(self.compile_inlines(children)?)
            }

            Block::List {
                ordered,
                start,
                spread,
                items,
                span,
            } => {
                let mut list = Op::element(if *ordered { "ol" } else { "ul" }, *span);
                if let (true, Some(start)) = (*ordered, *start) {
                    if start != 1 {
                        list = list.with_prop("start", start as f64);
                    }
                }
                let items = items
                    .iter()
                    .map(|item| self.compile_list_item(item, !*spread))
                    .collect::<ModuleResult<Vec<_>>>()?;
                list.with_children(items)
            }

            Block::BlockQuote { children, span } => {
                Op::element("blockquote", *span).with_children(self.compile_blocks(children, false)?)
            }

            Block::Code {
                lang, value, span, ..
            } => {
                let mut code = Op::element("code", *span);
                if let Some(lang) = lang {
                    code = code.with_prop("className", format!("language-{}", lang));
                }
                Op::element("pre", *span).with_children(vec![code.with_children(vec![Op::text(value.clone())])])
            }

            Block::Table {
                align,
                head,
                rows,
                span,
            } => {
                let header = self.compile_row("th", head, align, *span)?;
                let mut table = Op::element("table", *span)
                    .with_children(vec![Op::element("thead", *span).with_children(vec![header])]);
                if !rows.is_empty() {
                    let body = rows
                        .iter()
                        .map(|row| self.compile_row("td", row, align, *span))
                        .collect::<ModuleResult<Vec<_>>>()?;
                    table = table.with_children(vec![Op::element("tbody", *span).with_children(body)]);
                }
                table
            }

            Block::ThematicBreak { span } => Op::element("hr", *span),

            Block::Export { source, span } => {
                let decls = parse_exports(source, span.start).map_err(ModuleError::Export)?;
                self.exports.extend(decls);
                return Ok(None);
            }

            Block::Expression { source, span } => {
                return self.compile_expression(source, span.start + 1);
            }

            Block::Component(node) => {
                let children = self.compile_blocks(&node.children, false)?;
                self.compile_component(node, children)?
            }
        };
        Ok(Some(op))
    }

    fn compile_list_item(&mut self, item: &ListItem, tight: bool) -> ModuleResult<Op> {
        Ok(Op::element("li", item.span).with_children(self.compile_blocks(&item.children, tight)?))
    }

    fn compile_row(
        &mut self,
        cell_tag: &str,
        cells: &[Vec<Inline>],
        align: &[livemark_parser::Alignment],
        span: Span,
    ) -> ModuleResult<Op> {
        let mut row = Vec::with_capacity(cells.len());
        for (index, cell) in cells.iter().enumerate() {
            let mut op = Op::element(cell_tag, span);
            if let Some(alignment) = align.get(index).and_then(|a| a.as_str()) {
                op = op.with_prop("align", alignment);
            }
            row.push(op.with_children(self.compile_inlines(cell)?));
        }
        Ok(Op::element("tr", span).with_children(row))
    }

    fn compile_inlines(&mut self, inlines: &[Inline]) -> ModuleResult<Vec<Op>> {
        let mut ops = Vec::with_capacity(inlines.len());
        for inline in inlines {
            if let Some(op) = self.compile_inline(inline)? {
                ops.push(op);
            }
        }
        Ok(ops)
    }

    fn compile_inline(&mut self, inline: &Inline) -> ModuleResult<Option<Op>> {
        let op = match inline {
            Inline::Text { value, .. } => Op::text(value.clone()),
            Inline::Emphasis { children, span } => {
                Op::element("em", *span).with_children(self.compile_inlines(children)?)
            }
            Inline::Strong { children, span } => {
                Op::element("strong", *span).with_children(self.compile_inlines(children)?)
            }
            Inline::Delete { children, span } => {
                Op::element("del", *span).with_children(self.compile_inlines(children)?)
            }
            Inline::Code { value, span } => {
                Op::element("code", *span).with_children(vec![Op::text(value.clone())])
            }
            Inline::Link {
                href,
                title,
                children,
                span,
            } => {
                let mut link = Op::element("a", *span).with_prop("href", href.as_str());
                if let Some(title) = title {
                    link = link.with_prop("title", title.as_str());
                }
                link.with_children(self.compile_inlines(children)?)
            }
            Inline::Image {
                src,
                alt,
                title,
                span,
            } => {
                let mut image = Op::element("img", *span)
                    .with_prop("src", src.as_str())
                    .with_prop("alt", alt.as_str());
                if let Some(title) = title {
                    image = image.with_prop("title", title.as_str());
                }
                image
            }
            Inline::Break { span } => Op::element("br", *span),
            Inline::Expression { source, span } => {
                return self.compile_expression(source, span.start + 1);
            }
            Inline::Component(node) => {
                let children = self.compile_inlines(&node.children)?;
                self.compile_component(node, children)?
            }
        };
        Ok(Some(op))
    }

    fn compile_component<C>(&mut self, node: &ComponentNode<C>, children: Vec<Op>) -> ModuleResult<Op> {
        let mut props = Vec::with_capacity(node.attributes.len());
        for attribute in &node.attributes {
            let value = match &attribute.value {
                AttributeValue::Flag => PropValue::Static(Value::Boolean(true)),
                AttributeValue::Literal { value } => PropValue::Static(Value::String(value.clone())),
                AttributeValue::Expression { source, offset } => {
                    match parse_expression(source, *offset).map_err(ModuleError::Expression)? {
                        Some(expression) => PropValue::Dynamic(expression),
                        None => {
                            return Err(ModuleError::EmptyAttribute {
                                name: attribute.name.clone(),
                                span: attribute.span,
                            })
                        }
                    }
                }
            };
            props.push(PropOp {
                name: attribute.name.clone(),
                value,
            });
        }

        Ok(Op::Element {
            tag: node.name.clone(),
            props,
            children,
            span: node.span,
        })
    }

    /// Comment-only expressions (`{/* note */}`) compile to nothing
    fn compile_expression(&mut self, source: &str, offset: usize) -> ModuleResult<Option<Op>> {
        Ok(parse_expression(source, offset)
            .map_err(ModuleError::Expression)?
            .map(|expression| Op::Expression { expression }))
    }

    /// Slug of the heading text as written on its source line, so that ids
    /// agree with the table of contents
    fn heading_id(&self, children: &[Inline], span: Span) -> String {
        let line = self
            .source
            .get(span.start..span.end)
            .and_then(|text| text.lines().next())
            .filter(|line| line.starts_with('#'));

        match line {
            Some(line) => slugify(line.trim_start_matches('#').trim()),
            None => slugify(&heading_text(children)),
        }
    }
}

/// Heading text with expressions kept as written (`{name}`)
fn heading_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text { value, .. } | Inline::Code { value, .. } => out.push_str(value),
            Inline::Emphasis { children, .. }
            | Inline::Strong { children, .. }
            | Inline::Delete { children, .. }
            | Inline::Link { children, .. } => out.push_str(&heading_text(children)),
            Inline::Component(node) => out.push_str(&heading_text(&node.children)),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::Break { .. } => out.push(' '),
            Inline::Expression { source, .. } => {
                out.push('{');
                out.push_str(source);
                out.push('}');
            }
        }
    }
    out
}
