use super::{format_compile_error, read_source, write_output};
use crate::config::{Config, UnknownTagsArg};
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use livemark_compiler_html::render_to_html;
use livemark_editor::Compiler;
use livemark_evaluator::{DocumentTree, Value, VNode};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented outline of the document tree
    Tree,
    /// Document tree as JSON
    Json,
    /// Rendered HTML
    Html,
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Document to compile
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "tree")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit a complete HTML page (html format only)
    #[arg(long)]
    pub standalone: bool,

    /// How tags without a registered component are shown (overrides config)
    #[arg(long, value_enum)]
    pub unknown_tags: Option<UnknownTagsArg>,
}

pub async fn compile(args: CompileArgs, config: Config) -> Result<()> {
    let source = read_source(&args.file)?;

    let mut config = config;
    if let Some(unknown_tags) = args.unknown_tags {
        config.unknown_tags = unknown_tags.into();
    }
    let pipeline = config.pipeline()?;

    let tree = match pipeline.compile(Arc::from(source.as_str())).await {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("{}", format_compile_error(&err, &args.file, &source));
            return Err(anyhow!("{} failed to compile", args.file.display()));
        }
    };
    info!(nodes = tree.nodes.len(), unknown = tree.unknown_tags().len(), "Compiled {}", args.file.display());

    let output = match args.format {
        OutputFormat::Tree => format_tree(&tree),
        OutputFormat::Json => serde_json::to_string_pretty(&tree)?,
        OutputFormat::Html => {
            let mut options = config.render.clone();
            options.standalone |= args.standalone;
            render_to_html(&tree, &options)
        }
    };

    match &args.out {
        Some(path) => {
            write_output(path, &output)?;
            println!("  {} {} → {}", "✓".green(), args.file.display(), path.display());
        }
        None => print!("{}", output),
    }

    for name in tree.unknown_tags() {
        eprintln!("  {} unknown component <{}>", "⚠️".yellow(), name.yellow());
    }

    Ok(())
}

/// Human-readable outline, one node per line
pub fn format_tree(tree: &DocumentTree) -> String {
    let mut out = String::new();
    for node in &tree.nodes {
        write_node(&mut out, node, 0);
    }
    out
}

fn write_node(out: &mut String, node: &VNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        VNode::Element {
            tag,
            attributes,
            children,
        } => {
            let attrs: String = attributes
                .iter()
                .map(|(key, value)| format!(" {}=\"{}\"", key, value))
                .collect();
            let _ = writeln!(out, "{}<{}{}>", indent, tag, attrs);
            for child in children {
                write_node(out, child, depth + 1);
            }
        }
        VNode::Text { content } => {
            let _ = writeln!(out, "{}{:?}", indent, content);
        }
        VNode::Component { name, props, output } => {
            let _ = writeln!(out, "{}{}{}", indent, name.cyan().bold(), format_props(props));
            write_node(out, output, depth + 1);
        }
        VNode::Unknown {
            name,
            props,
            children,
            ..
        } => {
            let _ = writeln!(
                out,
                "{}{}{} {}",
                indent,
                name.yellow().bold(),
                format_props(props),
                "(unknown)".dimmed()
            );
            for child in children {
                write_node(out, child, depth + 1);
            }
        }
        VNode::Fragment { children } => {
            for child in children {
                write_node(out, child, depth);
            }
        }
    }
}

fn format_props(props: &std::collections::BTreeMap<String, Value>) -> String {
    props
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!(" {}=\"{}\"", key, s),
            other => format!(" {}={{{}}}", key, other.to_json()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tree_outline() {
        colored::control::set_override(false);

        let tree = DocumentTree::new(vec![
            VNode::element("p").with_child(VNode::text("hello")),
            VNode::Unknown {
                name: "Widget".to_string(),
                props: [("size".to_string(), Value::Number(2.0))].into_iter().collect(),
                children: vec![],
                fallback: Default::default(),
            },
        ]);

        let outline = format_tree(&tree);
        assert_eq!(outline, "<p>\n  \"hello\"\nWidget size={2} (unknown)\n");
    }

    #[test]
    fn test_format_tree_shows_component_output() {
        colored::control::set_override(false);

        let tree = DocumentTree::new(vec![VNode::Component {
            name: "Badge".to_string(),
            props: Default::default(),
            output: Box::new(VNode::element("span").with_child(VNode::text("new"))),
        }]);

        assert_eq!(format_tree(&tree), "Badge\n  <span>\n    \"new\"\n");
    }
}
