use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livemark_evaluator::{ComponentOrigin, ComponentRegistry};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct ComponentsArgs {
    /// Print the registry as JSON
    #[arg(long)]
    pub json: bool,

    /// Include markdown element overrides (h1, p, a, ...)
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct ComponentSummary {
    name: String,
    label: String,
    origin: ComponentOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

pub fn components(args: ComponentsArgs, config: Config) -> Result<()> {
    let registry = config.registry()?;
    let summaries = summarize(&registry, args.all);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("{}", "📦 Registered components".bright_blue().bold());
    for summary in &summaries {
        let origin = match summary.origin {
            ComponentOrigin::BuiltIn => "built-in".dimmed(),
            ComponentOrigin::Custom => "custom".green(),
        };
        print!("  {:<14} {:<10}", summary.name.bold(), origin);
        match &summary.description {
            Some(description) => println!(" {}", description),
            None => println!(" {}", summary.label),
        }
    }
    println!();
    println!("{} components", summaries.len());

    Ok(())
}

/// Registry entries sorted by name. Markdown element overrides (lowercase
/// names) are left out unless `all` is set.
fn summarize(registry: &ComponentRegistry, all: bool) -> Vec<ComponentSummary> {
    let snapshot = registry.snapshot();
    snapshot
        .descriptors()
        .into_iter()
        .filter(|descriptor| all || !descriptor.name.starts_with(|c: char| c.is_ascii_lowercase()))
        .map(|descriptor| ComponentSummary {
            name: descriptor.name.clone(),
            label: descriptor.label.clone(),
            origin: descriptor.origin,
            description: descriptor.description.clone(),
        })
        .collect()
}
