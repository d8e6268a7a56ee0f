use super::read_source;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livemark_parser::{extract_headings, TocEntry};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TocArgs {
    /// Document to read headings from
    pub file: PathBuf,

    /// Print entries as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn toc(args: TocArgs) -> Result<()> {
    let source = read_source(&args.file)?;
    let entries = extract_headings(&source);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No headings found".dimmed());
        return Ok(());
    }

    print!("{}", format_toc(&entries));
    Ok(())
}

pub fn format_toc(entries: &[TocEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
            format!("{}- {} {}\n", indent, entry.text, format!("#{}", entry.id).dimmed())
        })
        .collect()
}
