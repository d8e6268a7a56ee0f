use super::{read_source, write_output};
use crate::config::{Config, UnknownTagsArg};
use crate::watcher::FileWatcher;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livemark_compiler_html::{render_error_html, render_to_html, RenderOptions};
use livemark_editor::{CompileOutcome, PreviewState, Scheduler};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Document to watch
    pub file: PathBuf,

    /// Keep an HTML preview page up to date at this path
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Quiet period before an edit is compiled (overrides config)
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// How tags without a registered component are shown (overrides config)
    #[arg(long, value_enum)]
    pub unknown_tags: Option<UnknownTagsArg>,
}

pub async fn watch(args: WatchArgs, config: Config) -> Result<()> {
    let mut config = config;
    if let Some(debounce_ms) = args.debounce_ms {
        config.debounce_ms = debounce_ms;
    }
    if let Some(unknown_tags) = args.unknown_tags {
        config.unknown_tags = unknown_tags.into();
    }

    // A preview file is opened in a browser, so it is always a full page
    let mut options = config.render.clone();
    options.standalone = true;

    let handle = Scheduler::spawn(config.pipeline()?, config.scheduler());
    let mut preview = handle.subscribe();
    let mut watcher = FileWatcher::new(&args.file)?;

    println!(
        "{} {} {}",
        "👀 Watching".bright_blue().bold(),
        args.file.display(),
        "(Ctrl+C to stop)".dimmed()
    );
    handle.submit(read_source(&args.file)?)?;

    let mut last_sequence = 0;
    loop {
        tokio::select! {
            change = watcher.next_change() => match change {
                Some(event) => {
                    debug!(kind = ?event.kind, "File changed");
                    match tokio::fs::read_to_string(&args.file).await {
                        Ok(source) => handle.submit(source)?,
                        Err(err) => warn!("Cannot read {}: {}", args.file.display(), err),
                    }
                }
                None => break,
            },
            changed = preview.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = preview.borrow_and_update().clone();
                if state.sequence != last_sequence {
                    last_sequence = state.sequence;
                    report(&state, &args, &options)?;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{}", "Stopping watch".dimmed());
                break;
            },
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn report(state: &PreviewState, args: &WatchArgs, options: &RenderOptions) -> Result<()> {
    let label = format!("#{}", state.sequence).dimmed();

    match &state.outcome {
        CompileOutcome::Pending => {}
        CompileOutcome::Success(tree) => {
            match &args.out {
                Some(path) => {
                    write_output(path, &render_to_html(tree, options))?;
                    println!("  {} {} rendered → {}", "✓".green(), label, path.display());
                }
                None => println!("  {} {} compiled {} nodes", "✓".green(), label, tree.nodes.len()),
            }
            for name in tree.unknown_tags() {
                println!("    {} unknown component <{}>", "⚠️".yellow(), name.yellow());
            }
        }
        CompileOutcome::Failure(err) => {
            eprintln!(
                "  {} {} {} {}",
                "✗".red(),
                label,
                format!("{} error:", err.kind).red().bold(),
                err.message
            );
            if let Some(path) = &args.out {
                write_output(path, &render_error_html(&err.message, options))?;
            }
        }
    }

    if state.stats.discarded > 0 {
        debug!(discarded = state.stats.discarded, "Stale compiles discarded");
    }
    Ok(())
}
