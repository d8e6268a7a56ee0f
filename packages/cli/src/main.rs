mod commands;
mod config;
mod watcher;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    compile, components, init, toc, watch, CompileArgs, ComponentsArgs, InitArgs, TocArgs, WatchArgs,
};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Livemark CLI - live preview for markdown with components
#[derive(Parser, Debug)]
#[command(name = "livemark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./livemark.config.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config file and an example document
    Init(InitArgs),

    /// Compile a document once
    Compile(CompileArgs),

    /// Print a document's table of contents
    Toc(TocArgs),

    /// List registered components
    Components(ComponentsArgs),

    /// Recompile a document whenever it changes
    Watch(WatchArgs),
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let Cli { config, command } = cli;
    let load_config = || Config::load(&cwd, config.as_deref());

    match command {
        Command::Init(args) => init(args, &cwd),
        Command::Compile(args) => compile(args, load_config()?).await,
        Command::Toc(args) => toc(args),
        Command::Components(args) => components(args, load_config()?),
        Command::Watch(args) => watch(args, load_config()?).await,
    }
}
