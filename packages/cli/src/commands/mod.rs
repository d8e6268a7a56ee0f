pub mod compile;
pub mod components;
pub mod init;
pub mod toc;
pub mod watch;

pub use compile::{compile, CompileArgs};
pub use components::{components, ComponentsArgs};
pub use init::{init, InitArgs};
pub use toc::{toc, TocArgs};
pub use watch::{watch, WatchArgs};

use anyhow::{Context, Result};
use colored::Colorize;
use livemark_editor::CompileError;
use livemark_parser::error::pretty;
use std::path::Path;

/// Read a source file
pub(crate) fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Diagnostic for a failed compile, with source context when the error has a span
pub(crate) fn format_compile_error(err: &CompileError, file_path: &Path, source: &str) -> String {
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    match err.span {
        Some(span) => pretty::format_message(
            &err.message,
            &format!("{} error", err.kind),
            span.start..span.end,
            file_name,
            source,
        ),
        None => format!("{} {}", format!("{} error:", err.kind).red().bold(), err.message),
    }
}

/// Write `contents` to `path`, creating parent directories
pub(crate) fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).with_context(|| format!("Cannot write {}", path.display()))
}
