//! # Livemark Editor
//!
//! Live-preview engine: turns edited source into render-ready document trees.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ normalizer: text / fragments → SourceText   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ scheduler: debounce + sequence numbers      │
//! │  - One actor task owns all bookkeeping      │
//! │  - Publishes only the newest result         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ pipeline: parse → compile → instantiate     │
//! │  - Runs on the blocking pool                │
//! │  - Classifies failures                      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ PreviewState watch → render surface         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use livemark_editor::{Pipeline, Scheduler, SchedulerConfig};
//! use livemark_evaluator::ComponentRegistry;
//!
//! let pipeline = Pipeline::new(ComponentRegistry::with_builtins());
//! let handle = Scheduler::spawn(pipeline, SchedulerConfig::default());
//!
//! handle.submit("# Hello\n\n<Callout>Hi</Callout>")?;
//!
//! let mut preview = handle.subscribe();
//! let state = preview.wait_for(|state| state.sequence > 0).await?;
//! ```

mod cache;
mod errors;
mod normalizer;
mod pipeline;
mod scheduler;

pub use cache::{CacheStats, ModuleCache};
pub use errors::{CompileError, ErrorKind};
pub use normalizer::{insert_template, normalize, Fragment, SourceInput, SourceText};
pub use pipeline::{compile, compile_blocking, Compiler, Pipeline};
pub use scheduler::{
    CompileOutcome, PreviewState, Scheduler, SchedulerConfig, SchedulerError, SchedulerHandle,
    SchedulerState, SchedulerStats,
};

// Re-export common types for convenience
pub use livemark_evaluator::{ComponentRegistry, DocumentTree, UnknownTagFallback};
