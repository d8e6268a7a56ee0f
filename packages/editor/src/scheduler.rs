//! # Debounced Compile Scheduler
//!
//! A single actor task owns all bookkeeping. Callers talk to it through a
//! cheap `SchedulerHandle` and observe results through a `watch` channel.
//!
//! ```text
//!            submit                window elapses
//!   Idle ───────────▶ Scheduled ─────────────────▶ Compiling
//!    ▲                   ▲  │ submit (restart)        │  │ submit
//!    │                   └──┘                         │  ▼
//!    │    last compile resolves          CompilingAndScheduled
//!    └────────────────────────────────────────────────┘
//! ```
//!
//! Each issued compile gets the next sequence number. A result is published
//! only if its sequence is the highest issued so far; older results are
//! discarded, so a slow compile never overwrites a newer one.

use crate::errors::CompileError;
use crate::normalizer::{normalize, SourceInput, SourceText};
use crate::pipeline::{join_failure, Compiler};
use livemark_evaluator::DocumentTree;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, instrument};

/// Quiescence window used when none is configured
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub debounce: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl SchedulerConfig {
    pub fn with_debounce(debounce: Duration) -> Self {
        Self { debounce }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Compiling,
    CompilingAndScheduled,
}

#[derive(Debug, Clone, Default)]
pub enum CompileOutcome {
    /// Nothing has been published yet
    #[default]
    Pending,
    Success(Arc<DocumentTree>),
    Failure(CompileError),
}

impl CompileOutcome {
    pub fn tree(&self) -> Option<&DocumentTree> {
        match self {
            CompileOutcome::Success(tree) => Some(tree.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CompileError> {
        match self {
            CompileOutcome::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CompileOutcome::Pending)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    /// Sources handed to `submit`
    pub submitted: u64,
    /// Compiles started
    pub issued: u64,
    /// Results made visible
    pub published: u64,
    /// Results dropped because a newer compile had been issued
    pub discarded: u64,
}

/// What the render surface observes
#[derive(Debug, Clone, Default)]
pub struct PreviewState {
    /// Sequence number of the published outcome, 0 before the first
    pub sequence: u64,
    pub outcome: CompileOutcome,
    /// Whether any compile is in flight
    pub compiling: bool,
    pub stats: SchedulerStats,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler has shut down")]
    Closed,
}

enum Command {
    Submit(SourceText),
    State(oneshot::Sender<SchedulerState>),
    Shutdown,
}

type Completion = (u64, Result<DocumentTree, CompileError>);

/// Handle to a running scheduler. Clones talk to the same actor.
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    preview: watch::Receiver<PreviewState>,
}

impl SchedulerHandle {
    /// Hand over new source; restarts the quiescence window
    pub fn submit(&self, input: impl Into<SourceInput>) -> Result<(), SchedulerError> {
        self.commands
            .send(Command::Submit(normalize(input)))
            .map_err(|_| SchedulerError::Closed)
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.preview.clone()
    }

    /// Latest published preview
    pub fn preview(&self) -> PreviewState {
        self.preview.borrow().clone()
    }

    pub async fn state(&self) -> Result<SchedulerState, SchedulerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::State(reply))
            .map_err(|_| SchedulerError::Closed)?;
        response.await.map_err(|_| SchedulerError::Closed)
    }

    /// Stop the actor. Compiles already in flight finish but never publish.
    pub async fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).is_ok() {
            self.commands.closed().await;
        }
    }
}

pub struct Scheduler<C: Compiler> {
    compiler: Arc<C>,
    debounce: Duration,
    pending: Option<SourceText>,
    deadline: Option<Instant>,
    last_issued: u64,
    in_flight: usize,
    stats: SchedulerStats,
    completions_tx: mpsc::UnboundedSender<Completion>,
    preview: watch::Sender<PreviewState>,
}

impl<C: Compiler> Scheduler<C> {
    /// Start the actor on the current runtime
    pub fn spawn(compiler: C, config: SchedulerConfig) -> SchedulerHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (preview_tx, preview_rx) = watch::channel(PreviewState::default());

        let scheduler = Scheduler {
            compiler: Arc::new(compiler),
            debounce: config.debounce,
            pending: None,
            deadline: None,
            last_issued: 0,
            in_flight: 0,
            stats: SchedulerStats::default(),
            completions_tx,
            preview: preview_tx,
        };

        info!(debounce_ms = config.debounce.as_millis() as u64, "Starting compile scheduler");
        tokio::spawn(scheduler.run(commands_rx, completions_rx));

        SchedulerHandle {
            commands: commands_tx,
            preview: preview_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            let deadline = self.deadline;
            let timer = async move {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Submit(source)) => self.on_submit(source),
                    Some(Command::State(reply)) => {
                        let _ = reply.send(self.state());
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = timer => self.issue(),
                Some((sequence, result)) = completions.recv() => self.on_complete(sequence, result),
            }
        }

        info!(in_flight = self.in_flight, "Compile scheduler stopped");
    }

    fn state(&self) -> SchedulerState {
        match (self.in_flight > 0, self.pending.is_some()) {
            (false, false) => SchedulerState::Idle,
            (false, true) => SchedulerState::Scheduled,
            (true, false) => SchedulerState::Compiling,
            (true, true) => SchedulerState::CompilingAndScheduled,
        }
    }

    fn on_submit(&mut self, source: SourceText) {
        self.stats.submitted += 1;
        self.pending = Some(source);
        self.deadline = Some(Instant::now() + self.debounce);
        debug!(state = ?self.state(), "Source submitted, window restarted");
    }

    #[instrument(skip_all)]
    fn issue(&mut self) {
        self.deadline = None;
        let Some(source) = self.pending.take() else {
            return;
        };

        self.last_issued += 1;
        self.in_flight += 1;
        self.stats.issued += 1;
        let sequence = self.last_issued;
        debug!(sequence, len = source.len(), "Issuing compile");

        let compiler = self.compiler.clone();
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            // Run the compile in its own task so a panic still completes
            let task = tokio::spawn(async move { compiler.compile(source).await });
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(join_failure(err)),
            };
            let _ = completions.send((sequence, result));
        });

        self.publish_progress();
    }

    #[instrument(skip(self, result))]
    fn on_complete(&mut self, sequence: u64, result: Result<DocumentTree, CompileError>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if sequence == self.last_issued {
            let outcome = match result {
                Ok(tree) => CompileOutcome::Success(Arc::new(tree)),
                Err(err) => {
                    debug!(kind = %err.kind, "{}", err.message);
                    CompileOutcome::Failure(err)
                }
            };
            self.stats.published += 1;
            debug!("Publishing compile result");

            let stats = self.stats;
            let compiling = self.in_flight > 0;
            self.preview.send_modify(|preview| {
                preview.sequence = sequence;
                preview.outcome = outcome;
                preview.compiling = compiling;
                preview.stats = stats;
            });
        } else {
            self.stats.discarded += 1;
            debug!(newest = self.last_issued, "Discarding stale compile result");
            self.publish_progress();
        }

        // A source that arrived during the compile gets a fresh window
        if self.pending.is_some() {
            self.deadline = Some(Instant::now() + self.debounce);
        }
    }

    fn publish_progress(&self) {
        let stats = self.stats;
        let compiling = self.in_flight > 0;
        self.preview.send_modify(|preview| {
            preview.compiling = compiling;
            preview.stats = stats;
        });
    }
}
