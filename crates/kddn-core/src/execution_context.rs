// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::control::CancelSignal;
use crate::error::{KddnError, RunPhase};
use crate::observability::ProgressSink;

/// Whether per-node regressions may run on the worker pool.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    #[default]
    Parallel,
}

/// Execution context threaded through every solve and search call.
///
/// Progress reported through a context is mapped into its window, so a
/// search that reports `0..=1` can be embedded in a larger run with
/// [`ExecutionContext::subtask`].
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub cancel: Option<&'a dyn CancelSignal>,
    pub progress: Option<&'a dyn ProgressSink>,
    pub parallelism: Parallelism,
    pub phase: RunPhase,
    progress_start: f64,
    progress_width: f64,
}

impl Default for ExecutionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with no hooks and the full progress window.
    pub fn new() -> Self {
        Self {
            cancel: None,
            progress: None,
            parallelism: Parallelism::Parallel,
            phase: RunPhase::InitialSolve,
            progress_start: 0.0,
            progress_width: 1.0,
        }
    }

    /// Sets the cancellation signal.
    pub fn with_cancel(mut self, cancel: &'a dyn CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the progress sink.
    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_phase(mut self, phase: RunPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Returns a context whose `0..=1` progress maps onto `[start, end]` of
    /// this context's window.
    pub fn subtask(&self, start: f64, end: f64) -> Self {
        let start = start.clamp(0.0, 1.0);
        let end = end.clamp(start, 1.0);
        let mut child = *self;
        child.progress_start = self.progress_start + self.progress_width * start;
        child.progress_width = self.progress_width * (end - start);
        child
    }

    /// Returns true when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|signal| signal.is_cancelled())
    }

    /// Returns a cancelled error when cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), KddnError> {
        if self.is_cancelled() {
            return Err(KddnError::cancelled());
        }
        Ok(())
    }

    /// Emits clamped progress, mapped into this context's window.
    pub fn report_progress(&self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }

        if let Some(sink) = self.progress {
            let mapped = self.progress_start + self.progress_width * fraction.clamp(0.0, 1.0);
            sink.on_progress(mapped.clamp(0.0, 1.0));
        }
    }
}
