//! Progress and result aggregation
//!
//! The aggregator owns the ordered list of outcomes (one slot per task, addressed
//! by the task's original index) together with the processed counter. Lanes write
//! into it as tasks resolve; observers read snapshots, watch the progress pair, or
//! consume a stream of per-task events.

use crate::state::{AnalysisOutcome, AnalysisResult};
use crate::ScoutError;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};

/// Running `{processed, total}` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Emitted once per task when it reaches a terminal outcome
#[derive(Debug, Clone)]
pub struct OutcomeEvent {
    /// Original position of the task
    pub index: usize,
    pub result: AnalysisResult,
    /// Progress immediately after this resolution
    pub progress: Progress,
}

struct Slots {
    results: Vec<AnalysisResult>,
    processed: usize,
}

/// Ordered outcome store shared by all lanes of a run
pub struct Aggregator {
    slots: Mutex<Slots>,
    progress_tx: watch::Sender<Progress>,
    events_tx: Mutex<Option<mpsc::UnboundedSender<OutcomeEvent>>>,
}

impl Aggregator {
    /// Creates an aggregator with every URL initialized to `pending`
    pub fn new(urls: &[String]) -> Self {
        let results: Vec<AnalysisResult> = urls.iter().map(AnalysisResult::pending).collect();
        let total = results.len();
        let (progress_tx, _) = watch::channel(Progress {
            processed: 0,
            total,
        });

        Self {
            slots: Mutex::new(Slots {
                results,
                processed: 0,
            }),
            progress_tx,
            events_tx: Mutex::new(None),
        }
    }

    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the terminal outcome of the task at `index`
    ///
    /// The outcome write and the counter increment happen under one lock, so the
    /// number of non-pending slots always equals `processed`.
    ///
    /// # Returns
    ///
    /// * `Ok(Progress)` - Progress after this resolution
    /// * `Err(ScoutError::UnknownTask)` - No task has this index
    /// * `Err(ScoutError::InvalidTransition)` - The slot was already terminal
    /// * `Err(ScoutError::NonTerminalOutcome)` - `outcome` is `Pending`
    pub fn record(&self, index: usize, outcome: AnalysisOutcome) -> Result<Progress, ScoutError> {
        let mut guard = self.lock_slots();
        let slots = &mut *guard;
        let total = slots.results.len();
        let slot = slots
            .results
            .get_mut(index)
            .ok_or(ScoutError::UnknownTask { index })?;

        if !outcome.is_terminal() {
            return Err(ScoutError::NonTerminalOutcome { index });
        }
        if slot.outcome.is_terminal() {
            return Err(ScoutError::InvalidTransition {
                index,
                from: slot.status(),
            });
        }

        slot.outcome = outcome;
        let result = slot.clone();
        slots.processed += 1;
        let progress = Progress {
            processed: slots.processed,
            total,
        };

        // Published while the slots are still locked so observers never see the
        // counter go backwards
        self.progress_tx.send_replace(progress);

        let events = self.events_tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = events.as_ref() {
            // A dropped receiver just means nobody is watching any more
            let _ = tx.send(OutcomeEvent {
                index,
                result,
                progress,
            });
        }

        Ok(progress)
    }

    /// Returns a copy of all results in original order
    pub fn snapshot(&self) -> Vec<AnalysisResult> {
        self.lock_slots().results.clone()
    }

    /// Returns the current progress pair
    pub fn progress(&self) -> Progress {
        *self.progress_tx.borrow()
    }

    /// Returns indices of tasks that are still pending
    pub fn pending_indices(&self) -> Vec<usize> {
        self.lock_slots()
            .results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.outcome.is_terminal())
            .map(|(i, _)| i)
            .collect()
    }

    /// Subscribes to progress updates
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress_tx.subscribe()
    }

    /// Opens the per-task event stream
    ///
    /// Only resolutions recorded after this call are delivered. Calling it again
    /// replaces the previous stream.
    pub fn take_events(&self) -> mpsc::UnboundedReceiver<OutcomeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events_tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        rx
    }

    /// Closes the event stream so receivers observe the end of the run
    pub fn close_events(&self) {
        self.events_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }
}
