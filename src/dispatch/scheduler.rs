//! Task queue and worker assignment
//!
//! The scheduler owns the queue of pending tasks and a snapshot of the worker
//! pool. Lanes pull [`Assignment`]s from it; each pop removes exactly one task
//! and pairs it with the next worker in round-robin order, under one lock.

use crate::config::WorkerCredential;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One URL to analyze, tagged with its original position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTask {
    pub url: String,
    pub index: usize,
}

/// A task paired with the worker credential chosen for it
#[derive(Debug, Clone)]
pub struct Assignment {
    pub task: AnalysisTask,
    pub worker: Arc<WorkerCredential>,
}

struct Queue {
    tasks: VecDeque<AnalysisTask>,
    next_worker: usize,
}

/// Shared task queue with round-robin worker assignment
pub struct Scheduler {
    queue: Mutex<Queue>,
    workers: Vec<Arc<WorkerCredential>>,
    cancelled: Arc<AtomicBool>,
}

/// Stops lanes from pulling new tasks
///
/// Cloneable and usable from any task or thread, including signal handlers.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            tracing::info!("Cancellation requested; no new URLs will be dispatched");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Scheduler {
    /// Creates a scheduler seeded with every URL in order
    ///
    /// # Arguments
    ///
    /// * `urls` - URLs to analyze; task `i` is `urls[i]`
    /// * `workers` - Worker pool, snapshotted for the lifetime of the run
    pub fn new(urls: &[String], workers: &[WorkerCredential]) -> Self {
        let tasks = urls
            .iter()
            .enumerate()
            .map(|(index, url)| AnalysisTask {
                url: url.clone(),
                index,
            })
            .collect();

        Self {
            queue: Mutex::new(Queue {
                tasks,
                next_worker: 0,
            }),
            workers: workers.iter().cloned().map(Arc::new).collect(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pops the next task and assigns it a worker
    ///
    /// # Returns
    ///
    /// * `Some(Assignment)` - The next task in original order
    /// * `None` - The queue is empty, the run was cancelled, or the pool is empty
    pub fn next_assignment(&self) -> Option<Assignment> {
        if self.is_cancelled() || self.workers.is_empty() {
            return None;
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        let task = queue.tasks.pop_front()?;
        let worker = Arc::clone(&self.workers[queue.next_worker % self.workers.len()]);
        queue.next_worker = (queue.next_worker + 1) % self.workers.len();

        Some(Assignment { task, worker })
    }

    /// Number of tasks not yet handed to a lane
    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .tasks
            .len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Removes and returns every task still queued
    pub fn drain_remaining(&self) -> Vec<AnalysisTask> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .tasks
            .drain(..)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use std::collections::HashMap;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://example.com/{}", i)).collect()
    }

    fn pool(n: usize) -> Vec<WorkerCredential> {
        (0..n)
            .map(|i| {
                WorkerCredential::new(format!("w{}", i), ProviderKind::OpenAi, Some("k".into()))
            })
            .collect()
    }

    #[test]
    fn test_tasks_in_original_order() {
        let scheduler = Scheduler::new(&urls(4), &pool(1));
        let order: Vec<usize> = std::iter::from_fn(|| scheduler.next_assignment())
            .map(|a| a.task.index)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(scheduler.remaining(), 0);
        assert!(scheduler.next_assignment().is_none());
    }

    #[test]
    fn test_round_robin_is_fair() {
        let scheduler = Scheduler::new(&urls(9), &pool(3));
        let mut per_worker: HashMap<String, usize> = HashMap::new();
        while let Some(a) = scheduler.next_assignment() {
            *per_worker.entry(a.worker.id.clone()).or_default() += 1;
        }
        assert_eq!(per_worker.len(), 3);
        assert!(per_worker.values().all(|&n| n == 3));
    }

    #[test]
    fn test_cancel_stops_assignment() {
        let scheduler = Scheduler::new(&urls(5), &pool(2));
        assert!(scheduler.next_assignment().is_some());

        let handle = scheduler.cancel_handle();
        handle.cancel();
        assert!(scheduler.is_cancelled());
        assert!(scheduler.next_assignment().is_none());

        let drained: Vec<usize> = scheduler.drain_remaining().iter().map(|t| t.index).collect();
        assert_eq!(drained, vec![1, 2, 3, 4]);
        assert_eq!(scheduler.remaining(), 0);
    }

    #[test]
    fn test_empty_pool_yields_nothing() {
        let scheduler = Scheduler::new(&urls(2), &[]);
        assert!(scheduler.next_assignment().is_none());
        assert_eq!(scheduler.remaining(), 2);
    }

    #[test]
    fn test_concurrent_pops_are_exclusive() {
        let scheduler = Arc::new(Scheduler::new(&urls(200), &pool(4)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                std::thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(a) = scheduler.next_assignment() {
                        seen.push(a.task.index);
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..200).collect::<Vec<_>>());
    }
}
