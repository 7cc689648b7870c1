//! Fixed-size pool of OS threads with an order-preserving gather.
//!
//! Every task is queued up front. Workers pull `(index, item)` pairs from the
//! queue and report back on an event channel; the supervisor drops each result
//! into slot `index`, so the output order never depends on which worker ran a
//! task or when it finished. A worker retires after a bounded number of tasks
//! and is replaced by a fresh one with newly initialized state while work
//! remains.

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use indicatif::ProgressBar;
use log::{debug, error};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

pub const DEFAULT_MAX_TASKS_PER_WORKER: usize = 10;

/// A task that panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPanic {
    pub index: usize,
    pub message: String,
}

enum Event<R> {
    Done {
        index: usize,
        outcome: Result<R, TaskPanic>,
    },
    Retired {
        worker: usize,
        handled: usize,
        initialized: bool,
    },
}

pub struct WorkerPool {
    size: usize,
    max_tasks_per_worker: Option<usize>,
    progress: Option<ProgressBar>,
}

impl WorkerPool {
    /// `max_tasks_per_worker == 0` keeps every worker alive for the whole batch.
    pub fn new(size: usize, max_tasks_per_worker: usize) -> Self {
        Self {
            size: size.max(1),
            max_tasks_per_worker: (max_tasks_per_worker > 0).then_some(max_tasks_per_worker),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `task` over every item and returns one result per item, in item order.
    ///
    /// `init` builds the per-worker state each time a worker starts, including
    /// replacements for recycled workers. A panicking task yields `Err(TaskPanic)`
    /// for its slot only, and its worker is recycled. Blocks until every task has
    /// finished. There is no timeout: a task that never returns stalls the batch.
    pub fn map_ordered<T, R, S, I, F>(
        &self,
        items: Vec<T>,
        init: I,
        task: F,
    ) -> Result<Vec<Result<R, TaskPanic>>>
    where
        T: Send,
        R: Send,
        I: Fn(usize) -> Result<S> + Sync,
        F: Fn(&mut S, usize, T) -> R + Sync,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (task_tx, task_rx) = unbounded();
        for queued in items.into_iter().enumerate() {
            if task_tx.send(queued).is_err() {
                bail!("task queue closed while it was being filled");
            }
        }
        drop(task_tx);

        let (event_tx, event_rx) = unbounded::<Event<R>>();
        let mut slots: Vec<Option<Result<R, TaskPanic>>> = (0..total).map(|_| None).collect();
        let limit = self.max_tasks_per_worker.unwrap_or(usize::MAX);

        thread::scope(|scope| -> Result<()> {
            let spawn = |worker: usize| -> Result<()> {
                let tasks = task_rx.clone();
                let events = event_tx.clone();
                let (init, task) = (&init, &task);
                thread::Builder::new()
                    .name(format!("mood-worker-{}", worker))
                    .spawn_scoped(scope, move || run_worker(worker, limit, init, task, tasks, events))
                    .with_context(|| format!("failed to start worker {}", worker))?;
                Ok(())
            };

            let mut next_worker = 0;
            let mut live = 0;
            for _ in 0..self.size.min(total) {
                spawn(next_worker)?;
                next_worker += 1;
                live += 1;
            }

            let mut completed = 0;
            while completed < total {
                let event = event_rx
                    .recv()
                    .map_err(|_| anyhow!("worker event channel closed"))?;
                match event {
                    Event::Done { index, outcome } => {
                        slots[index] = Some(outcome);
                        completed += 1;
                        if let Some(progress) = &self.progress {
                            progress.inc(1);
                        }
                    }
                    Event::Retired {
                        worker,
                        handled,
                        initialized,
                    } => {
                        live -= 1;
                        debug!("Worker {} retired after {} tasks", worker, handled);
                        if task_rx.is_empty() {
                            continue;
                        }
                        if initialized {
                            spawn(next_worker)?;
                            next_worker += 1;
                            live += 1;
                        } else if live == 0 {
                            bail!(
                                "no worker could be initialized; {} of {} tasks never ran",
                                total - completed,
                                total
                            );
                        }
                    }
                }
            }
            debug!("All {} tasks finished across {} worker starts", total, next_worker);
            Ok(())
        })?;

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or_else(|| anyhow!("task {} produced no result", index)))
            .collect()
    }
}

fn run_worker<T, R, S, I, F>(
    worker: usize,
    limit: usize,
    init: &I,
    task: &F,
    tasks: Receiver<(usize, T)>,
    events: Sender<Event<R>>,
) where
    I: Fn(usize) -> Result<S>,
    F: Fn(&mut S, usize, T) -> R,
{
    let state = match panic::catch_unwind(AssertUnwindSafe(|| init(worker))) {
        Ok(Ok(state)) => Some(state),
        Ok(Err(e)) => {
            error!("Worker {} failed to initialize: {:#}", worker, e);
            None
        }
        Err(payload) => {
            error!(
                "Worker {} panicked during initialization: {}",
                worker,
                panic_message(payload.as_ref())
            );
            None
        }
    };
    let Some(mut state) = state else {
        let _ = events.send(Event::Retired {
            worker,
            handled: 0,
            initialized: false,
        });
        return;
    };

    let mut handled = 0;
    while handled < limit {
        let Ok((index, item)) = tasks.recv() else {
            break;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(&mut state, index, item)))
            .map_err(|payload| TaskPanic {
                index,
                message: panic_message(payload.as_ref()),
            });
        handled += 1;
        let faulted = outcome.is_err();
        if events.send(Event::Done { index, outcome }).is_err() {
            return;
        }
        // State touched by a panicking task is not reused.
        if faulted {
            break;
        }
    }

    drop(state);
    let _ = events.send(Event::Retired {
        worker,
        handled,
        initialized: true,
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn results_follow_input_order_not_completion_order() {
        let pool = WorkerPool::new(4, 3);
        let items: Vec<u64> = (0..40).collect();
        let results = pool
            .map_ordered(
                items,
                |_| Ok(()),
                |_, _, item| {
                    // Early items take the longest.
                    thread::sleep(Duration::from_millis((40 - item) % 7));
                    item * 10
                },
            )
            .unwrap();
        let values: Vec<u64> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, (0..40).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn workers_are_recycled_after_the_task_limit() {
        let starts = AtomicUsize::new(0);
        let pool = WorkerPool::new(1, 3);
        let results = pool
            .map_ordered(
                (0..10).collect::<Vec<_>>(),
                |_| {
                    starts.fetch_add(1, Ordering::SeqCst);
                    Ok(0usize)
                },
                |handled, _, _: i32| {
                    *handled += 1;
                    *handled
                },
            )
            .unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 4);
        assert!(results.iter().all(|r| matches!(r, Ok(n) if *n <= 3)));
    }

    #[test]
    fn zero_limit_never_recycles() {
        let starts = AtomicUsize::new(0);
        let pool = WorkerPool::new(2, 0);
        pool.map_ordered(
            (0..50).collect::<Vec<_>>(),
            |_| {
                starts.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            |_, _, item: i32| item,
        )
        .unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn a_panicking_task_only_loses_its_own_slot() {
        let pool = WorkerPool::new(2, 10);
        let results = pool
            .map_ordered(
                (0..8).collect::<Vec<_>>(),
                |_| Ok(()),
                |_, _, item: i32| {
                    if item == 3 {
                        panic!("boom on {}", item);
                    }
                    item
                },
            )
            .unwrap();
        assert_eq!(results.len(), 8);
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => assert_eq!(value, index as i32),
                Err(fault) => {
                    assert_eq!(fault.index, 3);
                    assert_eq!(fault.message, "boom on 3");
                }
            }
        }
    }

    #[test]
    fn fails_when_no_worker_can_start() {
        let pool = WorkerPool::new(3, 10);
        let result = pool.map_ordered(
            vec![1, 2, 3],
            |worker| -> Result<()> { bail!("worker {} has no lexicon", worker) },
            |_, _, item: i32| item,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_batch_starts_no_workers() {
        let starts = AtomicUsize::new(0);
        let results = WorkerPool::new(4, 10)
            .map_ordered(
                Vec::<i32>::new(),
                |_| {
                    starts.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                |_, _, item| item,
            )
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn progress_ticks_once_per_task() {
        let progress = ProgressBar::hidden();
        WorkerPool::new(3, 2)
            .with_progress(progress.clone())
            .map_ordered((0..9).collect::<Vec<_>>(), |_| Ok(()), |_, _, item: i32| item)
            .unwrap();
        assert_eq!(progress.position(), 9);
    }
}
