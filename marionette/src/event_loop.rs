//! The single-threaded event loop that stands in for the toolkit's UI thread.
//!
//! One dedicated OS thread drains a FIFO job queue; every piece of component
//! state is only ever mutated by jobs running on that thread. The rest of the
//! crate reaches the loop through [`EventLoopHandle`], which is cheap to clone
//! and safe to share across threads.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::errors::AutomationError;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Recover from lock poisoning; a panicked job has already been reported via
/// the executor's unwind propagation.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Shared {
    sender: Mutex<Option<Sender<Job>>>,
    /// Jobs posted but not yet finished running. Zero means the loop is idle.
    pending: AtomicUsize,
    thread_id: OnceLock<ThreadId>,
}

/// Owns the spawned event loop thread. Dropping it closes the queue and joins
/// the thread.
pub struct EventLoop {
    shared: Arc<Shared>,
    join: Option<JoinHandle<()>>,
}

impl EventLoop {
    pub(crate) fn spawn() -> Result<Self, AutomationError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let shared = Arc::new(Shared {
            sender: Mutex::new(Some(sender)),
            pending: AtomicUsize::new(0),
            thread_id: OnceLock::new(),
        });

        let worker = shared.clone();
        let join = thread::Builder::new()
            .name("marionette-event-loop".to_string())
            .spawn(move || {
                let _ = worker.thread_id.set(thread::current().id());
                for job in receiver {
                    // A panicking job must not take the loop thread down or
                    // leave the pending count stuck above zero. Jobs routed
                    // through the executor re-raise their panic on the
                    // calling thread; raw posted jobs are only logged here.
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        warn!("posted job panicked; event loop continues");
                    }
                    worker.pending.fetch_sub(1, Ordering::AcqRel);
                }
                trace!("event loop thread exiting");
            })
            .map_err(|e| {
                AutomationError::Internal(format!("failed to spawn event loop thread: {e}"))
            })?;

        Ok(Self {
            shared,
            join: Some(join),
        })
    }

    pub fn handle(&self) -> EventLoopHandle {
        EventLoopHandle {
            shared: self.shared.clone(),
        }
    }

    fn shutdown(&mut self) {
        // Closing the channel lets the worker drain remaining jobs and exit.
        lock_or_recover(&self.shared.sender).take();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A shareable handle onto the event loop queue.
#[derive(Clone)]
pub struct EventLoopHandle {
    shared: Arc<Shared>,
}

impl EventLoopHandle {
    /// Enqueue a job at the tail of the FIFO queue. Returns `false` if the
    /// loop has shut down, in which case the job is dropped.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.post_boxed(Box::new(job))
    }

    pub(crate) fn post_boxed(&self, job: Job) -> bool {
        let guard = lock_or_recover(&self.shared.sender);
        if let Some(sender) = guard.as_ref() {
            self.shared.pending.fetch_add(1, Ordering::AcqRel);
            if sender.send(job).is_ok() {
                return true;
            }
            self.shared.pending.fetch_sub(1, Ordering::AcqRel);
        }
        debug!("event loop is shut down; dropping posted job");
        false
    }

    /// Post a job after `delay` has elapsed. The job does not count as
    /// pending until it actually lands on the queue, so the loop reports
    /// idle while the delay is running. This mirrors how real toolkits
    /// attach deferred work (popup menus, repaint timers).
    pub fn post_delayed(&self, delay: Duration, job: impl FnOnce() + Send + 'static) {
        let handle = self.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            handle.post(job);
        });
    }

    /// Whether the calling thread is the event loop thread itself.
    pub fn is_event_loop_thread(&self) -> bool {
        self.shared.thread_id.get().copied() == Some(thread::current().id())
    }

    /// The queue is idle when every posted job has finished running.
    pub fn is_idle(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire) == 0
    }

    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }
}
