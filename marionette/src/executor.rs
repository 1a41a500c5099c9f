//! Cross-thread execution of work on the event loop thread.
//!
//! All component mutation goes through [`Executor::run`]/[`Executor::call`]:
//! the body executes on the event loop thread while the calling (driver)
//! thread blocks until it completes. Results, errors, and panics all come
//! back to the caller; nothing is swallowed on the loop side.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use tracing::{debug, trace};

use crate::errors::AutomationError;
use crate::event_loop::EventLoopHandle;

/// Marshals closures onto the event loop thread and blocks the caller until
/// they finish.
#[derive(Clone)]
pub struct Executor {
    loop_handle: EventLoopHandle,
}

impl Executor {
    pub(crate) fn new(loop_handle: EventLoopHandle) -> Self {
        Self { loop_handle }
    }

    /// Whether the calling thread is the dispatch (event loop) thread. Bodies
    /// passed to [`run`](Self::run)/[`call`](Self::call) can observe this for
    /// self-verification.
    pub fn on_dispatch_thread(&self) -> bool {
        self.loop_handle.is_event_loop_thread()
    }

    /// Execute `body` on the event loop thread and wait for it to finish.
    ///
    /// If the caller is already on the event loop thread the body runs
    /// inline, immediately. That reentrancy short-circuit is the only nesting
    /// the loop permits; without it a job submitting another job would
    /// deadlock against itself.
    ///
    /// There is deliberately no timeout on the completion wait: if the event
    /// loop thread is wedged, this call blocks forever. Callers that need a
    /// bound must impose their own.
    pub fn run<F>(&self, body: F) -> Result<(), AutomationError>
    where
        F: FnOnce() -> Result<(), AutomationError> + Send + 'static,
    {
        self.call(body)
    }

    /// Same contract as [`run`](Self::run), returning the body's value.
    ///
    /// An `Err` from the body surfaces here on the calling thread. A panic in
    /// the body is caught on the loop thread and resumed on the calling
    /// thread, preserving the original payload.
    pub fn call<T, F>(&self, body: F) -> Result<T, AutomationError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, AutomationError> + Send + 'static,
    {
        if self.loop_handle.is_event_loop_thread() {
            trace!("already on the event loop thread; running body inline");
            return body();
        }

        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let posted = self.loop_handle.post(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(body));
            // The receiver only disappears if the driver thread itself died.
            let _ = done_tx.send(outcome);
        });
        if !posted {
            return Err(AutomationError::Internal(
                "event loop is shut down; cannot dispatch".to_string(),
            ));
        }

        match done_rx.recv() {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => {
                debug!("dispatched body panicked; resuming unwind on the calling thread");
                panic::resume_unwind(payload)
            }
            Err(_) => Err(AutomationError::Internal(
                "event loop dropped the dispatched task before completion".to_string(),
            )),
        }
    }
}
