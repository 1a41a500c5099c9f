//! Polling-based synchronization between the driver thread and the UI.
//!
//! The event loop cannot push state-change notifications to the driver
//! without per-predicate listener plumbing, so the driver polls: a
//! [`Condition`] is evaluated at a fixed short interval until it holds or the
//! timeout expires. The latency/CPU cost buys a primitive that works for
//! arbitrary predicates (visibility, focus, text values, window disposal).

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use crate::errors::AutomationError;
use crate::event_loop::EventLoopHandle;

pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(30);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// A named predicate polled by [`Waiter::wait_for`].
///
/// The test body may run many times, so it must be idempotent. Returning an
/// `Err` aborts the wait immediately; it is not treated as "not yet
/// satisfied".
pub struct Condition {
    description: String,
    test: Box<dyn FnMut() -> Result<bool, AutomationError> + Send>,
}

impl Condition {
    pub fn new(
        description: impl Into<String>,
        test: impl FnMut() -> Result<bool, AutomationError> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            test: Box::new(test),
        }
    }

    /// Convenience constructor for infallible predicates.
    pub fn satisfied_when(
        description: impl Into<String>,
        mut predicate: impl FnMut() -> bool + Send + 'static,
    ) -> Self {
        Self::new(description, move || Ok(predicate()))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn test(&mut self) -> Result<bool, AutomationError> {
        (self.test)()
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description)
            .finish()
    }
}

/// A bound on one wait call.
///
/// Passing `None` to [`Waiter::wait_for`] means "use the waiter's configured
/// default"; waiting forever must be requested explicitly with
/// [`Timeout::Never`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait forever. Explicit by design; an absent timeout never means this.
    Never,
    After(Duration),
}

impl Timeout {
    pub fn millis(ms: u64) -> Self {
        Timeout::After(Duration::from_millis(ms))
    }

    pub fn secs(secs: u64) -> Self {
        Timeout::After(Duration::from_secs(secs))
    }
}

/// Polls conditions on the calling (driver) thread.
///
/// Must never run on the event loop thread: the condition almost certainly
/// depends on loop progress that cannot happen while the loop is blocked
/// polling itself.
#[derive(Clone)]
pub struct Waiter {
    polling_interval: Duration,
    default_timeout: Duration,
    loop_handle: Option<EventLoopHandle>,
}

impl Default for Waiter {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
            default_timeout: DEFAULT_WAIT_TIMEOUT,
            loop_handle: None,
        }
    }
}

impl Waiter {
    pub fn new(polling_interval: Duration, default_timeout: Duration) -> Self {
        Self {
            polling_interval,
            default_timeout,
            loop_handle: None,
        }
    }

    /// Set the timeout used when `wait_for` is called with `None`.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Attach the event loop handle so debug builds can catch waits issued
    /// from the loop thread itself.
    pub(crate) fn with_loop_handle(mut self, handle: EventLoopHandle) -> Self {
        self.loop_handle = Some(handle);
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Repeatedly evaluate `condition` until it holds or the timeout elapses.
    /// On success returns the elapsed time; on expiry fails with
    /// [`AutomationError::WaitTimedOut`] carrying the condition description
    /// and the elapsed time.
    #[instrument(level = "debug", skip(self, condition, timeout), fields(condition = %condition.description()))]
    pub fn wait_for(
        &self,
        mut condition: Condition,
        timeout: Option<Timeout>,
    ) -> Result<Duration, AutomationError> {
        if let Some(handle) = &self.loop_handle {
            debug_assert!(
                !handle.is_event_loop_thread(),
                "wait_for must not be called from the event loop thread"
            );
        }

        let limit = match timeout {
            None => Some(self.default_timeout),
            Some(Timeout::Never) => None,
            Some(Timeout::After(duration)) => Some(duration),
        };

        let start = Instant::now();
        loop {
            if condition.test()? {
                let elapsed = start.elapsed();
                debug!(?elapsed, "condition satisfied");
                return Ok(elapsed);
            }
            let elapsed = start.elapsed();
            if let Some(limit) = limit {
                if elapsed >= limit {
                    return Err(AutomationError::WaitTimedOut {
                        condition: condition.description().to_string(),
                        timeout: limit,
                        elapsed,
                    });
                }
            }
            thread::sleep(self.polling_interval);
        }
    }
}
