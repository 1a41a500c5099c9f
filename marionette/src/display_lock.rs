//! Mutual exclusion over the one physical display and input device.
//!
//! Pointer and keyboard focus are global to the machine, so two automation
//! sessions driving input at the same time would corrupt each other's event
//! streams. The lock is coarse and process-wide on purpose; acquisition
//! failure surfaces as a setup error and is never retried behind the
//! caller's back.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::{debug, instrument, warn};

use crate::errors::AutomationError;
use crate::event_loop::lock_or_recover;

static GLOBAL_DISPLAY_LOCK: Lazy<Arc<DisplayLock>> = Lazy::new(|| Arc::new(DisplayLock::new()));

/// Ownership token for the display. At most one owner at a time; callers
/// pass an explicit owner identity rather than relying on ambient thread
/// identity.
pub struct DisplayLock {
    owner: Mutex<Option<String>>,
}

impl Default for DisplayLock {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayLock {
    pub fn new() -> Self {
        Self {
            owner: Mutex::new(None),
        }
    }

    /// The process-wide lock instance shared by all sessions by default.
    pub fn global() -> Arc<DisplayLock> {
        GLOBAL_DISPLAY_LOCK.clone()
    }

    /// Take ownership. Re-acquiring while already the owner is fine;
    /// acquiring while someone else holds it fails with
    /// [`AutomationError::ScreenBusy`].
    #[instrument(level = "debug", skip(self))]
    pub fn acquire(&self, owner: &str) -> Result<(), AutomationError> {
        let mut current = lock_or_recover(&self.owner);
        match current.as_deref() {
            None => {
                *current = Some(owner.to_string());
                debug!("display lock acquired");
                Ok(())
            }
            Some(held_by) if held_by == owner => Ok(()),
            Some(held_by) => Err(AutomationError::ScreenBusy {
                held_by: held_by.to_string(),
                requested_by: owner.to_string(),
            }),
        }
    }

    /// Release ownership. A release by a non-owner is a no-op (logged, not
    /// an error), so teardown paths can call it unconditionally.
    #[instrument(level = "debug", skip(self))]
    pub fn release(&self, owner: &str) {
        let mut current = lock_or_recover(&self.owner);
        match current.as_deref() {
            Some(held_by) if held_by == owner => {
                *current = None;
                debug!("display lock released");
            }
            Some(held_by) => {
                warn!(held_by, "release ignored; lock held by another owner");
            }
            None => {}
        }
    }

    pub fn acquired_by(&self, owner: &str) -> bool {
        lock_or_recover(&self.owner).as_deref() == Some(owner)
    }

    pub fn owner(&self) -> Option<String> {
        lock_or_recover(&self.owner).clone()
    }
}
