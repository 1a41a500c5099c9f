//! The robot façade: input simulation with an idle barrier after each action.
//!
//! Every action moves through the same three phases: dispatch the input onto
//! the event loop, settle (wait for the queue to drain, then apply the
//! configured pacing delay), and only then hand control back to the driver.
//! Once any robot method returns normally the UI is idle with respect to the
//! action just performed, so assertions immediately after it are not racing
//! the event loop.

use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, instrument, warn};

use crate::display_lock::DisplayLock;
use crate::element::{Component, WindowRegistry};
use crate::errors::AutomationError;
use crate::event_loop::{lock_or_recover, EventLoopHandle};
use crate::executor::Executor;
use crate::finder::ComponentFinder;
use crate::matcher::RoleMatcher;
use crate::settings::{EventMode, Settings};
use crate::types::{InputEvent, Key, MouseButton};
use crate::wait::{Condition, Timeout, Waiter};

pub struct Robot {
    executor: Executor,
    loop_handle: EventLoopHandle,
    finder: ComponentFinder,
    registry: WindowRegistry,
    waiter: Waiter,
    settings: Settings,
    lock: Arc<DisplayLock>,
    owner: String,
}

impl Robot {
    /// Build a robot for one automation session. Acquiring the display lock
    /// is part of setup; a lock held by another owner is fatal here, never
    /// retried.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        executor: Executor,
        loop_handle: EventLoopHandle,
        finder: ComponentFinder,
        registry: WindowRegistry,
        waiter: Waiter,
        settings: Settings,
        lock: Arc<DisplayLock>,
        owner: &str,
    ) -> Result<Self, AutomationError> {
        lock.acquire(owner)?;
        Ok(Self {
            executor,
            loop_handle,
            finder,
            registry,
            waiter,
            settings,
            lock,
            owner: owner.to_string(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn finder(&self) -> &ComponentFinder {
        &self.finder
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Click `component` with `button`, `times` clicks. Pressing grants the
    /// component focus before its listeners run.
    #[instrument(level = "debug", skip(self, component), fields(target = %component))]
    pub fn click(
        &self,
        component: &Component,
        button: MouseButton,
        times: u32,
    ) -> Result<(), AutomationError> {
        if times == 0 {
            return Err(AutomationError::InvalidArgument(
                "click count must be at least 1".to_string(),
            ));
        }
        self.ensure_live(component)?;
        for clicks in 1..=times {
            self.dispatch_to(component, InputEvent::MousePressed { button, clicks })?;
            self.pace();
            self.dispatch_to(component, InputEvent::MouseReleased { button })?;
            self.pace();
        }
        self.settle()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        self.dispatch_key(InputEvent::KeyPressed { key })?;
        self.settle()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn release_key(&self, key: Key) -> Result<(), AutomationError> {
        self.dispatch_key(InputEvent::KeyReleased { key })?;
        self.settle()
    }

    /// Press and release each key in order, with pacing between events.
    #[instrument(level = "debug", skip(self, keys))]
    pub fn press_and_release_keys(&self, keys: &[Key]) -> Result<(), AutomationError> {
        for &key in keys {
            self.dispatch_key(InputEvent::KeyPressed { key })?;
            self.pace();
            self.dispatch_key(InputEvent::KeyReleased { key })?;
            self.pace();
        }
        self.settle()
    }

    /// Move the pointer over `component` at the component-relative
    /// coordinates.
    #[instrument(level = "debug", skip(self, component), fields(target = %component))]
    pub fn move_mouse(
        &self,
        component: &Component,
        x: i32,
        y: i32,
    ) -> Result<(), AutomationError> {
        self.ensure_live(component)?;
        self.dispatch_to(component, InputEvent::MouseMoved { x, y })?;
        self.settle()
    }

    /// Trigger the context menu on `component` and return the popup once it
    /// shows. Popups attach asynchronously, so "a popup menu is now showing"
    /// is retried under the waiter instead of failing on the first check.
    #[instrument(level = "debug", skip(self, component), fields(target = %component))]
    pub fn show_popup_menu(&self, component: &Component) -> Result<Component, AutomationError> {
        self.ensure_live(component)?;
        self.dispatch_to(
            component,
            InputEvent::MousePressed {
                button: MouseButton::Right,
                clicks: 1,
            },
        )?;
        self.pace();
        self.dispatch_to(
            component,
            InputEvent::MouseReleased {
                button: MouseButton::Right,
            },
        )?;
        self.settle()?;

        let found: Arc<Mutex<Option<Component>>> = Arc::new(Mutex::new(None));
        let finder = self.finder.clone();
        let slot = found.clone();
        let condition = Condition::new("a popup menu is showing", move || {
            match finder.find(&RoleMatcher::new("popup menu").require_showing(true)) {
                Ok(popup) => {
                    *lock_or_recover(&slot) = Some(popup);
                    Ok(true)
                }
                // Not attached yet; keep polling.
                Err(AutomationError::ComponentNotFound(_)) => Ok(false),
                // Ambiguity or anything else aborts the wait.
                Err(other) => Err(other),
            }
        });
        self.waiter
            .wait_for(condition, Some(Timeout::After(self.settings.timeout())))?;

        let popup = lock_or_recover(&found).take();
        popup.ok_or_else(|| {
            AutomationError::Internal("popup condition passed without capturing a popup".to_string())
        })
    }

    /// Hide and dispose `window` on the event loop thread. Closing an
    /// already-disposed window is a no-op; every other failure propagates.
    #[instrument(level = "debug", skip(self, window), fields(target = %window))]
    pub fn close(&self, window: &Component) -> Result<(), AutomationError> {
        let target = window.clone();
        let result = self.executor.run(move || {
            if target.is_disposed() {
                return Err(AutomationError::ComponentDisposed(target.describe()));
            }
            target.hide();
            target.dispose();
            Ok(())
        });
        match result {
            Err(AutomationError::ComponentDisposed(which)) => {
                debug!(window = %which, "close ignored; window already disposed");
                Ok(())
            }
            other => other,
        }?;
        self.settle()
    }

    /// Dispose every window registered for this session and release the
    /// display lock. Idempotent; safe to call from teardown paths.
    #[instrument(level = "debug", skip(self))]
    pub fn clean_up(&self) -> Result<(), AutomationError> {
        let registry = self.registry.clone();
        self.executor.run(move || {
            for window in registry.windows() {
                window.hide();
                window.dispose();
            }
            registry.set_focus(None);
            Ok(())
        })?;
        self.settle()?;
        self.lock.release(&self.owner);
        Ok(())
    }

    fn ensure_live(&self, component: &Component) -> Result<(), AutomationError> {
        if component.is_disposed() {
            return Err(AutomationError::ComponentDisposed(component.describe()));
        }
        Ok(())
    }

    /// Dispatch one input event to `component`, per the configured event
    /// mode.
    fn dispatch_to(
        &self,
        component: &Component,
        event: InputEvent,
    ) -> Result<(), AutomationError> {
        debug!(?event, "dispatching");
        let target = component.clone();
        let registry = self.registry.clone();
        let job = move || {
            if matches!(event, InputEvent::MousePressed { .. }) && !target.is_disposed() {
                registry.set_focus(Some(target.clone()));
            }
            target.dispatch(&event);
        };
        match self.settings.event_mode {
            EventMode::Direct => self.executor.run(move || {
                job();
                Ok(())
            }),
            EventMode::Queued => {
                if !self.loop_handle.post(job) {
                    return Err(AutomationError::Internal(
                        "event loop is shut down; cannot post input event".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Key events go to the focus owner. With no focus owner the event falls
    /// on the floor, like a key press on an empty desktop.
    fn dispatch_key(&self, event: InputEvent) -> Result<(), AutomationError> {
        match self.registry.focus_owner() {
            Some(owner) => self.dispatch_to(&owner, event),
            None => {
                warn!(?event, "no focus owner; dropping key event");
                Ok(())
            }
        }
    }

    /// The settle phase: block until the event queue drains, bounded by the
    /// configured timeout, then apply the auto-delay pacing interval.
    fn settle(&self) -> Result<(), AutomationError> {
        debug!(pending = self.loop_handle.pending(), "settling");
        let handle = self.loop_handle.clone();
        let condition =
            Condition::satisfied_when("event queue is idle", move || handle.is_idle());
        self.waiter
            .wait_for(condition, Some(Timeout::After(self.settings.timeout())))?;
        self.pace();
        Ok(())
    }

    fn pace(&self) {
        let delay = self.settings.auto_delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

impl Drop for Robot {
    fn drop(&mut self) {
        // Releasing by a non-owner is a no-op, so this is safe after
        // clean_up already ran.
        self.lock.release(&self.owner);
    }
}
