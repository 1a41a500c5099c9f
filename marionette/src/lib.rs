//! Cross-thread GUI automation and synchronization engine
//!
//! This crate lets a driver thread (test or automation code) simulate user
//! input against a UI that runs its own single-threaded event loop, read and
//! mutate UI state safely, and assert on state that changes asynchronously:
//!
//! - [`Executor`] marshals closures onto the event loop thread and blocks the
//!   driver until they complete, propagating results, errors, and panics.
//! - [`Waiter`]/[`Condition`] poll a predicate until it holds or a timeout
//!   elapses, the uniform way to synchronize on asynchronous UI changes.
//! - [`ComponentFinder`] searches the live component tree with deterministic
//!   match, ambiguity, and not-found semantics.
//! - [`DisplayLock`] serializes automation sessions over the one physical
//!   display and input device.
//! - [`Robot`] composes the above: after every simulated action it blocks
//!   until the event queue is idle, so the driver always observes a settled
//!   UI.

use std::sync::Arc;

use tracing::instrument;

pub mod display_lock;
pub mod element;
pub mod errors;
pub mod event_loop;
pub mod executor;
pub mod finder;
pub mod matcher;
pub mod robot;
pub mod settings;
#[cfg(test)]
mod tests;
pub mod types;
pub mod wait;

pub use display_lock::DisplayLock;
pub use element::{Component, ComponentAttributes, InputListener, WindowRegistry};
pub use errors::AutomationError;
pub use event_loop::{EventLoop, EventLoopHandle};
pub use executor::Executor;
pub use finder::ComponentFinder;
pub use matcher::{ComponentMatcher, FnMatcher, NameAndRoleMatcher, NameMatcher, RoleMatcher};
pub use robot::Robot;
pub use settings::{EventMode, Settings};
pub use types::{InputEvent, Key, MouseButton};
pub use wait::{Condition, Timeout, Waiter};

/// The main entry point for one automation session: owns the spawned event
/// loop and the session's window registry.
pub struct Ui {
    event_loop: EventLoop,
    registry: WindowRegistry,
}

impl Ui {
    /// Spawn the event loop thread and set up an empty window registry.
    #[instrument]
    pub fn launch() -> Result<Self, AutomationError> {
        let event_loop = EventLoop::spawn()?;
        Ok(Self {
            event_loop,
            registry: WindowRegistry::new(),
        })
    }

    pub fn loop_handle(&self) -> EventLoopHandle {
        self.event_loop.handle()
    }

    pub fn executor(&self) -> Executor {
        Executor::new(self.loop_handle())
    }

    pub fn registry(&self) -> WindowRegistry {
        self.registry.clone()
    }

    pub fn finder(&self) -> ComponentFinder {
        ComponentFinder::new(self.executor(), self.registry())
    }

    /// A waiter bound to this session's event loop, with the default
    /// polling interval and timeout.
    pub fn waiter(&self) -> Waiter {
        Waiter::default().with_loop_handle(self.loop_handle())
    }

    pub fn is_idle(&self) -> bool {
        self.loop_handle().is_idle()
    }

    /// Build a robot with default settings, acquiring the process-wide
    /// display lock for `owner`.
    #[instrument(skip(self))]
    pub fn robot(&self, owner: &str) -> Result<Robot, AutomationError> {
        self.robot_with(owner, Settings::default(), DisplayLock::global())
    }

    /// Build a robot with explicit settings and display lock. Tests that
    /// must not contend on the global display pass their own lock here.
    #[instrument(skip(self, settings, lock))]
    pub fn robot_with(
        &self,
        owner: &str,
        settings: Settings,
        lock: Arc<DisplayLock>,
    ) -> Result<Robot, AutomationError> {
        let waiter = Waiter::default()
            .with_default_timeout(settings.timeout())
            .with_loop_handle(self.loop_handle());
        Robot::new(
            self.executor(),
            self.loop_handle(),
            self.finder(),
            self.registry(),
            waiter,
            settings,
            lock,
            owner,
        )
    }
}
