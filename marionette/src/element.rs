//! The logical component tree the finder and robot operate on.
//!
//! A [`Component`] is a cheap-to-clone handle onto shared widget state. The
//! tree is owned by the toolkit side of the house: state is only mutated by
//! jobs running on the event loop thread (the driver goes through
//! [`Executor`](crate::Executor)), while getters take short-lived snapshots
//! so the finder can observe the tree from anywhere without racing structural
//! mutation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::event_loop::lock_or_recover;
use crate::types::InputEvent;

/// Input listeners run on the event loop thread. The listener list is
/// snapshotted before invocation, so a handler may freely re-enter the
/// component it is attached to.
pub type InputListener = Arc<dyn Fn(&Component, &InputEvent) + Send + Sync>;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

struct ComponentState {
    role: String,
    name: Option<String>,
    text: Option<String>,
    visible: bool,
    enabled: bool,
    focused: bool,
    disposed: bool,
    /// Windows and popup menus sit at the top of the showing chain.
    top_level: bool,
    children: Vec<Component>,
    owned_windows: Vec<Component>,
    parent: Weak<ComponentInner>,
    registry: Weak<RegistryInner>,
    listeners: Vec<InputListener>,
}

struct ComponentInner {
    id: u64,
    state: Mutex<ComponentState>,
}

/// Handle onto one node of the component tree.
#[derive(Clone)]
pub struct Component {
    inner: Arc<ComponentInner>,
}

impl Component {
    fn with_state(state: ComponentState) -> Self {
        Self {
            inner: Arc::new(ComponentInner {
                id: NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed),
                state: Mutex::new(state),
            }),
        }
    }

    fn base_state(role: &str) -> ComponentState {
        ComponentState {
            role: role.to_string(),
            name: None,
            text: None,
            visible: true,
            enabled: true,
            focused: false,
            disposed: false,
            top_level: false,
            children: Vec::new(),
            owned_windows: Vec::new(),
            parent: Weak::new(),
            registry: Weak::new(),
            listeners: Vec::new(),
        }
    }

    /// Create a plain (non-top-level) component such as a button or label.
    pub fn new(role: &str) -> Self {
        Self::with_state(Self::base_state(role))
    }

    /// Create a named component.
    pub fn labeled(role: &str, name: &str) -> Self {
        let mut state = Self::base_state(role);
        state.name = Some(name.to_string());
        Self::with_state(state)
    }

    /// Create a popup menu. Popups are top-level but start hidden; they
    /// become showing once attached and shown.
    pub fn popup_menu(name: &str) -> Self {
        let mut state = Self::base_state("popup menu");
        state.name = Some(name.to_string());
        state.visible = false;
        state.top_level = true;
        Self::with_state(state)
    }

    /// Builder-style text initializer.
    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ComponentState> {
        lock_or_recover(&self.inner.state)
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn role(&self) -> String {
        self.state().role.clone()
    }

    pub fn name(&self) -> Option<String> {
        self.state().name.clone()
    }

    pub fn text(&self) -> Option<String> {
        self.state().text.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    pub fn is_focused(&self) -> bool {
        self.state().focused
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    /// A component is showing when it is visible, not disposed, and every
    /// ancestor up to a top-level window (or popup) is visible too.
    pub fn is_showing(&self) -> bool {
        let mut current = self.clone();
        loop {
            let (visible, disposed, top_level, parent) = {
                let state = current.state();
                (
                    state.visible,
                    state.disposed,
                    state.top_level,
                    state.parent.upgrade(),
                )
            };
            if !visible || disposed {
                return false;
            }
            match parent {
                Some(inner) => current = Component { inner },
                None => return top_level,
            }
        }
    }

    /// Snapshot of the direct children. Callers iterate the copy, never the
    /// live list.
    pub fn children(&self) -> Vec<Component> {
        self.state().children.clone()
    }

    /// Snapshot of the windows owned by this component (dialogs, popups).
    pub fn owned_windows(&self) -> Vec<Component> {
        self.state().owned_windows.clone()
    }

    pub fn parent(&self) -> Option<Component> {
        self.state()
            .parent
            .upgrade()
            .map(|inner| Component { inner })
    }

    pub fn set_name(&self, name: &str) {
        self.state().name = Some(name.to_string());
    }

    pub fn set_text(&self, text: &str) {
        self.state().text = Some(text.to_string());
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
    }

    pub fn set_visible(&self, visible: bool) {
        self.state().visible = visible;
    }

    pub fn show(&self) {
        self.set_visible(true);
    }

    pub fn hide(&self) {
        self.set_visible(false);
    }

    pub(crate) fn set_focused(&self, focused: bool) {
        self.state().focused = focused;
    }

    /// Attach a child; the child's parent link is updated.
    pub fn add_child(&self, child: Component) {
        child.state().parent = Arc::downgrade(&self.inner);
        self.state().children.push(child);
    }

    /// Attach an owned window (e.g. a popup menu). Owned windows stay
    /// top-level; they do not join the showing chain of their owner.
    pub fn add_owned_window(&self, window: Component) {
        self.state().owned_windows.push(window);
    }

    /// Register an input listener, invoked on the event loop thread for
    /// every event dispatched to this component.
    pub fn on_input(&self, listener: impl Fn(&Component, &InputEvent) + Send + Sync + 'static) {
        self.state().listeners.push(Arc::new(listener));
    }

    /// Convenience listener firing once per completed left click.
    pub fn on_click(&self, action: impl Fn(&Component) + Send + Sync + 'static) {
        self.on_input(move |component, event| {
            if matches!(
                event,
                InputEvent::MouseReleased {
                    button: crate::types::MouseButton::Left
                }
            ) {
                action(component);
            }
        });
    }

    /// Deliver an input event to this component's listeners. Runs on the
    /// event loop thread. Disposed components drop events on the floor.
    pub fn dispatch(&self, event: &InputEvent) {
        let listeners: Vec<InputListener> = {
            let state = self.state();
            if state.disposed {
                trace!(component = %self.describe(), "dropping event for disposed component");
                return;
            }
            state.listeners.clone()
        };
        for listener in listeners {
            listener(self, event);
        }
    }

    /// Mark this component and its whole subtree disposed, hide it, and
    /// deregister it from the window registry. Idempotent.
    pub fn dispose(&self) {
        let (children, owned, registry) = {
            let mut state = self.state();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.visible = false;
            state.focused = false;
            (
                state.children.clone(),
                state.owned_windows.clone(),
                state.registry.upgrade(),
            )
        };
        for child in children {
            child.dispose();
        }
        for window in owned {
            window.dispose();
        }
        if let Some(registry) = registry {
            registry.remove(self);
        }
    }

    /// Serializable snapshot of the component's observable state.
    pub fn attributes(&self) -> ComponentAttributes {
        let state = self.state();
        ComponentAttributes {
            role: state.role.clone(),
            name: state.name.clone(),
            text: state.text.clone(),
            visible: state.visible,
            enabled: state.enabled,
            focused: state.focused,
            child_count: state.children.len(),
        }
    }

    /// Short human-readable identity used in error messages and logs.
    pub fn describe(&self) -> String {
        let state = self.state();
        match &state.name {
            Some(name) => format!("{} '{}'", state.role, name),
            None => state.role.clone(),
        }
    }

    pub(crate) fn same_component(&self, other: &Component) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.same_component(other)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Component")
            .field("id", &self.inner.id)
            .field("role", &state.role)
            .field("name", &state.name)
            .field("visible", &state.visible)
            .field("disposed", &state.disposed)
            .field("children", &state.children.len())
            .finish()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Serializable version of a component's attributes for storage or
/// transmission; it cannot perform any automation actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAttributes {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub visible: bool,
    pub enabled: bool,
    pub focused: bool,
    pub child_count: usize,
}

pub(crate) struct RegistryInner {
    windows: Mutex<Vec<Component>>,
    focus: Mutex<Option<Component>>,
}

impl RegistryInner {
    fn remove(&self, component: &Component) {
        lock_or_recover(&self.windows).retain(|w| !w.same_component(component));
        let mut focus = lock_or_recover(&self.focus);
        if focus
            .as_ref()
            .is_some_and(|owner| owner.same_component(component))
        {
            *focus = None;
        }
    }
}

/// The set of live top-level windows for one automation session, plus the
/// session's focus owner.
#[derive(Clone)]
pub struct WindowRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                windows: Mutex::new(Vec::new()),
                focus: Mutex::new(None),
            }),
        }
    }

    /// Create and register a top-level window. Windows start hidden; show
    /// them from the event loop thread once built.
    pub fn new_window(&self, name: &str) -> Component {
        let mut state = Component::base_state("window");
        state.name = Some(name.to_string());
        state.visible = false;
        state.top_level = true;
        state.registry = Arc::downgrade(&self.inner);
        let window = Component::with_state(state);
        lock_or_recover(&self.inner.windows).push(window.clone());
        window
    }

    /// Register an externally built top-level component (e.g. a popup menu)
    /// so the finder's default search sees it.
    pub fn register(&self, window: Component) {
        window.state().registry = Arc::downgrade(&self.inner);
        lock_or_recover(&self.inner.windows).push(window);
    }

    /// Snapshot of the live top-level windows.
    pub fn windows(&self) -> Vec<Component> {
        lock_or_recover(&self.inner.windows).clone()
    }

    pub fn focus_owner(&self) -> Option<Component> {
        lock_or_recover(&self.inner.focus).clone()
    }

    /// Move focus; flags on the old and new owner are kept in sync.
    pub fn set_focus(&self, component: Option<Component>) {
        let mut focus = lock_or_recover(&self.inner.focus);
        if let Some(previous) = focus.take() {
            previous.set_focused(false);
        }
        if let Some(component) = &component {
            component.set_focused(true);
        }
        *focus = component;
    }
}
