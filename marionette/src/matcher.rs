//! Predicate-based identification of components.
//!
//! Matchers are pure functions of a component's observable state; the only
//! configuration they carry is set at construction. A disposed component
//! never matches, and matching never panics.

use crate::element::Component;

pub trait ComponentMatcher: Send + Sync {
    /// Whether `component` is the one this matcher identifies.
    fn matches(&self, component: &Component) -> bool;

    /// Human-readable description, included in finder error messages.
    fn description(&self) -> String;
}

fn showing_ok(require_showing: bool, component: &Component) -> bool {
    !require_showing || component.is_showing()
}

/// Matches by component name. With `require_showing`, a component that
/// matches the name but is not currently showing on screen still yields
/// `false`.
pub struct NameMatcher {
    name: String,
    require_showing: bool,
}

impl NameMatcher {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            require_showing: false,
        }
    }

    pub fn require_showing(mut self, require_showing: bool) -> Self {
        self.require_showing = require_showing;
        self
    }
}

impl ComponentMatcher for NameMatcher {
    fn matches(&self, component: &Component) -> bool {
        !component.is_disposed()
            && component.name().as_deref() == Some(self.name.as_str())
            && showing_ok(self.require_showing, component)
    }

    fn description(&self) -> String {
        format!(
            "name={:?}, require_showing={}",
            self.name, self.require_showing
        )
    }
}

/// Matches by component role ("button", "window", ...).
pub struct RoleMatcher {
    role: String,
    require_showing: bool,
}

impl RoleMatcher {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            require_showing: false,
        }
    }

    pub fn require_showing(mut self, require_showing: bool) -> Self {
        self.require_showing = require_showing;
        self
    }
}

impl ComponentMatcher for RoleMatcher {
    fn matches(&self, component: &Component) -> bool {
        !component.is_disposed()
            && component.role() == self.role
            && showing_ok(self.require_showing, component)
    }

    fn description(&self) -> String {
        format!(
            "role={:?}, require_showing={}",
            self.role, self.require_showing
        )
    }
}

/// Matches by name AND role. A component carrying the right name but the
/// wrong role does not match; the name alone never counts.
pub struct NameAndRoleMatcher {
    name: String,
    role: String,
    require_showing: bool,
}

impl NameAndRoleMatcher {
    pub fn new(name: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            require_showing: false,
        }
    }

    pub fn require_showing(mut self, require_showing: bool) -> Self {
        self.require_showing = require_showing;
        self
    }
}

impl ComponentMatcher for NameAndRoleMatcher {
    fn matches(&self, component: &Component) -> bool {
        !component.is_disposed()
            && component.name().as_deref() == Some(self.name.as_str())
            && component.role() == self.role
            && showing_ok(self.require_showing, component)
    }

    fn description(&self) -> String {
        format!(
            "name={:?}, role={:?}, require_showing={}",
            self.name, self.role, self.require_showing
        )
    }
}

/// Closure-based matcher for arbitrary predicates.
pub struct FnMatcher {
    description: String,
    predicate: Box<dyn Fn(&Component) -> bool + Send + Sync>,
    require_showing: bool,
}

impl FnMatcher {
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&Component) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            predicate: Box::new(predicate),
            require_showing: false,
        }
    }

    pub fn require_showing(mut self, require_showing: bool) -> Self {
        self.require_showing = require_showing;
        self
    }
}

impl ComponentMatcher for FnMatcher {
    fn matches(&self, component: &Component) -> bool {
        !component.is_disposed()
            && (self.predicate)(component)
            && showing_ok(self.require_showing, component)
    }

    fn description(&self) -> String {
        format!(
            "{}, require_showing={}",
            self.description, self.require_showing
        )
    }
}
