//! Hierarchical component search with deterministic match semantics.
//!
//! `find` contracts: exactly one match is returned; zero matches fail with
//! [`AutomationError::ComponentNotFound`]; two or more fail with
//! [`AutomationError::MultipleComponentsFound`] listing every match, because
//! an ambiguous target is a test-authoring bug the caller must fix by
//! narrowing the matcher or the search root.

use tracing::{debug, instrument};

use crate::element::{Component, WindowRegistry};
use crate::errors::AutomationError;
use crate::executor::Executor;
use crate::matcher::{ComponentMatcher, NameAndRoleMatcher, RoleMatcher};

#[derive(Clone)]
pub struct ComponentFinder {
    executor: Executor,
    registry: WindowRegistry,
}

impl ComponentFinder {
    pub(crate) fn new(executor: Executor, registry: WindowRegistry) -> Self {
        Self { executor, registry }
    }

    /// Search every registered top-level window for the single component
    /// identified by `matcher`.
    #[instrument(level = "debug", skip_all, fields(matcher = %matcher.description()))]
    pub fn find(&self, matcher: &dyn ComponentMatcher) -> Result<Component, AutomationError> {
        let roots = self.registry.windows();
        self.find_among(roots, matcher)
    }

    /// Search the subtree rooted at `root`.
    #[instrument(level = "debug", skip_all, fields(root = %root, matcher = %matcher.description()))]
    pub fn find_in(
        &self,
        root: &Component,
        matcher: &dyn ComponentMatcher,
    ) -> Result<Component, AutomationError> {
        self.find_among(vec![root.clone()], matcher)
    }

    /// All matches in depth-first order; may be empty. Used by callers that
    /// want to count rather than resolve a unique target.
    pub fn find_all(
        &self,
        matcher: &dyn ComponentMatcher,
    ) -> Result<Vec<Component>, AutomationError> {
        let roots = self.registry.windows();
        self.collect_matches(roots, matcher)
    }

    /// Convenience: find the unique component with the given role.
    pub fn find_by_role(&self, role: &str) -> Result<Component, AutomationError> {
        self.find(&RoleMatcher::new(role))
    }

    /// Convenience: find by name with an expected role. A component found by
    /// name but of the wrong role is a not-found, never a silent fallback.
    pub fn find_by_name(&self, name: &str, role: &str) -> Result<Component, AutomationError> {
        self.find(&NameAndRoleMatcher::new(name, role))
    }

    fn find_among(
        &self,
        roots: Vec<Component>,
        matcher: &dyn ComponentMatcher,
    ) -> Result<Component, AutomationError> {
        let mut matches = self.collect_matches(roots, matcher)?;
        match matches.len() {
            0 => Err(AutomationError::ComponentNotFound(format!(
                "no component matched [{}]",
                matcher.description()
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(AutomationError::MultipleComponentsFound {
                matcher: format!("[{}]", matcher.description()),
                matches: matches.iter().map(Component::describe).collect(),
            }),
        }
    }

    fn collect_matches(
        &self,
        roots: Vec<Component>,
        matcher: &dyn ComponentMatcher,
    ) -> Result<Vec<Component>, AutomationError> {
        // The structural walk happens on the event loop thread so child
        // lists cannot mutate underneath it; the snapshot is then matched
        // on the calling thread against read-only attribute getters.
        let nodes = self.snapshot_tree(roots)?;
        let matches: Vec<Component> = nodes
            .into_iter()
            .filter(|node| matcher.matches(node))
            .collect();
        debug!(match_count = matches.len(), "traversal finished");
        Ok(matches)
    }

    /// Depth-first snapshot of every node reachable from `roots`, taken in
    /// one hop onto the event loop thread. Children are visited before owned
    /// windows, each from a defensive copy of the live list. A dead event
    /// loop surfaces as the executor's error, not as an empty tree.
    fn snapshot_tree(&self, roots: Vec<Component>) -> Result<Vec<Component>, AutomationError> {
        self.executor.call(move || {
            let mut nodes = Vec::new();
            for root in roots {
                collect_depth_first(&root, &mut nodes);
            }
            Ok(nodes)
        })
    }
}

fn collect_depth_first(component: &Component, out: &mut Vec<Component>) {
    out.push(component.clone());
    for child in component.children() {
        collect_depth_first(&child, out);
    }
    for window in component.owned_windows() {
        collect_depth_first(&window, out);
    }
}
