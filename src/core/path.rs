//! Root-to-node chains of states paired with their resolve scopes.

use super::params::StateParams;
use super::state::State;
use crate::resolve::{ResolveContext, ResolvePolicy, ResolveScope};
use crate::transition::TransitionResult;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// One state of a [`Path`] together with its resolve scope.
///
/// Cloning is cheap and shares the scope, so a retained element keeps its
/// memoized values across the from-path and the to-path of a transition.
#[derive(Clone)]
pub struct PathElement {
    state: Arc<State>,
    scope: Arc<ResolveScope>,
}

impl PathElement {
    pub fn new(state: &Arc<State>) -> Self {
        Self {
            state: Arc::clone(state),
            scope: Arc::new(ResolveScope::for_state(state)),
        }
    }

    pub fn state(&self) -> &Arc<State> {
        &self.state
    }

    pub fn scope(&self) -> &Arc<ResolveScope> {
        &self.scope
    }
}

impl fmt::Debug for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathElement").field(&self.state.name()).finish()
    }
}

/// Ordered, root-first sequence of [`PathElement`]s.
///
/// Every path carries the transition-level root scope and the params its
/// resolvables are computed with. Elements are ordered by depth and never
/// repeat a state.
#[derive(Clone)]
pub struct Path {
    root: Arc<ResolveScope>,
    elements: Vec<PathElement>,
    params: StateParams,
}

impl Path {
    pub fn new(root: Arc<ResolveScope>, elements: Vec<PathElement>, params: StateParams) -> Self {
        Self {
            root,
            elements,
            params,
        }
    }

    /// Path for `state` and all its ancestors, each with a fresh scope.
    pub fn for_state(
        state: Option<&Arc<State>>,
        params: StateParams,
        root: Arc<ResolveScope>,
    ) -> Self {
        let elements = state
            .map(|s| s.path().iter().map(PathElement::new).collect())
            .unwrap_or_default();
        Self::new(root, elements, params)
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn states(&self) -> Vec<Arc<State>> {
        self.elements.iter().map(|e| Arc::clone(&e.state)).collect()
    }

    pub fn params(&self) -> &StateParams {
        &self.params
    }

    pub fn root(&self) -> &Arc<ResolveScope> {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// Sub-path over `range`; out-of-range bounds are clamped.
    pub fn slice(&self, range: Range<usize>) -> Path {
        let end = range.end.min(self.elements.len());
        let start = range.start.min(end);
        Self::new(
            Arc::clone(&self.root),
            self.elements[start..end].to_vec(),
            self.params.clone(),
        )
    }

    /// Append `other`'s elements; root scope and params come from `self`.
    pub fn concat(&self, other: &Path) -> Path {
        let mut elements = self.elements.clone();
        elements.extend(other.elements.iter().cloned());
        Self::new(Arc::clone(&self.root), elements, self.params.clone())
    }

    /// Resolve context spanning the root scope and every element.
    pub fn resolve_context(&self) -> ResolveContext {
        self.resolve_context_to(self.elements.len())
    }

    /// Resolve context ending at the element at `index` (inclusive).
    pub fn resolve_context_at(&self, index: usize) -> ResolveContext {
        self.resolve_context_to(index + 1)
    }

    fn resolve_context_to(&self, len: usize) -> ResolveContext {
        let mut scopes = Vec::with_capacity(len + 1);
        scopes.push(Arc::clone(&self.root));
        scopes.extend(
            self.elements
                .iter()
                .take(len)
                .map(|e| Arc::clone(&e.scope)),
        );
        ResolveContext::new(scopes, self.params.clone())
    }

    /// Trigger resolution across the whole path according to `policy`.
    pub async fn resolve(&self, policy: ResolvePolicy) -> TransitionResult<()> {
        self.resolve_context().resolve_all(policy).await
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.elements.iter().map(|e| e.state.name()))
            .finish()
    }
}
