//! State tree nodes.
//!
//! A [`State`] is an immutable node of the application state tree. It knows
//! its parent, the parameters it declares, the values it can resolve, and
//! the optional callbacks fired when it is entered or exited. States are
//! shared as `Arc<State>` and compared by identity.

use crate::hooks::HookCallback;
use crate::resolve::ResolveDeclaration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Declaration of a single state parameter.
///
/// A `dynamic` parameter may change without forcing the owning state to be
/// exited and re-entered.
///
/// # Example
///
/// ```rust
/// use waypoint::core::ParamDeclaration;
///
/// let page = ParamDeclaration::new("page").dynamic().with_default(1);
/// assert!(page.dynamic);
/// assert_eq!(page.default, Some(serde_json::json!(1)));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamDeclaration {
    pub name: String,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

impl ParamDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dynamic: false,
            default: None,
        }
    }

    /// Mark the parameter as dynamic.
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Value used when a transition does not supply one.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A node in the hierarchical state tree.
///
/// Built by [`crate::registry::StateRegistry`]; never mutated afterwards.
pub struct State {
    pub(crate) name: String,
    pub(crate) parent: Option<Arc<State>>,
    pub(crate) params: Vec<ParamDeclaration>,
    pub(crate) resolve: Vec<ResolveDeclaration>,
    pub(crate) on_enter: Option<HookCallback>,
    pub(crate) on_exit: Option<HookCallback>,
}

impl State {
    /// Fully qualified name, e.g. `"app.users.detail"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<State>> {
        self.parent.as_ref()
    }

    /// Parameters declared by this state itself (not its ancestors).
    pub fn params(&self) -> &[ParamDeclaration] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamDeclaration> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Names of this state's own parameters that are not dynamic.
    pub fn non_dynamic_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| !p.dynamic)
            .map(|p| p.name.as_str())
    }

    pub fn resolvables(&self) -> &[ResolveDeclaration] {
        &self.resolve
    }

    pub fn on_enter(&self) -> Option<&HookCallback> {
        self.on_enter.as_ref()
    }

    pub fn on_exit(&self) -> Option<&HookCallback> {
        self.on_exit.as_ref()
    }

    /// Number of ancestors; top-level states have depth 0.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.parent.as_ref();
        while let Some(parent) = cursor {
            depth += 1;
            cursor = parent.parent.as_ref();
        }
        depth
    }

    /// Ancestor chain from the top-level state down to `self`.
    pub fn path(self: &Arc<Self>) -> Vec<Arc<State>> {
        let mut path = Vec::with_capacity(self.depth() + 1);
        path.push(Arc::clone(self));
        let mut cursor = self.parent.clone();
        while let Some(parent) = cursor {
            cursor = parent.parent.clone();
            path.push(parent);
        }
        path.reverse();
        path
    }

    /// Every parameter declared along the path, root first.
    pub fn path_params(self: &Arc<Self>) -> Vec<ParamDeclaration> {
        self.path()
            .iter()
            .flat_map(|state| state.params.iter().cloned())
            .collect()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("params", &self.params)
            .field(
                "resolve",
                &self.resolve.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
