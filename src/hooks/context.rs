//! Values a hook can see while it runs.

use crate::core::{State, StateParams};
use crate::resolve::ResolveContext;
use crate::transition::{Transition, TransitionError, TransitionResult};
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Environment of a hook invocation.
///
/// Carries the owning transition, the state the hook is scoped to (for
/// `entering`/`exiting` hooks and `on_enter`/`on_exit` callbacks), that
/// state's params, the failure being reported (for `onError` hooks), and
/// the resolve context used for dependency lookup.
#[derive(Clone)]
pub struct HookContext {
    transition: Transition,
    state: Option<Arc<State>>,
    params: StateParams,
    error: Option<TransitionError>,
    resolve: ResolveContext,
}

impl HookContext {
    pub(crate) fn new(transition: Transition, resolve: ResolveContext) -> Self {
        let params = resolve.params().clone();
        Self {
            transition,
            state: None,
            params,
            error: None,
            resolve,
        }
    }

    pub(crate) fn with_state(mut self, state: Arc<State>) -> Self {
        self.state = Some(state);
        self
    }

    pub(crate) fn with_error(mut self, error: TransitionError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    /// State being entered or exited; `None` for transition-wide hooks.
    pub fn state(&self) -> Option<&Arc<State>> {
        self.state.as_ref()
    }

    /// Params of the path this hook is scoped to: the source params for
    /// exiting states, the target params otherwise.
    pub fn params(&self) -> &StateParams {
        &self.params
    }

    /// Failure that ended the transition, for `onError` hooks.
    pub fn error(&self) -> Option<&TransitionError> {
        self.error.as_ref()
    }

    pub fn resolve_context(&self) -> &ResolveContext {
        &self.resolve
    }

    /// Already resolved value of `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.resolve.peek(name)
    }

    /// Already resolved value of `name`, deserialized.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> TransitionResult<T> {
        let value = self.get(name).ok_or_else(|| TransitionError::Unresolved {
            name: name.to_string(),
        })?;
        serde_json::from_value(value).map_err(|e| TransitionError::ResolveFailed {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve `name` now if it has not been resolved yet.
    pub fn resolve(&self, name: &str) -> BoxFuture<'static, TransitionResult<Value>> {
        self.resolve.resolve(name)
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("transition", &self.transition.id())
            .field("state", &self.state.as_ref().map(|s| s.name()))
            .field("params", &self.params)
            .field("error", &self.error)
            .finish()
    }
}
