//! Resolved references to a state plus params.

use crate::core::{State, StateParams};
use std::fmt;
use std::sync::Arc;

/// A state reference with the params to enter it with.
///
/// `state` is `None` when the identifier did not resolve (an invalid
/// target) or, as a transition source, when nothing has been entered yet.
#[derive(Clone)]
pub struct TargetState {
    identifier: String,
    state: Option<Arc<State>>,
    params: StateParams,
}

impl TargetState {
    pub fn new(state: &Arc<State>, params: StateParams) -> Self {
        Self {
            identifier: state.name().to_string(),
            state: Some(Arc::clone(state)),
            params,
        }
    }

    /// Reference to a state that does not exist.
    pub fn invalid(identifier: impl Into<String>, params: StateParams) -> Self {
        Self {
            identifier: identifier.into(),
            state: None,
            params,
        }
    }

    /// Source of the very first transition: no state, no params.
    pub fn empty() -> Self {
        Self::invalid("", StateParams::new())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> Option<&Arc<State>> {
        self.state.as_ref()
    }

    pub fn params(&self) -> &StateParams {
        &self.params
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_some()
    }

    /// Resolved state name, or the raw identifier when unresolved.
    pub fn name(&self) -> &str {
        self.state.as_ref().map_or(&self.identifier, |s| s.name())
    }

    pub fn with_params(mut self, params: StateParams) -> Self {
        self.params = params;
        self
    }

    /// Same resolved state (by identity) and identical params. Unresolved
    /// targets compare by identifier.
    pub fn same_as(&self, other: &TargetState) -> bool {
        let same_state = match (&self.state, &other.state) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => self.identifier == other.identifier,
            _ => false,
        };
        same_state && self.params == other.params
    }
}

impl fmt::Debug for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetState")
            .field("identifier", &self.identifier)
            .field("valid", &self.is_valid())
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'{}", self.name(), self.params)
    }
}
