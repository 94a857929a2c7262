//! Per-transition options.

use serde::{Deserialize, Serialize};

/// Options controlling how a transition is computed.
///
/// All fields default to "off", so options can be deserialized from a
/// partial document.
///
/// # Example
///
/// ```rust
/// use waypoint::transition::TransitionOptions;
///
/// let options: TransitionOptions = serde_json::from_str(r#"{ "reload": true }"#).unwrap();
/// assert!(options.reload);
/// assert!(!options.inherit);
///
/// let options = TransitionOptions::default().reload_from("app.users").inherit();
/// assert!(options.wants_reload());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionOptions {
    /// Re-enter states even if their params did not change. Without
    /// `reload_state` this reloads from the root of the target path.
    pub reload: bool,
    /// Reload from this state downwards.
    pub reload_state: Option<String>,
    /// Carry over params declared on the target path from the source params.
    pub inherit: bool,
    /// Base state for relative targets such as `^.sibling`.
    pub relative: Option<String>,
}

impl TransitionOptions {
    pub fn reload(mut self) -> Self {
        self.reload = true;
        self
    }

    pub fn reload_from(mut self, state: impl Into<String>) -> Self {
        self.reload = true;
        self.reload_state = Some(state.into());
        self
    }

    pub fn inherit(mut self) -> Self {
        self.inherit = true;
        self
    }

    pub fn relative_to(mut self, state: impl Into<String>) -> Self {
        self.relative = Some(state.into());
        self
    }

    /// True if any reload was requested.
    pub fn wants_reload(&self) -> bool {
        self.reload || self.reload_state.is_some()
    }
}
