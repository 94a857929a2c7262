//! Value-based outcomes of a transition that did not succeed.
//!
//! A rejection is not a fault. It flows through the same settle path as a
//! failure so observers can tell "a newer transition took over" apart from
//! "a hook blew up" by inspecting [`RejectionKind`].

use crate::transition::Transition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag distinguishing rejection kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    /// A newer transition replaced this one before it finished.
    Superseded,
    /// The target state could not be resolved.
    Invalid,
    /// Same state, same relevant params, no reload requested.
    Ignored,
    /// A hook returned `false`.
    Aborted,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Superseded => "SUPERSEDED",
            Self::Invalid => "INVALID",
            Self::Ignored => "IGNORED",
            Self::Aborted => "ABORTED",
        };
        f.write_str(tag)
    }
}

/// Payload carried by a rejection.
#[derive(Clone, Debug)]
pub enum RejectionDetail {
    None,
    /// The superseding (or redirect target) transition.
    Transition(Transition),
    /// The state reference that could not be resolved.
    Target(String),
    Reason(String),
}

/// A typed, non-fatal transition outcome.
///
/// # Example
///
/// ```rust
/// use waypoint::transition::{Rejection, RejectionKind};
///
/// let rejection = Rejection::invalid("app.missing");
/// assert_eq!(rejection.kind(), RejectionKind::Invalid);
/// assert_eq!(rejection.target(), Some("app.missing"));
/// assert!(!rejection.is_redirected());
/// ```
#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Rejection {
    kind: RejectionKind,
    redirected: bool,
    message: String,
    detail: RejectionDetail,
}

impl Rejection {
    fn new(kind: RejectionKind, message: impl Into<String>, detail: RejectionDetail) -> Self {
        Self {
            kind,
            redirected: false,
            message: message.into(),
            detail,
        }
    }

    /// A newer transition took over. `by` is the transition now current, if any.
    pub fn superseded(by: Option<Transition>, redirected: bool) -> Self {
        let detail = by.map_or(RejectionDetail::None, RejectionDetail::Transition);
        let message = if redirected {
            "transition was redirected"
        } else {
            "transition superseded"
        };
        Self {
            redirected,
            ..Self::new(RejectionKind::Superseded, message, detail)
        }
    }

    /// Superseded by an explicit redirect to `to`.
    pub fn redirected(to: Transition) -> Self {
        Self::superseded(Some(to), true)
    }

    pub fn invalid(target: impl Into<String>) -> Self {
        let target = target.into();
        Self::new(
            RejectionKind::Invalid,
            format!("no such state '{target}'"),
            RejectionDetail::Target(target),
        )
    }

    pub fn ignored() -> Self {
        Self::new(
            RejectionKind::Ignored,
            "transition is ignored",
            RejectionDetail::None,
        )
    }

    pub fn aborted(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(
            RejectionKind::Aborted,
            format!("transition aborted: {reason}"),
            RejectionDetail::Reason(reason),
        )
    }

    pub fn kind(&self) -> RejectionKind {
        self.kind
    }

    /// True for the `REDIRECTED` flavour of [`RejectionKind::Superseded`].
    pub fn is_redirected(&self) -> bool {
        self.redirected
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> &RejectionDetail {
        &self.detail
    }

    /// The transition referenced by the detail, if any.
    pub fn transition(&self) -> Option<&Transition> {
        match &self.detail {
            RejectionDetail::Transition(t) => Some(t),
            _ => None,
        }
    }

    /// The unresolved target reference of an `INVALID` rejection.
    pub fn target(&self) -> Option<&str> {
        match &self.detail {
            RejectionDetail::Target(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_render_as_tags() {
        assert_eq!(Rejection::ignored().to_string(), "IGNORED: transition is ignored");
        assert_eq!(
            Rejection::aborted("hook returned false").to_string(),
            "ABORTED: transition aborted: hook returned false"
        );
    }

    #[test]
    fn superseded_without_successor_has_no_detail() {
        let rejection = Rejection::superseded(None, false);
        assert_eq!(rejection.kind(), RejectionKind::Superseded);
        assert!(!rejection.is_redirected());
        assert!(rejection.transition().is_none());
        assert!(matches!(rejection.detail(), RejectionDetail::None));
    }

    #[test]
    fn kind_serializes_as_screaming_tag() {
        let json = serde_json::to_string(&RejectionKind::Superseded).unwrap();
        assert_eq!(json, "\"SUPERSEDED\"");
    }
}
