//! Match criteria deciding which hooks apply to a transition.
//!
//! Criteria are pure predicates over the states involved in a transition.
//! They never have side effects, so evaluating them repeatedly is safe.

use super::glob::Glob;
use crate::core::State;
use std::fmt;
use std::sync::Arc;

/// Predicate over a state.
pub type StatePredicate = Arc<dyn Fn(&State) -> bool + Send + Sync>;

/// One side (`to` or `from`) of a hook's match criteria.
///
/// # Example
///
/// ```rust
/// use waypoint::hooks::MatchCriterion;
///
/// let any = MatchCriterion::Any;
/// assert!(any.matches_name("anything"));
///
/// let admin = MatchCriterion::from("admin.**");
/// assert!(admin.matches_name("admin.users"));
/// assert!(!admin.matches_name("public"));
///
/// let either = MatchCriterion::from(["login", "logout"]);
/// assert!(either.matches_name("logout"));
/// ```
#[derive(Clone, Default)]
pub enum MatchCriterion {
    /// Matches every state, including an absent one.
    #[default]
    Any,
    Glob(Glob),
    /// Logical OR over several globs.
    AnyOf(Vec<Glob>),
    Predicate(StatePredicate),
}

impl MatchCriterion {
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(Glob::new(pattern))
    }

    pub fn any_of<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(patterns.into_iter().map(Glob::new).collect())
    }

    /// Criterion from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync).
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&State) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Evaluate against a state name alone. Predicates need a state and
    /// never match here.
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Glob(glob) => glob.matches(name),
            Self::AnyOf(globs) => globs.iter().any(|g| g.matches(name)),
            Self::Predicate(_) => false,
        }
    }

    /// Evaluate against a state, or against the bare `name` when the state
    /// could not be resolved.
    pub fn matches(&self, state: Option<&State>, name: &str) -> bool {
        match (self, state) {
            (Self::Predicate(predicate), Some(state)) => predicate(state),
            (_, Some(state)) => self.matches_name(state.name()),
            (_, None) => self.matches_name(name),
        }
    }
}

impl fmt::Debug for MatchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Glob(glob) => f.debug_tuple("Glob").field(&glob.pattern()).finish(),
            Self::AnyOf(globs) => f
                .debug_tuple("AnyOf")
                .field(&globs.iter().map(Glob::pattern).collect::<Vec<_>>())
                .finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for MatchCriterion {
    fn from(pattern: &str) -> Self {
        Self::glob(pattern)
    }
}

impl From<String> for MatchCriterion {
    fn from(pattern: String) -> Self {
        Self::glob(pattern)
    }
}

impl<const N: usize> From<[&str; N]> for MatchCriterion {
    fn from(patterns: [&str; N]) -> Self {
        Self::any_of(patterns)
    }
}

impl From<Vec<String>> for MatchCriterion {
    fn from(patterns: Vec<String>) -> Self {
        Self::any_of(patterns)
    }
}

/// `to`/`from` criteria of a hook. Both default to [`MatchCriterion::Any`].
#[derive(Clone, Debug, Default)]
pub struct MatchCriteria {
    pub to: MatchCriterion,
    pub from: MatchCriterion,
}

impl MatchCriteria {
    /// Criteria matching every transition.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn to(criterion: impl Into<MatchCriterion>) -> Self {
        Self {
            to: criterion.into(),
            from: MatchCriterion::Any,
        }
    }

    pub fn with_to(mut self, criterion: impl Into<MatchCriterion>) -> Self {
        self.to = criterion.into();
        self
    }

    pub fn with_from(mut self, criterion: impl Into<MatchCriterion>) -> Self {
        self.from = criterion.into();
        self
    }

    /// Both sides must match independently.
    pub fn matches(
        &self,
        to: Option<&State>,
        to_name: &str,
        from: Option<&State>,
        from_name: &str,
    ) -> bool {
        self.to.matches(to, to_name) && self.from.matches(from, from_name)
    }
}
