//! Lifecycle hooks.
//!
//! Hooks are callbacks attached to a pipeline phase ([`HookEvent`]) and
//! filtered by [`MatchCriteria`] over the `to`/`from` states of a
//! transition. Each callback is a factory of Stillwater effects whose
//! environment is the [`HookContext`]; its [`HookResult`] steers the
//! pipeline (continue, abort, redirect, inject values, or wait).

mod callback;
mod context;
mod criteria;
mod glob;
mod registry;

pub use callback::{HookCallback, HookEffect, HookFactory, HookResult};
pub use context::HookContext;
pub use criteria::{MatchCriteria, MatchCriterion, StatePredicate};
pub use glob::Glob;
pub use registry::{EventHook, HookEvent, HookOptions, HookRegistry};
