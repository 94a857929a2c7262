//! Dependency resolution.
//!
//! Each state may declare named values it needs before it can be entered.
//! A transition instantiates those declarations into per-state
//! [`ResolveScope`]s; a [`ResolveContext`] chains the scopes of a path so
//! lookups see the state's own values and those of its ancestors.
//!
//! Values are computed lazily and memoized for the lifetime of the
//! transition. Hooks can add new declarations while the transition runs.

mod context;
mod resolvable;

pub use context::{ResolveContext, ResolvePolicy, ResolveScope};
pub use resolvable::{ResolveArgs, ResolveDeclaration, ResolveFn, ResolveFuture, Resolvable};
