//! Hook callbacks and the results they hand back to the pipeline.

use super::context::HookContext;
use crate::resolve::ResolveDeclaration;
use crate::transition::{Transition, TransitionError, TransitionResult};
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;

/// What a hook tells the pipeline to do next.
pub enum HookResult {
    /// Carry on; no effect on the transition.
    Continue,
    /// Stop the transition with an `ABORTED` rejection.
    Abort,
    /// Stop the transition and hand over to another one.
    RedirectTo(Transition),
    /// Make new values injectable for every later step.
    AddResolvables(Vec<ResolveDeclaration>),
    /// Result not known yet; interpreted once the future settles.
    Pending(BoxFuture<'static, TransitionResult<HookResult>>),
}

impl HookResult {
    /// Wrap a future whose output is interpreted like any other result.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = TransitionResult<HookResult>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }
}

/// `false` aborts, `true` continues.
impl From<bool> for HookResult {
    fn from(proceed: bool) -> Self {
        if proceed {
            Self::Continue
        } else {
            Self::Abort
        }
    }
}

impl From<()> for HookResult {
    fn from(_: ()) -> Self {
        Self::Continue
    }
}

impl From<Transition> for HookResult {
    fn from(target: Transition) -> Self {
        Self::RedirectTo(target)
    }
}

impl From<Vec<ResolveDeclaration>> for HookResult {
    fn from(declarations: Vec<ResolveDeclaration>) -> Self {
        Self::AddResolvables(declarations)
    }
}

impl fmt::Debug for HookResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Abort => f.write_str("Abort"),
            Self::RedirectTo(t) => f.debug_tuple("RedirectTo").field(&t.id()).finish(),
            Self::AddResolvables(decls) => f
                .debug_tuple("AddResolvables")
                .field(&decls.iter().map(|d| d.name()).collect::<Vec<_>>())
                .finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Effect run for one hook invocation; the hook context is its environment.
pub type HookEffect = BoxedEffect<HookResult, TransitionError, HookContext>;

/// Factory producing a fresh effect for each invocation.
pub type HookFactory = Arc<dyn Fn() -> HookEffect + Send + Sync>;

/// A hook body plus the dependency names it wants injected.
///
/// Instead of storing the effect directly we store a factory that creates a
/// fresh effect on each execution, so one callback can run in any number of
/// transitions.
///
/// # Example
///
/// ```rust
/// use waypoint::hooks::{HookCallback, HookResult};
///
/// let guard = HookCallback::from_fn(|ctx| {
///     let signed_in = ctx.get("session").is_some();
///     Ok(HookResult::from(signed_in))
/// })
/// .with_deps(["session"])
/// .named("require-session");
///
/// assert_eq!(guard.deps(), ["session".to_string()]);
/// assert_eq!(guard.name(), Some("require-session"));
/// ```
#[derive(Clone)]
pub struct HookCallback {
    factory: HookFactory,
    deps: Vec<String>,
    name: Option<String>,
}

impl HookCallback {
    /// Callback from a raw effect factory.
    pub fn new<E>(factory: E) -> Self
    where
        E: Fn() -> HookEffect + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            deps: Vec::new(),
            name: None,
        }
    }

    /// Callback from a plain synchronous closure.
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn(&HookContext) -> TransitionResult<HookResult> + Send + Sync + 'static,
    {
        let body = Arc::new(body);
        Self::new(move || {
            let body = Arc::clone(&body);
            from_fn(move |ctx: &HookContext| body(ctx)).boxed()
        })
    }

    /// Callback from a closure returning a future. The pipeline sees a
    /// [`HookResult::Pending`] and waits for it.
    pub fn from_future<F, Fut>(body: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransitionResult<HookResult>> + Send + 'static,
    {
        Self::from_fn(move |ctx| Ok(HookResult::pending(body(ctx.clone()))))
    }

    /// Names resolved before the callback runs.
    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Label used in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Run with dependencies taken from already memoized values only.
    pub(crate) async fn invoke_now(&self, ctx: &HookContext) -> TransitionResult<HookResult> {
        if let Some(missing) = self.deps.iter().find(|dep| ctx.get(dep).is_none()) {
            return Err(TransitionError::Unresolved {
                name: missing.clone(),
            });
        }
        (self.factory)().run(ctx).await
    }

    /// Resolve declared dependencies first, then run.
    pub(crate) async fn invoke_later(&self, ctx: &HookContext) -> TransitionResult<HookResult> {
        for dep in &self.deps {
            ctx.resolve(dep).await?;
        }
        (self.factory)().run(ctx).await
    }
}

impl fmt::Debug for HookCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCallback")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish()
    }
}
