//! One unit of work in a transition's hook pipeline.

use super::error::TransitionResult;
use super::instance::Transition;
use super::rejection::Rejection;
use crate::core::Path;
use crate::hooks::{HookCallback, HookContext, HookEvent, HookResult};
use crate::resolve::{ResolvePolicy, ResolveScope};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::{error, trace};

/// Result of a step that has not finished yet.
pub(crate) type PendingStep = BoxFuture<'static, TransitionResult<()>>;

/// What a step does when it runs.
#[derive(Clone)]
pub(crate) enum StepBody {
    Hook(HookCallback),
    /// Resolve every value on the path before anything is entered.
    EagerResolve(Path),
    /// Fail with a fixed rejection.
    Reject(Rejection),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct StepOptions {
    /// Resolve dependencies before invoking instead of requiring them memoized.
    pub is_async: bool,
    pub reject_if_superseded: bool,
    /// Log faults instead of failing the step.
    pub swallow_faults: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            is_async: true,
            reject_if_superseded: true,
            swallow_faults: false,
        }
    }
}

impl StepOptions {
    /// Options for the steps of `event`.
    pub(crate) fn for_event(event: HookEvent) -> Self {
        match event {
            HookEvent::OnSuccess | HookEvent::OnError => Self::settled(),
            event if event.is_async() => Self::default(),
            _ => Self::immediate(),
        }
    }

    /// `onBefore` steps: invoked immediately, faults propagate.
    fn immediate() -> Self {
        Self {
            is_async: false,
            ..Self::default()
        }
    }

    /// `onSuccess`/`onError` steps: run after settling, faults logged.
    fn settled() -> Self {
        Self {
            is_async: false,
            reject_if_superseded: false,
            swallow_faults: true,
        }
    }
}

/// A matched hook bound to the context it runs in.
#[derive(Clone)]
pub(crate) struct TransitionStep {
    label: String,
    body: StepBody,
    context: HookContext,
    /// Scope receiving [`HookResult::AddResolvables`].
    scope: Arc<ResolveScope>,
    options: StepOptions,
}

impl TransitionStep {
    pub(crate) fn new(
        label: impl Into<String>,
        body: StepBody,
        context: HookContext,
        scope: Arc<ResolveScope>,
        options: StepOptions,
    ) -> Self {
        Self {
            label: label.into(),
            body,
            context,
            scope,
            options,
        }
    }

    fn transition(&self) -> &Transition {
        self.context.transition()
    }

    /// `SUPERSEDED` if the owning transition lost the current pointer.
    fn superseded(&self) -> Option<Rejection> {
        if !self.options.reject_if_superseded || self.transition().is_current() {
            return None;
        }
        let current = self.transition().coordinator().current();
        let redirected = current
            .as_ref()
            .and_then(Transition::previous)
            .is_some_and(|previous| previous.id() == self.transition().id());
        Some(Rejection::superseded(current, redirected))
    }

    async fn invoke(&self) -> TransitionResult<HookResult> {
        match &self.body {
            StepBody::Hook(callback) if self.options.is_async => {
                callback.invoke_later(&self.context).await
            }
            StepBody::Hook(callback) => callback.invoke_now(&self.context).await,
            StepBody::EagerResolve(path) => path
                .resolve(ResolvePolicy::Eager)
                .await
                .map(|_| HookResult::Continue),
            StepBody::Reject(rejection) => Err(rejection.clone().into()),
        }
    }

    /// Run to completion, waiting on any pending result.
    pub(crate) async fn run(&self) -> TransitionResult<()> {
        if let Some(rejection) = self.superseded() {
            trace!(step = %self.label, "skipping step of superseded transition");
            return Err(rejection.into());
        }
        trace!(step = %self.label, "running step");
        let result = self.invoke().await;
        let outcome = self.interpret(result).await;
        self.finish(outcome)
    }

    /// Invoke now; a pending result is handed back unawaited so callers
    /// can collect several and wait on them together.
    pub(crate) async fn start(&self) -> TransitionResult<Option<PendingStep>> {
        if let Some(rejection) = self.superseded() {
            return Err(rejection.into());
        }
        trace!(step = %self.label, "starting step");
        match self.invoke().await {
            Ok(HookResult::Pending(future)) => {
                let step = self.clone();
                Ok(Some(Box::pin(async move {
                    let outcome = step.interpret(future.await).await;
                    step.finish(outcome)
                })))
            }
            result => {
                let outcome = self.interpret(result).await;
                self.finish(outcome).map(|_| None)
            }
        }
    }

    fn finish(&self, outcome: TransitionResult<()>) -> TransitionResult<()> {
        match outcome {
            Err(err) if self.options.swallow_faults => {
                error!(step = %self.label, error = %err, "hook failed after settling");
                Ok(())
            }
            outcome => outcome,
        }
    }

    /// Turn a hook result into the step outcome.
    fn interpret(&self, result: TransitionResult<HookResult>) -> BoxFuture<'_, TransitionResult<()>> {
        Box::pin(async move {
            let result = result?;
            if let Some(rejection) = self.superseded() {
                return Err(rejection.into());
            }
            match result {
                HookResult::Continue => Ok(()),
                HookResult::Abort => {
                    Err(Rejection::aborted(format!("{} returned false", self.label)).into())
                }
                // Redirecting to itself is a no-op.
                HookResult::RedirectTo(target) if target.id() == self.transition().id() => Ok(()),
                HookResult::RedirectTo(target) => Err(Rejection::redirected(target).into()),
                HookResult::Pending(future) => self.interpret(future.await).await,
                HookResult::AddResolvables(declarations) => {
                    trace!(
                        step = %self.label,
                        count = declarations.len(),
                        "hook added resolvables"
                    );
                    self.scope.extend(declarations);
                    Ok(())
                }
            }
        })
    }
}

impl fmt::Debug for TransitionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionStep")
            .field("label", &self.label)
            .field("options", &self.options)
            .finish()
    }
}
