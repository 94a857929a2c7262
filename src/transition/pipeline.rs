//! Assembly of the ordered step lists for one transition.

use super::error::TransitionError;
use super::instance::Transition;
use super::rejection::Rejection;
use super::step::{StepBody, StepOptions, TransitionStep};
use crate::core::{Path, PathElement, State};
use crate::hooks::{EventHook, HookCallback, HookContext, HookEvent};
use crate::resolve::ResolveScope;
use std::sync::Arc;
use tracing::debug;

/// The `onBefore` steps and the sequential async chain that follows them.
pub(crate) struct HookPipeline {
    before: Vec<TransitionStep>,
    chain: Vec<TransitionStep>,
}

impl HookPipeline {
    /// Match every registered hook against `transition` and lay the steps
    /// out in execution order.
    pub(crate) fn build(transition: &Transition) -> Self {
        let builder = StepBuilder::new(transition);
        let tree = transition.tree_changes();

        let before = builder.root_steps(HookEvent::OnBefore);

        let mut chain = Vec::new();
        if transition.is_valid() {
            chain.extend(builder.root_steps(HookEvent::OnStart));
            chain.extend(builder.root_steps(HookEvent::On));
            chain.push(builder.eager_resolve(&tree.to));

            for index in (0..tree.exiting.len()).rev() {
                let path_index = tree.retained.len() + index;
                chain.extend(builder.exiting_steps(&tree.from, path_index));
            }
            for index in 0..tree.entering.len() {
                let path_index = tree.retained.len() + index;
                chain.extend(builder.entering_steps(&tree.to, path_index));
            }
        } else {
            chain.extend(builder.root_steps(HookEvent::OnInvalid));
            chain.extend(builder.root_steps(HookEvent::On));
            chain.push(builder.reject(Rejection::invalid(transition.to().identifier())));
        }

        debug!(
            transition = %transition,
            before = before.len(),
            chain = chain.len(),
            "built hook pipeline"
        );
        Self { before, chain }
    }

    /// Steps for `onSuccess` or `onError`, which run once the chain settled.
    pub(crate) fn settled(
        transition: &Transition,
        event: HookEvent,
        error: Option<TransitionError>,
    ) -> Vec<TransitionStep> {
        let mut builder = StepBuilder::new(transition);
        if let Some(error) = error {
            builder.root = builder.root.with_error(error);
        }
        builder.root_steps(event)
    }

    pub(crate) fn before(&self) -> &[TransitionStep] {
        &self.before
    }

    pub(crate) fn chain(&self) -> &[TransitionStep] {
        &self.chain
    }
}

struct StepBuilder<'a> {
    transition: &'a Transition,
    /// Context for transition-wide steps: root scope plus the whole target path.
    root: HookContext,
    root_scope: Arc<ResolveScope>,
}

impl<'a> StepBuilder<'a> {
    fn new(transition: &'a Transition) -> Self {
        let to_path = transition.to_path();
        Self {
            transition,
            root: HookContext::new(transition.clone(), to_path.resolve_context()),
            root_scope: Arc::clone(to_path.root()),
        }
    }

    fn root_steps(&self, event: HookEvent) -> Vec<TransitionStep> {
        let options = StepOptions::for_event(event);
        let to = self.transition.to();
        let from = self.transition.from();
        self.transition
            .coordinator()
            .hooks()
            .matching(
                event,
                to.state().map(Arc::as_ref),
                to.name(),
                from.state().map(Arc::as_ref),
                from.name(),
            )
            .into_iter()
            .map(|hook| {
                TransitionStep::new(
                    label(event, None, &hook.callback),
                    StepBody::Hook(hook.callback),
                    self.root.clone(),
                    Arc::clone(&self.root_scope),
                    options,
                )
            })
            .collect()
    }

    fn eager_resolve(&self, to_path: &Path) -> TransitionStep {
        TransitionStep::new(
            "eagerResolve",
            StepBody::EagerResolve(to_path.clone()),
            self.root.clone(),
            Arc::clone(&self.root_scope),
            StepOptions::default(),
        )
    }

    fn reject(&self, rejection: Rejection) -> TransitionStep {
        TransitionStep::new(
            "invalidTarget",
            StepBody::Reject(rejection),
            self.root.clone(),
            Arc::clone(&self.root_scope),
            StepOptions::default(),
        )
    }

    /// `exiting` hooks for the state at `index` of the source path, then its
    /// own `on_exit`. Hooks see the state as `from` and the overall target
    /// as `to`.
    fn exiting_steps(&self, from_path: &Path, index: usize) -> Vec<TransitionStep> {
        let Some(element) = from_path.elements().get(index) else {
            return Vec::new();
        };
        let to = self.transition.to();
        let state = element.state();
        let matched = self.transition.coordinator().hooks().matching(
            HookEvent::Exiting,
            to.state().map(Arc::as_ref),
            to.name(),
            Some(state.as_ref()),
            state.name(),
        );
        let context = self.scoped_context(from_path, index, element);
        self.state_steps(HookEvent::Exiting, element, context, matched, state.on_exit())
    }

    /// `entering` hooks for the state at `index` of the target path, then
    /// its own `on_enter`. Hooks see the state as `to` and the overall
    /// source as `from`.
    fn entering_steps(&self, to_path: &Path, index: usize) -> Vec<TransitionStep> {
        let Some(element) = to_path.elements().get(index) else {
            return Vec::new();
        };
        let from = self.transition.from();
        let state = element.state();
        let matched = self.transition.coordinator().hooks().matching(
            HookEvent::Entering,
            Some(state.as_ref()),
            state.name(),
            from.state().map(Arc::as_ref),
            from.name(),
        );
        let context = self.scoped_context(to_path, index, element);
        self.state_steps(HookEvent::Entering, element, context, matched, state.on_enter())
    }

    fn scoped_context(&self, path: &Path, index: usize, element: &PathElement) -> HookContext {
        HookContext::new(self.transition.clone(), path.resolve_context_at(index))
            .with_state(Arc::clone(element.state()))
    }

    fn state_steps(
        &self,
        event: HookEvent,
        element: &PathElement,
        context: HookContext,
        matched: Vec<EventHook>,
        own: Option<&HookCallback>,
    ) -> Vec<TransitionStep> {
        let state = element.state();
        matched
            .into_iter()
            .map(|hook| hook.callback)
            .chain(own.cloned())
            .map(|callback| {
                TransitionStep::new(
                    label(event, Some(state), &callback),
                    StepBody::Hook(callback),
                    context.clone(),
                    Arc::clone(element.scope()),
                    StepOptions::for_event(event),
                )
            })
            .collect()
    }
}

fn label(event: HookEvent, state: Option<&Arc<State>>, callback: &HookCallback) -> String {
    let name = callback.name().unwrap_or("hook");
    match state {
        Some(state) => format!("{event}:{}:{name}", state.name()),
        None => format!("{event}:{name}"),
    }
}
