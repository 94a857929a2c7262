//! A single attempt to move from one state to another.

use super::coordinator::Coordinator;
use super::error::{TransitionError, TransitionResult};
use super::options::TransitionOptions;
use super::pipeline::HookPipeline;
use super::rejection::{Rejection, RejectionKind};
use super::settlement::{Deferred, Settlement};
use crate::core::{calculate_tree_changes, Path, PathElement, State, StateParams, TreeChanges};
use crate::hooks::HookEvent;
use crate::registry::TargetState;
use crate::resolve::ResolveScope;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, info, warn};

pub(crate) struct TransitionInner {
    id: u64,
    created_at: DateTime<Utc>,
    from: TargetState,
    to: TargetState,
    options: TransitionOptions,
    reload_state: Option<Arc<State>>,
    coordinator: Arc<Coordinator>,
    previous: Option<Weak<TransitionInner>>,
    tree: OnceLock<TreeChanges>,
    started: AtomicBool,
    prehooks: Deferred<()>,
    posthooks: Deferred<Arc<State>>,
    redirects: Deferred<Arc<State>>,
}

/// Handle to one transition attempt.
///
/// Cloning is cheap and every clone refers to the same attempt. The tree
/// diff is computed on first use and memoized. Three settlement slots
/// report the outcome:
///
/// - [`prepromise`](Self::prepromise) settles first, before `onSuccess`
///   or `onError` hooks run;
/// - [`promise`](Self::promise) settles last, with the state entered or
///   the failure;
/// - [`redirects`](Self::redirects) follows redirects and settles with the
///   outcome of the last transition in the chain.
#[derive(Clone)]
pub struct Transition {
    inner: Arc<TransitionInner>,
}

impl Transition {
    pub(crate) fn create(
        coordinator: Arc<Coordinator>,
        from: TargetState,
        to: TargetState,
        options: TransitionOptions,
        previous: Option<Weak<TransitionInner>>,
    ) -> Self {
        let to = prepare_target(&from, to, &options);
        let reload_state = reload_state(&to, &options);
        let id = coordinator.next_id();
        let transition = Self {
            inner: Arc::new(TransitionInner {
                id,
                created_at: Utc::now(),
                from,
                to,
                options,
                reload_state,
                coordinator,
                previous,
                tree: OnceLock::new(),
                started: AtomicBool::new(false),
                prehooks: Deferred::new(),
                posthooks: Deferred::new(),
                redirects: Deferred::new(),
            }),
        };
        debug!(transition = %transition, "created transition");
        transition
    }

    pub(crate) fn downgrade(&self) -> Weak<TransitionInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<TransitionInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn coordinator(&self) -> &Arc<Coordinator> {
        &self.inner.coordinator
    }

    /// Sequence number, unique per service.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn from(&self) -> &TargetState {
        &self.inner.from
    }

    pub fn to(&self) -> &TargetState {
        &self.inner.to
    }

    pub fn from_state(&self) -> Option<&Arc<State>> {
        self.inner.from.state()
    }

    pub fn to_state(&self) -> Option<&Arc<State>> {
        self.inner.to.state()
    }

    /// Target params after inheritance and declared defaults.
    pub fn params(&self) -> &StateParams {
        self.inner.to.params()
    }

    pub fn options(&self) -> &TransitionOptions {
        &self.inner.options
    }

    /// False when the target did not resolve to a state.
    pub fn is_valid(&self) -> bool {
        self.inner.to.is_valid()
    }

    /// Tree diff between source and target, computed once.
    pub fn tree_changes(&self) -> &TreeChanges {
        self.inner.tree.get_or_init(|| {
            let from = Path::for_state(
                self.from_state(),
                self.inner.from.params().clone(),
                Arc::new(ResolveScope::root()),
            );
            let changes = calculate_tree_changes(
                from,
                self.to_state(),
                self.params(),
                self.inner.reload_state.as_ref(),
            );
            debug!(
                transition = %self,
                retained = changes.retained.len(),
                exiting = changes.exiting.len(),
                entering = changes.entering.len(),
                "calculated tree changes"
            );
            changes
        })
    }

    pub fn from_path(&self) -> &Path {
        &self.tree_changes().from
    }

    pub fn to_path(&self) -> &Path {
        &self.tree_changes().to
    }

    /// States kept active, root first.
    pub fn retained(&self) -> Vec<Arc<State>> {
        states(&self.tree_changes().retained)
    }

    /// States left, deepest first.
    pub fn exiting(&self) -> Vec<Arc<State>> {
        let mut exiting = states(&self.tree_changes().exiting);
        exiting.reverse();
        exiting
    }

    /// States entered, root first.
    pub fn entering(&self) -> Vec<Arc<State>> {
        states(&self.tree_changes().entering)
    }

    /// Same state, same non-dynamic params, and no reload requested.
    pub fn ignored(&self) -> bool {
        if self.inner.options.wants_reload() {
            return false;
        }
        match (self.from_state(), self.to_state()) {
            (Some(from), Some(to)) if Arc::ptr_eq(from, to) => {
                let declarations = to.path_params();
                let keys = declarations
                    .iter()
                    .filter(|decl| !decl.dynamic)
                    .map(|decl| decl.name.as_str());
                self.params().equals_for(self.inner.from.params(), keys)
            }
            _ => false,
        }
    }

    /// Same target state and params, from the same source state.
    pub fn is(&self, other: &Transition) -> bool {
        let same_source = match (self.from_state(), other.from_state()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_source && self.inner.to.same_as(&other.inner.to)
    }

    /// Whether this transition holds the current pointer.
    pub fn is_current(&self) -> bool {
        self.inner.coordinator.is_current(self.inner.id)
    }

    /// Transition this one was redirected from, while it is still alive.
    pub fn previous(&self) -> Option<Transition> {
        self.inner.previous.as_ref().and_then(Self::upgrade)
    }

    /// Predecessors, most recent first.
    pub fn redirect_chain(&self) -> Vec<Transition> {
        let mut chain = Vec::new();
        let mut cursor = self.previous();
        while let Some(previous) = cursor {
            cursor = previous.previous();
            chain.push(previous);
        }
        chain
    }

    /// Replace this transition with one heading to `target`.
    ///
    /// Returns `self` if `target` is where this transition already goes.
    /// Otherwise the new transition starts from the same source, records
    /// `self` as its predecessor and becomes current at once, so every
    /// remaining step of `self` is superseded.
    pub fn redirect(
        &self,
        target: TargetState,
        options: impl Into<Option<TransitionOptions>>,
    ) -> Transition {
        let options = options
            .into()
            .unwrap_or_else(|| self.inner.options.clone());
        let target = prepare_target(&self.inner.from, target, &options);
        if target.same_as(&self.inner.to) {
            debug!(transition = %self, "redirect to the same target ignored");
            return self.clone();
        }

        let next = Self::create(
            Arc::clone(&self.inner.coordinator),
            self.inner.from.clone(),
            target,
            options,
            Some(self.downgrade()),
        );
        self.inner.coordinator.set_current(&next);
        info!(from = %self, to = %next, "transition redirected");
        next
    }

    /// Give up the current pointer. Steps still to run observe supersession.
    pub fn abort(&self) {
        if self.inner.coordinator.release(self.inner.id) {
            warn!(transition = %self, "transition aborted");
        }
    }

    /// Settles with the entered state once everything has finished.
    pub fn promise(&self) -> Settlement<Arc<State>> {
        self.inner.posthooks.outcome()
    }

    /// Settles before `onSuccess`/`onError` hooks run.
    pub fn prepromise(&self) -> Settlement<()> {
        self.inner.prehooks.outcome()
    }

    /// Settles with the outcome of the final transition of a redirect chain.
    pub fn redirects(&self) -> Settlement<Arc<State>> {
        self.inner.redirects.outcome()
    }

    /// Final outcome, if already settled.
    pub fn outcome(&self) -> Option<TransitionResult<Arc<State>>> {
        self.inner.posthooks.peek()
    }

    pub fn is_settled(&self) -> bool {
        self.inner.posthooks.is_settled()
    }

    /// Execute the transition.
    ///
    /// Runs at most once; later calls wait for the first run's outcome.
    pub async fn run(&self) -> TransitionResult<Arc<State>> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!(transition = %self, "transition already started");
            return self.promise().await;
        }

        if self.ignored() {
            debug!(transition = %self, "transition ignored");
            // Staying put supersedes anything still in flight.
            self.inner.coordinator.clear();
            let err = TransitionError::from(Rejection::ignored());
            self.inner.prehooks.settle(Err(err.clone()));
            self.inner.posthooks.settle(Err(err.clone()));
            self.settle_redirects(Err(err.clone()));
            return Err(err);
        }

        self.inner.coordinator.set_current(self);
        info!(transition = %self, "transition started");

        let result = self.execute().await;
        self.finish(&result).await;
        result
    }

    async fn execute(&self) -> TransitionResult<Arc<State>> {
        let pipeline = HookPipeline::build(self);

        let mut pending = Vec::new();
        for step in pipeline.before() {
            if let Some(rest) = step.start().await? {
                pending.push(rest);
            }
        }
        for outcome in join_all(pending).await {
            outcome?;
        }

        for step in pipeline.chain() {
            step.run().await?;
        }

        self.to_state()
            .cloned()
            .ok_or_else(|| Rejection::invalid(self.inner.to.identifier()).into())
    }

    async fn finish(&self, result: &TransitionResult<Arc<State>>) {
        let elapsed_ms = (Utc::now() - self.inner.created_at).num_milliseconds();
        match result {
            Ok(state) => {
                self.inner.prehooks.settle(Ok(()));
                self.run_settled_hooks(HookEvent::OnSuccess, None).await;
                self.inner.posthooks.settle(Ok(Arc::clone(state)));
                self.settle_redirects(Ok(Arc::clone(state)));
                info!(transition = %self, elapsed_ms, "transition succeeded");
            }
            Err(err) => {
                self.inner.prehooks.settle(Err(err.clone()));
                self.run_settled_hooks(HookEvent::OnError, Some(err.clone()))
                    .await;
                self.inner.posthooks.settle(Err(err.clone()));
                // A redirect leaves the chain to be settled by its successor.
                if !err.is_redirect() {
                    self.settle_redirects(Err(err.clone()));
                }
                match err.rejection_kind() {
                    Some(RejectionKind::Superseded | RejectionKind::Aborted) => {
                        warn!(transition = %self, elapsed_ms, rejection = %err, "transition rejected");
                    }
                    Some(_) => {
                        info!(transition = %self, elapsed_ms, rejection = %err, "transition rejected");
                    }
                    None => warn!(transition = %self, elapsed_ms, error = %err, "transition failed"),
                }
            }
        }
    }

    async fn run_settled_hooks(&self, event: HookEvent, error: Option<TransitionError>) {
        for step in HookPipeline::settled(self, event, error) {
            // Faults are logged by the step itself.
            let _ = step.run().await;
        }
    }

    /// Settle `redirects` on this transition and every predecessor.
    fn settle_redirects(&self, result: TransitionResult<Arc<State>>) {
        self.inner.redirects.settle(result.clone());
        for previous in self.redirect_chain() {
            previous.inner.redirects.settle(result.clone());
        }
    }
}

/// Apply inheritance and declared defaults to a target's params.
fn prepare_target(from: &TargetState, to: TargetState, options: &TransitionOptions) -> TargetState {
    let Some(state) = to.state().cloned() else {
        return to;
    };
    let params = if options.inherit {
        from.params().inherit(to.params(), &state)
    } else {
        to.params().clone()
    };
    let params = params.with_defaults(&state.path_params());
    to.with_params(params)
}

/// State to reload from: the named state on the target path, or the top of
/// the path when no name was given.
fn reload_state(to: &TargetState, options: &TransitionOptions) -> Option<Arc<State>> {
    if !options.wants_reload() {
        return None;
    }
    let path = to.state().map(|state| state.path()).unwrap_or_default();
    match &options.reload_state {
        Some(name) => {
            let found = path.into_iter().find(|state| state.name() == name);
            if found.is_none() {
                warn!(reload_state = %name, target = %to, "reload state is not on the target path");
            }
            found
        }
        None => path.into_iter().next(),
    }
}

fn states(elements: &[PathElement]) -> Vec<Arc<State>> {
    elements.iter().map(|e| Arc::clone(e.state())).collect()
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transition#{}( {} -> {} )",
            self.inner.id, self.inner.from, self.inner.to
        )
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.inner.id)
            .field("from", &self.inner.from)
            .field("to", &self.inner.to)
            .field("options", &self.inner.options)
            .field("previous", &self.previous().map(|t| t.id()))
            .finish()
    }
}
