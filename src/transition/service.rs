//! Entry point owning the registries and the current-transition pointer.

use super::coordinator::Coordinator;
use super::error::{TransitionError, TransitionResult};
use super::instance::Transition;
use super::options::TransitionOptions;
use crate::core::{State, StateParams};
use crate::hooks::HookRegistry;
use crate::registry::{StateRegistry, TargetState};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

/// Redirects followed by [`TransitionService::transition_to`] before giving up.
pub const MAX_REDIRECTS: usize = 20;

/// Creates and sequences transitions over one state tree.
///
/// At most one transition created by a service is current at a time;
/// starting another supersedes it.
///
/// # Example
///
/// ```rust
/// use waypoint::core::StateParams;
/// use waypoint::hooks::{HookCallback, HookResult, MatchCriteria};
/// use waypoint::registry::{StateBuilder, StateRegistry};
/// use waypoint::transition::{TransitionOptions, TransitionService};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = StateRegistry::new();
/// registry.register(StateBuilder::new("home").build().unwrap()).unwrap();
/// registry.register(StateBuilder::new("about").build().unwrap()).unwrap();
///
/// let service = TransitionService::new(registry);
/// service.hooks().on_start(
///     MatchCriteria::to("about"),
///     HookCallback::from_fn(|_| Ok(HookResult::Continue)),
///     None,
/// );
///
/// let home = service.target("home", StateParams::new());
/// let about = service.target("about", StateParams::new());
/// let entered = service
///     .transition_to(home, about, TransitionOptions::default())
///     .await
///     .unwrap();
/// assert_eq!(entered.name(), "about");
/// # }
/// ```
pub struct TransitionService {
    registry: Arc<StateRegistry>,
    coordinator: Arc<Coordinator>,
}

impl TransitionService {
    pub fn new(registry: StateRegistry) -> Self {
        Self::with_registry(Arc::new(registry))
    }

    pub fn with_registry(registry: Arc<StateRegistry>) -> Self {
        Self {
            registry,
            coordinator: Arc::new(Coordinator::new(HookRegistry::new())),
        }
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    /// Hook registration for every transition this service creates.
    pub fn hooks(&self) -> &HookRegistry {
        self.coordinator.hooks()
    }

    /// Transition currently holding the pointer, if any.
    pub fn current(&self) -> Option<Transition> {
        self.coordinator.current()
    }

    /// Resolve an absolute state name into a target.
    pub fn target(&self, identifier: &str, params: StateParams) -> TargetState {
        self.registry.target(identifier, params)
    }

    /// Build a transition without running it.
    pub fn create(
        &self,
        from: TargetState,
        to: TargetState,
        options: TransitionOptions,
    ) -> Transition {
        Transition::create(Arc::clone(&self.coordinator), from, to, options, None)
    }

    /// Build a transition to `identifier`, resolving relative references
    /// against `options.relative` or, failing that, the source state.
    pub fn go(
        &self,
        from: &TargetState,
        identifier: &str,
        params: StateParams,
        options: TransitionOptions,
    ) -> Transition {
        let base = options
            .relative
            .as_deref()
            .or_else(|| from.state().map(|state| state.name()));
        let to = self.registry.target_relative(identifier, base, params);
        self.create(from.clone(), to, options)
    }

    /// Run a transition and follow any redirects it ends with.
    pub async fn transition_to(
        &self,
        from: TargetState,
        to: TargetState,
        options: TransitionOptions,
    ) -> TransitionResult<Arc<State>> {
        self.follow(self.create(from, to, options)).await
    }

    /// Run `transition`, then each transition it redirects to.
    pub async fn follow(&self, transition: Transition) -> TransitionResult<Arc<State>> {
        // Predecessors stay alive until the chain settles their `redirects`.
        let mut chain = vec![transition];
        loop {
            let Some(transition) = chain.last().cloned() else {
                return Err(TransitionError::Dropped);
            };
            match transition.run().await {
                Err(err) if err.is_redirect() => {
                    let Some(next) = err.rejection().and_then(|r| r.transition()).cloned() else {
                        return Err(err);
                    };
                    if chain.len() > MAX_REDIRECTS {
                        warn!(transition = %transition, limit = MAX_REDIRECTS, "too many redirects");
                        return Err(TransitionError::TooManyRedirects {
                            limit: MAX_REDIRECTS,
                        });
                    }
                    debug!(from = %transition, to = %next, "following redirect");
                    chain.push(next);
                }
                outcome => return outcome,
            }
        }
    }
}

/// True if `value` is a [`Transition`].
pub fn is_transition(value: &dyn Any) -> bool {
    value.is::<Transition>()
}
