//! Waypoint: transitions between states of a hierarchical state tree.
//!
//! A transition moves an application from one state (plus params) to
//! another. Waypoint computes which states are kept, left and entered,
//! runs lifecycle hooks in a fixed order, resolves the values each state
//! depends on, and lets a newer transition cooperatively cancel an older
//! one.
//!
//! # Core Concepts
//!
//! - **State tree**: [`State`]s declared through a [`StateRegistry`]; dotted
//!   names (`"app.users"`) place a state under its parent
//! - **Tree diff**: retained, exiting and entering states, where a change to
//!   a non-dynamic param re-enters the state that declares it
//! - **Hooks**: Stillwater effects attached to pipeline phases and filtered
//!   by glob or predicate criteria on the `to`/`from` states
//! - **Resolvables**: named, memoized values computed from params and other
//!   resolvables, injectable into hooks
//! - **Supersession**: one current transition per service; starting,
//!   redirecting or aborting another settles the old one as `SUPERSEDED`
//!
//! # Example
//!
//! ```rust
//! use waypoint::core::StateParams;
//! use waypoint::hooks::{HookCallback, HookResult, MatchCriteria};
//! use waypoint::registry::{StateBuilder, StateRegistry};
//! use waypoint::resolve::ResolveDeclaration;
//! use waypoint::transition::{RejectionKind, TransitionOptions, TransitionService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = StateRegistry::new();
//! registry.register(StateBuilder::new("app").build().unwrap()).unwrap();
//! registry
//!     .register(
//!         StateBuilder::new("app.user")
//!             .param("id")
//!             .resolve(ResolveDeclaration::from_fn("greeting", Vec::<String>::new(), |args| {
//!                 Ok(format!("hello {}", args.params().get("id").cloned().unwrap_or_default()).into())
//!             }))
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//! registry.register(StateBuilder::new("admin").build().unwrap()).unwrap();
//!
//! let service = TransitionService::new(registry);
//! service.hooks().on_start(
//!     MatchCriteria::to("admin"),
//!     HookCallback::from_fn(|_| Ok(HookResult::Abort)),
//!     None,
//! );
//!
//! let from = service.target("app", StateParams::new());
//! let to = service.target("app.user", StateParams::new().with("id", 7));
//! let transition = service.create(from.clone(), to, TransitionOptions::default());
//!
//! let entered = transition.run().await.unwrap();
//! assert_eq!(entered.name(), "app.user");
//! assert_eq!(transition.retained()[0].name(), "app");
//! assert!(transition.to_path().resolve_context().peek("greeting").is_some());
//!
//! let denied = service
//!     .transition_to(from, service.target("admin", StateParams::new()), TransitionOptions::default())
//!     .await
//!     .unwrap_err();
//! assert_eq!(denied.rejection_kind(), Some(RejectionKind::Aborted));
//! # }
//! ```

pub mod core;
pub mod hooks;
pub mod registry;
pub mod resolve;
pub mod transition;

// Re-export commonly used types
pub use core::{Path, State, StateParams, TreeChanges};
pub use hooks::{HookCallback, HookContext, HookEvent, HookResult, MatchCriteria};
pub use registry::{StateBuilder, StateRegistry, TargetState};
pub use resolve::{ResolveDeclaration, ResolvePolicy};
pub use transition::{
    Rejection, RejectionKind, Transition, TransitionError, TransitionOptions, TransitionResult,
    TransitionService,
};
