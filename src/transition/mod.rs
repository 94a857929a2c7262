//! Transition orchestration.
//!
//! A [`Transition`] diffs its source and target paths, lays matched hooks
//! out as an ordered pipeline and runs them one after another. Every step
//! first checks that its transition is still the current one; starting,
//! redirecting or aborting another transition makes the remaining steps
//! settle as `SUPERSEDED`.
//!
//! Pipeline order:
//!
//! 1. `onBefore` hooks, invoked immediately; pending results are awaited
//!    together before anything else starts.
//! 2. `onStart` (or `onInvalid` for an unresolved target) and `on` hooks.
//! 3. Eager resolution of the whole target path.
//! 4. `exiting` hooks and `on_exit` callbacks, deepest state first.
//! 5. `entering` hooks and `on_enter` callbacks, top state first.
//!
//! `onSuccess` or `onError` hooks run once the chain settles; their faults
//! are logged and never change the outcome.

mod coordinator;
mod error;
mod instance;
mod options;
mod pipeline;
mod rejection;
mod service;
mod settlement;
mod step;

pub use error::{TransitionError, TransitionResult};
pub use instance::Transition;
pub use options::TransitionOptions;
pub use rejection::{Rejection, RejectionDetail, RejectionKind};
pub use service::{is_transition, TransitionService, MAX_REDIRECTS};
pub use settlement::Settlement;
