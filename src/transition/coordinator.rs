//! Shared state of every transition created by one service.

use super::instance::{Transition, TransitionInner};
use crate::hooks::HookRegistry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

/// Hook registry, id counter and the "current transition" pointer.
///
/// The pointer is weak: a transition nobody holds any more cannot stay
/// current, and a settled transition never keeps itself alive through it.
#[derive(Default)]
pub(crate) struct Coordinator {
    hooks: HookRegistry,
    current: Mutex<Option<(u64, Weak<TransitionInner>)>>,
    next_id: AtomicU64,
}

impl Coordinator {
    pub(crate) fn new(hooks: HookRegistry) -> Self {
        Self {
            hooks,
            ..Self::default()
        }
    }

    pub(crate) fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn set_current(&self, transition: &Transition) {
        *self.current.lock() = Some((transition.id(), transition.downgrade()));
    }

    pub(crate) fn is_current(&self, id: u64) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|(current, _)| *current == id)
    }

    pub(crate) fn current(&self) -> Option<Transition> {
        self.current
            .lock()
            .as_ref()
            .and_then(|(_, weak)| Transition::upgrade(weak))
    }

    /// Mark no transition as current.
    pub(crate) fn clear(&self) {
        *self.current.lock() = None;
    }

    /// Clear the pointer if `id` holds it. Returns whether it did.
    pub(crate) fn release(&self, id: u64) -> bool {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|(held, _)| *held == id) {
            *current = None;
            return true;
        }
        false
    }
}
