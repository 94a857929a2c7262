//! Storage and priority ordering of lifecycle hooks.

use super::callback::HookCallback;
use super::criteria::MatchCriteria;
use crate::core::State;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Pipeline phase a hook is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookEvent {
    /// Runs synchronously before anything else.
    OnBefore,
    /// Runs when the target state could not be resolved.
    OnInvalid,
    /// Runs first in the async chain for a valid target.
    OnStart,
    On,
    /// Runs once per entering state, root first.
    Entering,
    /// Runs once per exiting state, leaf first.
    Exiting,
    OnSuccess,
    OnError,
}

impl HookEvent {
    pub const ALL: [HookEvent; 8] = [
        Self::OnBefore,
        Self::OnInvalid,
        Self::OnStart,
        Self::On,
        Self::Entering,
        Self::Exiting,
        Self::OnSuccess,
        Self::OnError,
    ];

    /// Whether steps for this event run in the sequential async chain.
    pub fn is_async(self) -> bool {
        matches!(
            self,
            Self::OnInvalid | Self::OnStart | Self::On | Self::Entering | Self::Exiting
        )
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OnBefore => "onBefore",
            Self::OnInvalid => "onInvalid",
            Self::OnStart => "onStart",
            Self::On => "on",
            Self::Entering => "entering",
            Self::Exiting => "exiting",
            Self::OnSuccess => "onSuccess",
            Self::OnError => "onError",
        };
        f.write_str(name)
    }
}

/// Registration options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookOptions {
    /// Lower numbers run first; ties keep registration order.
    pub priority: i32,
}

impl HookOptions {
    pub fn priority(priority: i32) -> Self {
        Self { priority }
    }
}

/// A registered hook.
#[derive(Clone, Debug)]
pub struct EventHook {
    pub criteria: MatchCriteria,
    pub callback: HookCallback,
    pub priority: i32,
}

impl EventHook {
    pub fn matches(
        &self,
        to: Option<&State>,
        to_name: &str,
        from: Option<&State>,
        from_name: &str,
    ) -> bool {
        self.criteria.matches(to, to_name, from, from_name)
    }
}

/// Per-event lists of hooks, each kept sorted by ascending priority.
///
/// Hooks are registered at configuration time and never removed.
///
/// # Example
///
/// ```rust
/// use waypoint::hooks::{HookCallback, HookEvent, HookOptions, HookRegistry, HookResult, MatchCriteria};
///
/// let registry = HookRegistry::new();
/// let noop = HookCallback::from_fn(|_| Ok(HookResult::Continue));
///
/// registry.on(MatchCriteria::any(), noop.clone().named("late"), HookOptions::priority(5));
/// registry.on(MatchCriteria::any(), noop.named("early"), HookOptions::priority(1));
///
/// let names: Vec<_> = registry
///     .hooks(HookEvent::On)
///     .iter()
///     .map(|h| h.callback.name().unwrap_or_default().to_string())
///     .collect();
/// assert_eq!(names, vec!["early", "late"]);
/// ```
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<HookEvent, Vec<EventHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to `event`'s list and restore priority order.
    pub fn register(
        &self,
        event: HookEvent,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        let options = options.into().unwrap_or_default();
        debug!(
            event = %event,
            priority = options.priority,
            hook = callback.name().unwrap_or("<anonymous>"),
            "registering hook"
        );
        let mut hooks = self.hooks.write();
        let list = hooks.entry(event).or_default();
        list.push(EventHook {
            criteria,
            callback,
            priority: options.priority,
        });
        list.sort_by_key(|hook| hook.priority);
    }

    /// Registration function bound to one event.
    pub fn registrar(
        &self,
        event: HookEvent,
    ) -> impl Fn(MatchCriteria, HookCallback, Option<HookOptions>) + '_ {
        move |criteria, callback, options| self.register(event, criteria, callback, options)
    }

    pub fn on_before(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::OnBefore, criteria, callback, options);
    }

    pub fn on_invalid(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::OnInvalid, criteria, callback, options);
    }

    pub fn on_start(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::OnStart, criteria, callback, options);
    }

    pub fn on(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::On, criteria, callback, options);
    }

    pub fn entering(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::Entering, criteria, callback, options);
    }

    pub fn exiting(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::Exiting, criteria, callback, options);
    }

    pub fn on_success(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::OnSuccess, criteria, callback, options);
    }

    pub fn on_error(
        &self,
        criteria: MatchCriteria,
        callback: HookCallback,
        options: impl Into<Option<HookOptions>>,
    ) {
        self.register(HookEvent::OnError, criteria, callback, options);
    }

    /// Snapshot of `event`'s hooks in execution order.
    pub fn hooks(&self, event: HookEvent) -> Vec<EventHook> {
        self.hooks.read().get(&event).cloned().unwrap_or_default()
    }

    /// Hooks of `event` whose criteria accept the given `to`/`from` pair.
    pub fn matching(
        &self,
        event: HookEvent,
        to: Option<&State>,
        to_name: &str,
        from: Option<&State>,
        from_name: &str,
    ) -> Vec<EventHook> {
        self.hooks
            .read()
            .get(&event)
            .map(|list| {
                list.iter()
                    .filter(|hook| hook.matches(to, to_name, from, from_name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self, event: HookEvent) -> usize {
        self.hooks.read().get(&event).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().values().all(Vec::is_empty)
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.read();
        let mut map = f.debug_map();
        for event in HookEvent::ALL {
            if let Some(list) = hooks.get(&event) {
                map.entry(&event, &list.len());
            }
        }
        map.finish()
    }
}
