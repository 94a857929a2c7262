//! State declarations and lookup.
//!
//! States are declared with a [`StateBuilder`] and linked into the tree by
//! a [`StateRegistry`]. Parents must be registered before their children.
//! Lookups accept absolute names (`"app.users"`) and, given a base state,
//! relative references (`".child"`, `"^"`, `"^.sibling"`).

mod builder;
mod error;
mod target;

pub use builder::{StateBuilder, StateDeclaration};
pub use error::{DeclarationError, RegistryError};
pub use target::TargetState;

use crate::core::{State, StateParams};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, trace};

/// Name-indexed set of linked states.
///
/// # Example
///
/// ```rust
/// use waypoint::registry::{StateBuilder, StateRegistry};
/// use waypoint::core::StateParams;
///
/// let registry = StateRegistry::new();
/// registry.register(StateBuilder::new("app").build().unwrap()).unwrap();
/// registry.register(StateBuilder::new("app.users").build().unwrap()).unwrap();
/// registry.register(StateBuilder::new("app.settings").build().unwrap()).unwrap();
///
/// let users = registry.find("app.users", None).unwrap();
/// assert_eq!(users.parent().map(|p| p.name()), Some("app"));
///
/// let sibling = registry.find("^.settings", Some("app.users")).unwrap();
/// assert_eq!(sibling.name(), "app.settings");
///
/// assert!(!registry.target("app.missing", StateParams::new()).is_valid());
/// ```
#[derive(Debug, Default)]
pub struct StateRegistry {
    states: RwLock<HashMap<String, Arc<State>>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `declaration` under its parent and store it.
    ///
    /// Every problem with the declaration is reported in one
    /// [`RegistryError::Invalid`].
    pub fn register(&self, declaration: StateDeclaration) -> Result<Arc<State>, RegistryError> {
        let mut states = self.states.write();

        let mut checks: Vec<Validation<(), NonEmptyVec<DeclarationError>>> =
            vec![declaration.validate()];

        if states.contains_key(&declaration.name) {
            checks.push(Validation::fail(DeclarationError::DuplicateState {
                name: declaration.name.clone(),
            }));
        }

        let parent = match declaration.parent_name() {
            Some(name) => {
                let parent = states.get(name).cloned();
                if parent.is_none() {
                    checks.push(Validation::fail(DeclarationError::UnknownParent {
                        name: declaration.name.clone(),
                        parent: name.to_string(),
                    }));
                }
                parent
            }
            None => None,
        };

        if let Validation::Failure(errors) = Validation::all_vec(checks) {
            return Err(RegistryError::Invalid(errors.iter().cloned().collect()));
        }

        let state = Arc::new(State {
            name: declaration.name,
            parent,
            params: declaration.params,
            resolve: declaration.resolve,
            on_enter: declaration.on_enter,
            on_exit: declaration.on_exit,
        });
        debug!(
            state = %state.name(),
            parent = state.parent().map(|p| p.name()).unwrap_or("<none>"),
            "registered state"
        );
        states.insert(state.name().to_string(), Arc::clone(&state));
        Ok(state)
    }

    /// Register several declarations in order, stopping at the first error.
    pub fn register_all<I>(&self, declarations: I) -> Result<Vec<Arc<State>>, RegistryError>
    where
        I: IntoIterator<Item = StateDeclaration>,
    {
        declarations
            .into_iter()
            .map(|declaration| self.register(declaration))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<State>> {
        self.states.read().get(name).cloned()
    }

    /// Look up `identifier`, resolving relative references against `base`.
    pub fn find(&self, identifier: &str, base: Option<&str>) -> Result<Arc<State>, RegistryError> {
        let name = if is_relative(identifier) {
            let base_name =
                base.ok_or_else(|| RegistryError::MissingBase(identifier.to_string()))?;
            let base_state = self
                .get(base_name)
                .ok_or_else(|| RegistryError::NotFound(base_name.to_string()))?;
            resolve_relative(identifier, &base_state)?
        } else {
            identifier.to_string()
        };
        trace!(identifier, resolved = %name, "looking up state");
        self.get(&name).ok_or(RegistryError::NotFound(name))
    }

    /// Target for `identifier`; unknown names give an invalid target.
    pub fn target(&self, identifier: &str, params: StateParams) -> TargetState {
        self.target_relative(identifier, None, params)
    }

    pub fn target_relative(
        &self,
        identifier: &str,
        base: Option<&str>,
        params: StateParams,
    ) -> TargetState {
        match self.find(identifier, base) {
            Ok(state) => TargetState::new(&state, params),
            Err(err) => {
                debug!(identifier, error = %err, "target does not resolve");
                TargetState::invalid(identifier, params)
            }
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.states.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

fn is_relative(identifier: &str) -> bool {
    identifier.starts_with('.') || identifier.starts_with('^')
}

/// Expand a leading `.` (the base itself) and any number of `^` (one level
/// up) segments, then append the remainder to the state reached.
fn resolve_relative(identifier: &str, base: &Arc<State>) -> Result<String, RegistryError> {
    let bad = || RegistryError::BadRelative {
        identifier: identifier.to_string(),
        base: base.name().to_string(),
    };

    let segments: Vec<&str> = identifier.split('.').collect();
    let mut current = Some(Arc::clone(base));
    let mut consumed = 0;
    for (index, segment) in segments.iter().enumerate() {
        match *segment {
            "" if index == 0 => consumed += 1,
            "^" => {
                // Climbing above a top-level state lands on the unnamed top.
                let state = current.ok_or_else(bad)?;
                current = state.parent().cloned();
                consumed += 1;
            }
            _ => break,
        }
    }

    let rest = segments[consumed..].join(".");
    let prefix = current.as_ref().map_or("", |s| s.name());
    let name = match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest,
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}.{rest}"),
    };

    if name.is_empty() {
        return Err(bad());
    }
    Ok(name)
}
