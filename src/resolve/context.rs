//! Resolve scopes and the chained context used to look values up.

use crate::core::{State, StateParams};
use crate::resolve::resolvable::{ResolveDeclaration, Resolvable};
use crate::transition::{TransitionError, TransitionResult};
use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// When a path's resolvables are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvePolicy {
    /// Compute every resolvable up front.
    Eager,
    /// Compute only when something asks for the value.
    #[default]
    Lazy,
}

/// The resolvables owned by one state (or by the transition root) within
/// one transition.
///
/// Scopes can be extended while a transition runs; a later declaration with
/// the same name replaces the earlier one.
pub struct ResolveScope {
    owner: Option<String>,
    resolvables: RwLock<Vec<Arc<Resolvable>>>,
}

impl ResolveScope {
    /// Transition-level scope not tied to any state.
    pub fn root() -> Self {
        Self {
            owner: None,
            resolvables: RwLock::new(Vec::new()),
        }
    }

    /// Fresh scope holding new instances of the state's declarations.
    pub fn for_state(state: &State) -> Self {
        let scope = Self {
            owner: Some(state.name().to_string()),
            resolvables: RwLock::new(Vec::new()),
        };
        scope.extend(state.resolvables().iter().cloned());
        scope
    }

    /// Name of the owning state, `None` for the root scope.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn add(&self, declaration: ResolveDeclaration) {
        let resolvable = Arc::new(Resolvable::new(declaration));
        let mut resolvables = self.resolvables.write();
        resolvables.retain(|r| r.name() != resolvable.name());
        resolvables.push(resolvable);
    }

    pub fn extend<I>(&self, declarations: I)
    where
        I: IntoIterator<Item = ResolveDeclaration>,
    {
        for declaration in declarations {
            self.add(declaration);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Resolvable>> {
        self.resolvables
            .read()
            .iter()
            .find(|r| r.name() == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.resolvables
            .read()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }
}

impl fmt::Debug for ResolveScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveScope")
            .field("owner", &self.owner)
            .field("resolvables", &self.names())
            .finish()
    }
}

/// Chain of scopes, root first, through which names are looked up.
///
/// Lookup walks from the deepest scope towards the root, so a state can
/// shadow a value provided by one of its ancestors.
#[derive(Clone, Debug)]
pub struct ResolveContext {
    scopes: Vec<Arc<ResolveScope>>,
    params: StateParams,
}

impl ResolveContext {
    pub fn new(scopes: Vec<Arc<ResolveScope>>, params: StateParams) -> Self {
        Self { scopes, params }
    }

    /// Context with a single empty root scope.
    pub fn detached(params: StateParams) -> Self {
        Self::new(vec![Arc::new(ResolveScope::root())], params)
    }

    pub fn params(&self) -> &StateParams {
        &self.params
    }

    pub fn scopes(&self) -> &[Arc<ResolveScope>] {
        &self.scopes
    }

    /// Deepest scope of the chain.
    pub fn tail(&self) -> Option<&Arc<ResolveScope>> {
        self.scopes.last()
    }

    /// Context made of the first `len` scopes.
    pub fn truncated(&self, len: usize) -> ResolveContext {
        Self {
            scopes: self.scopes[..len.min(self.scopes.len())].to_vec(),
            params: self.params.clone(),
        }
    }

    fn find(&self, name: &str) -> Option<(usize, Arc<Resolvable>)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, scope)| scope.get(name).map(|r| (index, r)))
    }

    /// True if `name` is visible from this context.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Memoized value of `name`, without triggering resolution.
    pub fn peek(&self, name: &str) -> Option<Value> {
        self.find(name).and_then(|(_, r)| r.value())
    }

    /// Resolve `name`, computing it (and its dependencies) if needed.
    pub fn resolve(&self, name: &str) -> BoxFuture<'static, TransitionResult<Value>> {
        self.resolve_tracked(name, Vec::new())
    }

    pub(crate) fn resolve_tracked(
        &self,
        name: &str,
        visiting: Vec<String>,
    ) -> BoxFuture<'static, TransitionResult<Value>> {
        let found = self.find(name);
        let context = self.clone();
        let name = name.to_string();
        Box::pin(async move {
            let Some((index, resolvable)) = found else {
                return Err(TransitionError::UnknownDependency { name });
            };
            if visiting.contains(&name) {
                return Err(TransitionError::CircularDependency { name });
            }
            resolvable
                .resolve(context.truncated(index + 1), visiting)
                .await
        })
    }

    /// Apply `policy` to every resolvable in the chain, root first.
    pub async fn resolve_all(&self, policy: ResolvePolicy) -> TransitionResult<()> {
        if policy == ResolvePolicy::Lazy {
            return Ok(());
        }
        for (index, scope) in self.scopes.iter().enumerate() {
            let scoped = self.truncated(index + 1);
            for name in scope.names() {
                scoped.resolve(&name).await?;
            }
        }
        Ok(())
    }
}
