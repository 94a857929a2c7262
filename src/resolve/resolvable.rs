//! Named, lazily computed, memoized dependency values.

use crate::core::StateParams;
use crate::resolve::context::ResolveContext;
use crate::transition::{TransitionError, TransitionResult};
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::trace;

/// Future produced by a resolve function.
pub type ResolveFuture = BoxFuture<'static, TransitionResult<Value>>;

/// Function computing a resolvable value from its resolved dependencies.
pub type ResolveFn = Arc<dyn Fn(ResolveArgs) -> ResolveFuture + Send + Sync>;

/// Inputs handed to a resolve function: its declared dependencies (already
/// resolved) and the params of the path being resolved.
#[derive(Clone, Debug)]
pub struct ResolveArgs {
    values: BTreeMap<String, Value>,
    params: StateParams,
}

impl ResolveArgs {
    pub(crate) fn new(values: BTreeMap<String, Value>, params: StateParams) -> Self {
        Self { values, params }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Deserialize a dependency into a concrete type.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> TransitionResult<T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| TransitionError::UnknownDependency {
                name: name.to_string(),
            })?;
        serde_json::from_value(value.clone()).map_err(|e| TransitionError::ResolveFailed {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    pub fn params(&self) -> &StateParams {
        &self.params
    }
}

/// Declaration of a resolvable value: a name, the names it depends on, and
/// the function producing it.
///
/// Declarations are shared; every transition instantiates its own
/// [`Resolvable`] from them so memoized values never leak across transitions.
///
/// # Example
///
/// ```rust
/// use waypoint::resolve::ResolveDeclaration;
///
/// let user = ResolveDeclaration::from_fn("user", ["userId"], |args| {
///     let id: u64 = args.get_as("userId")?;
///     Ok(serde_json::json!({ "id": id }))
/// });
/// assert_eq!(user.name(), "user");
/// assert_eq!(user.deps(), ["userId".to_string()]);
/// ```
#[derive(Clone)]
pub struct ResolveDeclaration {
    name: String,
    deps: Vec<String>,
    func: ResolveFn,
}

impl ResolveDeclaration {
    /// Declare an asynchronously computed value.
    pub fn new<I, S, F, Fut>(name: impl Into<String>, deps: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(ResolveArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransitionResult<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            deps: deps.into_iter().map(Into::into).collect(),
            func: Arc::new(move |args| Box::pin(func(args))),
        }
    }

    /// Declare a value computed synchronously from its dependencies.
    pub fn from_fn<I, S, F>(name: impl Into<String>, deps: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(ResolveArgs) -> TransitionResult<Value> + Send + Sync + 'static,
    {
        Self::new(name, deps, move |args| std::future::ready(func(args)))
    }

    /// Declare a constant.
    pub fn value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::from_fn(name, Vec::<String>::new(), move |_| Ok(value.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deps(&self) -> &[String] {
        &self.deps
    }
}

impl fmt::Debug for ResolveDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveDeclaration")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish()
    }
}

/// One transition's instance of a [`ResolveDeclaration`].
///
/// The value is computed at most once; later requests get the memoized copy.
pub struct Resolvable {
    declaration: ResolveDeclaration,
    cell: OnceCell<Value>,
}

impl Resolvable {
    pub fn new(declaration: ResolveDeclaration) -> Self {
        Self {
            declaration,
            cell: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn deps(&self) -> &[String] {
        &self.declaration.deps
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    /// Memoized value, if already computed.
    pub fn value(&self) -> Option<Value> {
        self.cell.get().cloned()
    }

    /// Resolve within `context`, which must end at this resolvable's scope.
    ///
    /// `visiting` holds the names currently being resolved up the call chain.
    pub(crate) fn resolve(
        self: Arc<Self>,
        context: ResolveContext,
        mut visiting: Vec<String>,
    ) -> BoxFuture<'static, TransitionResult<Value>> {
        Box::pin(async move {
            let compute = async {
                visiting.push(self.declaration.name.clone());
                let mut values = BTreeMap::new();
                for dep in &self.declaration.deps {
                    let value = context.resolve_tracked(dep, visiting.clone()).await?;
                    values.insert(dep.clone(), value);
                }
                trace!(resolvable = %self.declaration.name, "resolving");
                let args = ResolveArgs::new(values, context.params().clone());
                (self.declaration.func)(args).await
            };
            let value = self.cell.get_or_try_init(|| compute).await?;
            Ok(value.clone())
        })
    }
}

impl fmt::Debug for Resolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvable")
            .field("name", &self.declaration.name)
            .field("deps", &self.declaration.deps)
            .field("value", &self.cell.get())
            .finish()
    }
}
