//! Fluent construction of state declarations.

use super::error::{DeclarationError, RegistryError};
use crate::core::ParamDeclaration;
use crate::hooks::HookCallback;
use crate::resolve::ResolveDeclaration;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Declarative description of a state, before it is linked into the tree.
#[derive(Clone, Debug)]
pub struct StateDeclaration {
    pub name: String,
    /// Explicit parent. When absent, a dotted name implies its parent
    /// (`"app.users"` is a child of `"app"`).
    pub parent: Option<String>,
    pub params: Vec<ParamDeclaration>,
    pub resolve: Vec<ResolveDeclaration>,
    pub on_enter: Option<HookCallback>,
    pub on_exit: Option<HookCallback>,
}

impl StateDeclaration {
    /// Parent name, explicit or implied by the dotted name.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent
            .as_deref()
            .or_else(|| self.name.rsplit_once('.').map(|(parent, _)| parent))
    }

    /// Check the declaration on its own, reporting every problem at once.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<DeclarationError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<DeclarationError>>> = Vec::new();

        if self.name.trim().is_empty() {
            checks.push(Validation::fail(DeclarationError::EmptyName));
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                checks.push(Validation::fail(DeclarationError::DuplicateParam {
                    name: self.name.clone(),
                    param: param.name.clone(),
                }));
            }
        }

        let mut seen = HashSet::new();
        for declaration in &self.resolve {
            if !seen.insert(declaration.name()) {
                checks.push(Validation::fail(DeclarationError::DuplicateResolve {
                    name: self.name.clone(),
                    resolve: declaration.name().to_string(),
                }));
            }
        }

        checks.push(Validation::success(()));
        Validation::all_vec(checks).map(|_| ())
    }
}

/// Builder for [`StateDeclaration`]s.
///
/// # Example
///
/// ```rust
/// use waypoint::registry::StateBuilder;
/// use waypoint::resolve::ResolveDeclaration;
///
/// let declaration = StateBuilder::new("app.users.detail")
///     .param("id")
///     .dynamic_param("tab")
///     .resolve(ResolveDeclaration::value("title", "Users"))
///     .build()
///     .unwrap();
///
/// assert_eq!(declaration.parent_name(), Some("app.users"));
/// assert_eq!(declaration.params.len(), 2);
/// ```
pub struct StateBuilder {
    name: String,
    parent: Option<String>,
    params: Vec<ParamDeclaration>,
    resolve: Vec<ResolveDeclaration>,
    on_enter: Option<HookCallback>,
    on_exit: Option<HookCallback>,
}

impl StateBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            params: Vec::new(),
            resolve: Vec::new(),
            on_enter: None,
            on_exit: None,
        }
    }

    /// Set the parent explicitly instead of deriving it from the name.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn param(self, name: impl Into<String>) -> Self {
        self.declare_param(ParamDeclaration::new(name))
    }

    pub fn dynamic_param(self, name: impl Into<String>) -> Self {
        self.declare_param(ParamDeclaration::new(name).dynamic())
    }

    pub fn declare_param(mut self, declaration: ParamDeclaration) -> Self {
        self.params.push(declaration);
        self
    }

    pub fn resolve(mut self, declaration: ResolveDeclaration) -> Self {
        self.resolve.push(declaration);
        self
    }

    pub fn on_enter(mut self, callback: HookCallback) -> Self {
        self.on_enter = Some(callback);
        self
    }

    pub fn on_exit(mut self, callback: HookCallback) -> Self {
        self.on_exit = Some(callback);
        self
    }

    /// Validate and produce the declaration.
    pub fn build(self) -> Result<StateDeclaration, RegistryError> {
        let declaration = StateDeclaration {
            name: self.name,
            parent: self.parent,
            params: self.params,
            resolve: self.resolve,
            on_enter: self.on_enter,
            on_exit: self.on_exit,
        };

        match declaration.validate() {
            Validation::Success(_) => Ok(declaration),
            Validation::Failure(errors) => {
                Err(RegistryError::Invalid(errors.iter().cloned().collect()))
            }
        }
    }
}
