//! Errors raised while declaring and looking up states.

use thiserror::Error;

/// A single problem with a state declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("State name must not be empty")]
    EmptyName,

    #[error("State '{name}' is already registered")]
    DuplicateState { name: String },

    #[error("Parent '{parent}' of state '{name}' is not registered")]
    UnknownParent { name: String, parent: String },

    #[error("Param '{param}' is declared more than once on '{name}'")]
    DuplicateParam { name: String, param: String },

    #[error("Resolvable '{resolve}' is declared more than once on '{name}'")]
    DuplicateResolve { name: String, resolve: String },
}

/// Errors returned by [`crate::registry::StateRegistry`] and
/// [`crate::registry::StateBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Every problem found in one declaration.
    #[error("Invalid state declaration: {}", describe(.0))]
    Invalid(Vec<DeclarationError>),

    #[error("State '{0}' is not registered")]
    NotFound(String),

    #[error("Cannot resolve '{identifier}' relative to '{base}'")]
    BadRelative { identifier: String, base: String },

    #[error("Relative reference '{0}' needs a base state")]
    MissingBase(String),
}

fn describe(errors: &[DeclarationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
