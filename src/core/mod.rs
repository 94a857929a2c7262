//! Core data layer of the state tree.
//!
//! This module contains the pure building blocks the transition pipeline
//! works on:
//! - [`State`] nodes and their parameter declarations
//! - [`StateParams`] values with inheritance and subset equality
//! - [`Path`]s of states paired with their resolve scopes
//! - the tree diff computed once per transition
//!
//! Nothing here performs I/O or runs hooks.

mod params;
mod path;
pub(crate) mod state;
mod tree;

pub use params::StateParams;
pub use path::{Path, PathElement};
pub use state::{ParamDeclaration, State};
pub use tree::{calculate_tree_changes, TreeChanges};
