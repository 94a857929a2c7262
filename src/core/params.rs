//! Parameter values attached to a transition target.

use super::state::{ParamDeclaration, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Mapping from parameter name to value.
///
/// Keys are kept sorted so two equal param sets always render and
/// serialize identically.
///
/// # Example
///
/// ```rust
/// use waypoint::core::StateParams;
/// use serde_json::json;
///
/// let a = StateParams::new().with("id", 1).with("page", 2);
/// let b = StateParams::new().with("id", 1).with("page", 3);
///
/// assert!(a.equals_for(&b, ["id"]));
/// assert!(!a.equals_for(&b, ["id", "page"]));
/// assert_eq!(a.get("id"), Some(&json!(1)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateParams {
    values: BTreeMap<String, Value>,
}

impl StateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Compare two param sets on the given keys only.
    ///
    /// A key absent from both sides counts as equal.
    pub fn equals_for<'a, I>(&self, other: &StateParams, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .all(|key| self.values.get(key) == other.values.get(key))
    }

    /// Build params for `target` by carrying over values from `self`.
    ///
    /// Only parameters declared somewhere on the target's path are inherited;
    /// values present in `explicit` always win.
    pub fn inherit(&self, explicit: &StateParams, target: &Arc<State>) -> StateParams {
        let mut inherited = StateParams::new();
        for decl in target.path_params() {
            if let Some(value) = self.values.get(&decl.name) {
                inherited.values.insert(decl.name, value.clone());
            }
        }
        inherited
            .values
            .extend(explicit.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        inherited
    }

    /// Fill any missing declared parameter with its default value.
    pub fn with_defaults<'a, I>(mut self, declarations: I) -> StateParams
    where
        I: IntoIterator<Item = &'a ParamDeclaration>,
    {
        for decl in declarations {
            if let Some(default) = &decl.default {
                self.values
                    .entry(decl.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        self
    }
}

impl fmt::Display for StateParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.values) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("{}"),
        }
    }
}

impl FromIterator<(String, Value)> for StateParams {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
