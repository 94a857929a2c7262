//! Tree diff between the source and target of a transition.

use super::params::StateParams;
use super::path::{Path, PathElement};
use super::state::State;
use std::sync::Arc;

/// Which states a transition keeps, leaves and enters.
///
/// `exiting` is stored in from-path order (root first); callers reverse it
/// to exit leaf first. `to` is always `retained` followed by `entering`.
#[derive(Clone, Debug)]
pub struct TreeChanges {
    pub from: Path,
    pub to: Path,
    pub retained: Vec<PathElement>,
    pub exiting: Vec<PathElement>,
    pub entering: Vec<PathElement>,
}

/// Diff `from` against the path of `to_state`.
///
/// The common prefix is kept while the states are identical, are not the
/// `reload_state`, and agree on their non-dynamic params. A `None` target
/// (invalid transition) enters nothing.
pub fn calculate_tree_changes(
    from: Path,
    to_state: Option<&Arc<State>>,
    to_params: &StateParams,
    reload_state: Option<&Arc<State>>,
) -> TreeChanges {
    let to_states = to_state.map(|s| s.path()).unwrap_or_default();
    let from_elements = from.elements();

    let mut keep = 0;
    while keep < from_elements.len() && keep < to_states.len() {
        let state = &to_states[keep];
        if !Arc::ptr_eq(state, from_elements[keep].state())
            || reload_state.is_some_and(|r| Arc::ptr_eq(r, state))
            || !to_params.equals_for(from.params(), state.non_dynamic_params())
        {
            break;
        }
        keep += 1;
    }

    let retained = from_elements[..keep].to_vec();
    let exiting = from_elements[keep..].to_vec();
    let entering: Vec<PathElement> = to_states[keep..].iter().map(PathElement::new).collect();

    let mut to_elements = retained.clone();
    to_elements.extend(entering.iter().cloned());
    let to = Path::new(Arc::clone(from.root()), to_elements, to_params.clone());

    TreeChanges {
        from,
        to,
        retained,
        exiting,
        entering,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ParamDeclaration;
    use crate::resolve::ResolveScope;

    fn node(name: &str, parent: Option<&Arc<State>>, params: Vec<ParamDeclaration>) -> Arc<State> {
        Arc::new(State {
            name: name.to_string(),
            parent: parent.cloned(),
            params,
            resolve: Vec::new(),
            on_enter: None,
            on_exit: None,
        })
    }

    fn names(elements: &[PathElement]) -> Vec<&str> {
        elements.iter().map(|e| e.state().name()).collect()
    }

    fn from_path(state: &Arc<State>, params: StateParams) -> Path {
        Path::for_state(Some(state), params, Arc::new(ResolveScope::root()))
    }

    #[test]
    fn siblings_retain_common_ancestors() {
        let root = node("root", None, vec![]);
        let parent = node("root.parent", Some(&root), vec![]);
        let a = node("root.parent.a", Some(&parent), vec![]);
        let b = node("root.parent.b", Some(&parent), vec![]);

        let changes =
            calculate_tree_changes(from_path(&a, StateParams::new()), Some(&b), &StateParams::new(), None);

        assert_eq!(names(&changes.retained), vec!["root", "root.parent"]);
        assert_eq!(names(&changes.exiting), vec!["root.parent.a"]);
        assert_eq!(names(&changes.entering), vec!["root.parent.b"]);
        assert_eq!(
            names(changes.to.elements()),
            vec!["root", "root.parent", "root.parent.b"]
        );
    }

    #[test]
    fn changed_param_exits_owner_and_descendants() {
        let root = node("root", None, vec![]);
        let user = node("root.user", Some(&root), vec![ParamDeclaration::new("id")]);
        let tab = node("root.user.tab", Some(&user), vec![]);

        let from = from_path(&tab, StateParams::new().with("id", 1));
        let changes =
            calculate_tree_changes(from, Some(&tab), &StateParams::new().with("id", 2), None);

        assert_eq!(names(&changes.retained), vec!["root"]);
        assert_eq!(names(&changes.exiting), vec!["root.user", "root.user.tab"]);
        assert_eq!(names(&changes.entering), vec!["root.user", "root.user.tab"]);
    }

    #[test]
    fn dynamic_param_change_keeps_owner() {
        let root = node("root", None, vec![]);
        let list = node(
            "root.list",
            Some(&root),
            vec![ParamDeclaration::new("page").dynamic()],
        );

        let from = from_path(&list, StateParams::new().with("page", 1));
        let changes =
            calculate_tree_changes(from, Some(&list), &StateParams::new().with("page", 2), None);

        assert_eq!(names(&changes.retained), vec!["root", "root.list"]);
        assert!(changes.exiting.is_empty());
        assert!(changes.entering.is_empty());
    }

    #[test]
    fn reload_state_stops_retention() {
        let root = node("root", None, vec![]);
        let child = node("root.child", Some(&root), vec![]);

        let changes = calculate_tree_changes(
            from_path(&child, StateParams::new()),
            Some(&child),
            &StateParams::new(),
            Some(&child),
        );

        assert_eq!(names(&changes.retained), vec!["root"]);
        assert_eq!(names(&changes.exiting), vec!["root.child"]);
        assert_eq!(names(&changes.entering), vec!["root.child"]);
    }

    #[test]
    fn invalid_target_enters_nothing() {
        let root = node("root", None, vec![]);
        let changes =
            calculate_tree_changes(from_path(&root, StateParams::new()), None, &StateParams::new(), None);

        assert!(changes.entering.is_empty());
        assert!(changes.retained.is_empty());
        assert!(changes.to.is_empty());
    }

    #[test]
    fn retained_elements_share_scopes_with_from_path() {
        let root = node("root", None, vec![]);
        let a = node("root.a", Some(&root), vec![]);
        let b = node("root.b", Some(&root), vec![]);

        let from = from_path(&a, StateParams::new());
        let root_scope = Arc::clone(from.elements()[0].scope());
        let changes = calculate_tree_changes(from, Some(&b), &StateParams::new(), None);

        assert!(Arc::ptr_eq(changes.to.elements()[0].scope(), &root_scope));
    }
}
