//! Manual order transitions

use std::collections::HashSet;

/// Move `src` to the position currently held by `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub src: String,
    pub target: String,
}

impl MoveRequest {
    pub fn new(src: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            target: target.into(),
        }
    }
}

/// Why a move request was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Unchanged,
    UnknownName,
}

/// Reconcile a persisted order with freshly discovered names.
///
/// Persisted names that were not discovered are dropped, and discovered names
/// missing from the persisted order are appended in discovery order. The
/// result is always a permutation of `discovered`.
pub fn merge_with_discovery<S: AsRef<str>>(persisted: &[String], discovered: &[S]) -> Vec<String> {
    let discovered_set: HashSet<&str> = discovered.iter().map(AsRef::as_ref).collect();
    let mut placed: HashSet<&str> = HashSet::with_capacity(discovered.len());
    let mut order = Vec::with_capacity(discovered.len());

    for name in persisted {
        if discovered_set.contains(name.as_str()) && placed.insert(name.as_str()) {
            order.push(name.clone());
        }
    }
    for name in discovered {
        let name = name.as_ref();
        if placed.insert(name) {
            order.push(name.to_string());
        }
    }
    order
}

/// Apply a move to `order` in place
pub fn apply_move(order: &mut Vec<String>, request: &MoveRequest) -> MoveOutcome {
    let Some(from) = order.iter().position(|n| *n == request.src) else {
        return MoveOutcome::UnknownName;
    };
    let Some(to) = order.iter().position(|n| *n == request.target) else {
        return MoveOutcome::UnknownName;
    };
    if from == to {
        return MoveOutcome::Unchanged;
    }

    let moved = order.remove(from);
    order.insert(to, moved);
    MoveOutcome::Moved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn is_permutation(order: &[String], names: &[&str]) -> bool {
        let mut a: Vec<&str> = order.iter().map(String::as_str).collect();
        let mut b = names.to_vec();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    #[test]
    fn merge_keeps_persisted_order_and_appends_new() {
        let merged = merge_with_discovery(&strings(&["c", "gone", "a"]), &["a", "b", "c", "d"]);
        assert_eq!(merged, strings(&["c", "a", "b", "d"]));
    }

    #[test]
    fn merge_drops_duplicates_in_persisted_order() {
        let merged = merge_with_discovery(&strings(&["b", "a", "b"]), &["a", "b"]);
        assert_eq!(merged, strings(&["b", "a"]));
    }

    #[test]
    fn merge_is_always_a_permutation() {
        let discovered = ["e", "d", "c", "b", "a"];
        let cases = [
            strings(&[]),
            strings(&["a"]),
            strings(&["x", "y"]),
            strings(&["a", "a", "z", "e", "b"]),
            strings(&["a", "b", "c", "d", "e", "f"]),
        ];
        for persisted in &cases {
            let merged = merge_with_discovery(persisted, &discovered);
            assert!(is_permutation(&merged, &discovered), "{persisted:?} -> {merged:?}");
        }
    }

    #[test]
    fn merge_is_stable_when_nothing_changed() {
        let first = merge_with_discovery(&[], &["b", "a", "c"]);
        let second = merge_with_discovery(&first, &["c", "b", "a"]);
        assert_eq!(first, second);
    }

    #[test]
    fn move_down_lands_at_target_index() {
        let mut order = strings(&["a", "b", "c", "d"]);
        assert_eq!(apply_move(&mut order, &MoveRequest::new("a", "c")), MoveOutcome::Moved);
        assert_eq!(order, strings(&["b", "c", "a", "d"]));
    }

    #[test]
    fn move_up_lands_before_target() {
        let mut order = strings(&["a", "b", "c", "d"]);
        assert_eq!(apply_move(&mut order, &MoveRequest::new("d", "b")), MoveOutcome::Moved);
        assert_eq!(order, strings(&["a", "d", "b", "c"]));
    }

    #[test]
    fn move_onto_itself_is_idempotent() {
        let mut order = strings(&["a", "b", "c"]);
        assert_eq!(apply_move(&mut order, &MoveRequest::new("b", "b")), MoveOutcome::Unchanged);
        assert_eq!(order, strings(&["a", "b", "c"]));
    }

    #[test]
    fn move_with_unknown_name_is_a_no_op() {
        let mut order = strings(&["a", "b"]);
        assert_eq!(apply_move(&mut order, &MoveRequest::new("z", "a")), MoveOutcome::UnknownName);
        assert_eq!(apply_move(&mut order, &MoveRequest::new("a", "z")), MoveOutcome::UnknownName);
        assert_eq!(order, strings(&["a", "b"]));
    }

    #[test]
    fn moves_preserve_permutation() {
        let names = ["a", "b", "c", "d", "e"];
        let mut order = strings(&names);
        for (src, target) in [("a", "e"), ("e", "a"), ("c", "b"), ("b", "d"), ("d", "d")] {
            apply_move(&mut order, &MoveRequest::new(src, target));
            assert!(is_permutation(&order, &names));
        }
    }
}
