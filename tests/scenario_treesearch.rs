//! `TreeSearch` expands the highest-utility frontier node first (spec §8,
//! scenario 6): root `0` has children `1` and `2`; `2`'s only child is `3`;
//! utility is `-|node - 3|` (so `3` itself, then `2`, dominate `1`); the
//! goal is `node == 3`. Starting from `0`, the search must reach `3` via
//! `0 -> 2 -> 3` without ever needing to expand `1`.

mod support;

use taleforge_core::{deref, deterministic_function, deterministic_predicate, nondeterministic_relation, structurally_equal, unify, Atom, Number, Term};

fn as_int(t: &Term) -> Option<i64> {
    match t {
        Term::Atom(Atom::Num(Number::Int(n))) => Some(*n),
        _ => None,
    }
}

#[test]
fn tree_search_reaches_the_goal_via_the_highest_utility_path() {
    let mut b = support::builder();

    let next_node = support::intern(&b, "NextNode");
    b.register_primitive(nondeterministic_relation(next_node, |args, frame, bindings| {
        let [node, child_out] = args else { return Vec::new() };
        let node = deref(node.clone(), frame.as_deref(), bindings);
        let Some(n) = as_int(&node) else { return Vec::new() };
        let children: &[i64] = match n {
            0 => &[1, 2],
            2 => &[3],
            _ => &[],
        };
        children
            .iter()
            .filter_map(|c| unify(child_out, &Term::int(*c), frame.as_deref(), bindings).ok())
            .collect()
    }));

    let goal_node = support::intern(&b, "GoalNode");
    b.register_primitive(deterministic_predicate(goal_node, |args, frame, bindings| {
        let [node] = args else { return false };
        let node = deref(node.clone(), frame.as_deref(), bindings);
        as_int(&node) == Some(3)
    }));

    let node_utility = support::intern(&b, "NodeUtility");
    b.register_primitive(deterministic_function(node_utility, |args, frame, bindings| {
        let [node] = args else { return None };
        let node = deref(node.clone(), frame.as_deref(), bindings);
        let n = as_int(&node)?;
        Some(Term::Atom(Atom::Num(Number::Float(-(n - 3).abs() as f64))))
    }));

    let result = Term::Var(b.vars().fresh(None));
    let solution = support::run_first(
        b,
        "TreeSearch",
        vec![
            Term::int(0),
            support::task_ref(next_node),
            support::task_ref(goal_node),
            support::task_ref(node_utility),
            result.clone(),
        ],
    )
    .expect("no fatal error")
    .expect("the goal node 3 is reachable from 0");

    let resolved = deref(result, None, &solution.bindings);
    assert!(structurally_equal(&resolved, &Term::int(3)), "expected the search to land on node 3, got {resolved}");
}
