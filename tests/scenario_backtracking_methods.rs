//! Backtracking across a task's methods (spec §8, scenario 2): a task with
//! two methods, each binding its argument to a different literal and
//! emitting different text, collected through `FindAll` should yield every
//! binding in declaration order while leaking none of each attempt's
//! emitted text into the outer output.

mod support;

use taleforge_core::{deref, structurally_equal, Term};

#[test]
fn find_all_visits_every_method_in_order() {
    let mut b = support::builder();
    let t = support::intern(&b, "T");
    let method_one = support::method(t, vec![Term::int(1)], 0, Some(support::emit("a", None)));
    let method_two = support::method(t, vec![Term::int(2)], 0, Some(support::emit("b", None)));
    support::register_compound(
        &mut b,
        "T",
        vec![method_one, method_two],
        taleforge_core::DispatchOrder::InOrder,
        false,
    );

    let x = Term::Var(b.vars().fresh(None));
    let l = Term::Var(b.vars().fresh(None));
    let goal = support::goal(support::task_ref(t), vec![x.clone()]);

    let solution = support::run_first(b, "FindAll", vec![x, goal, l.clone()])
        .expect("no fatal error")
        .expect("FindAll always succeeds once, even over zero results");

    let result_list = deref(l, None, &solution.bindings);
    let expected = Term::list(vec![Term::int(1), Term::int(2)]);
    assert!(
        structurally_equal(&result_list, &expected),
        "expected [1, 2], got {result_list}"
    );
    assert!(solution.text.is_empty(), "FindAll must not leak emitted text into the outer output");
}
