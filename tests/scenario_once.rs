//! `Once` takes the first solution and refuses to backtrack back into it
//! (spec §8, scenario 5): given `G(X)` with three methods producing
//! `X ∈ {1, 2, 3}` on backtracking, `FindAll((X, Y), Begin(Once(G(X)), G(Y)),
//! L)` must fix `X = 1` across every solution while `Y` still ranges over
//! all three — i.e. backtracking re-enters `G(Y)` freely but never crosses
//! back over the `Once`.

mod support;

use taleforge_core::{deref, structurally_equal, DispatchOrder, Term};

#[test]
fn once_blocks_backtracking_into_its_own_goal_but_not_past_it() {
    let mut b = support::builder();
    let g = support::intern(&b, "G");
    let methods = (1..=3).map(|n| support::fact(g, vec![Term::int(n)])).collect();
    support::register_compound(&mut b, "G", methods, DispatchOrder::InOrder, false);

    let x = Term::Var(b.vars().fresh(None));
    let y = Term::Var(b.vars().fresh(None));
    let l = Term::Var(b.vars().fresh(None));

    let once_gx = support::goal(
        support::task_ref(support::intern(&b, "Once")),
        vec![support::goal(support::task_ref(g), vec![x.clone()])],
    );
    let gy = support::goal(support::task_ref(g), vec![y.clone()]);
    let begin = support::goal(support::task_ref(support::intern(&b, "Begin")), vec![once_gx, gy]);

    let solution = support::run_first(
        b,
        "FindAll",
        vec![Term::tuple(vec![x.clone(), y.clone()]), begin, l.clone()],
    )
    .expect("no fatal error")
    .expect("FindAll always succeeds once");

    let result_list = deref(l, None, &solution.bindings);
    let expected = Term::list(vec![
        Term::tuple(vec![Term::int(1), Term::int(1)]),
        Term::tuple(vec![Term::int(1), Term::int(2)]),
        Term::tuple(vec![Term::int(1), Term::int(3)]),
    ]);
    assert!(
        structurally_equal(&result_list, &expected),
        "X must stay 1 across every solution while Y ranges over 1..=3, got {result_list}"
    );
}
