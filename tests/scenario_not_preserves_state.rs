//! `Not` preserves state across its own failure path (spec §8, scenario 3):
//! setting a fluent, then running a negated goal that always fails inside
//! `Not` (so `Not` itself succeeds), must leave the fluent's new value
//! visible afterward — and a zero-arg call on a bare state-variable
//! reference must read through to that value rather than staying opaque.

mod support;

use taleforge_core::{deterministic_predicate, Expr, Term};

#[test]
fn not_over_a_failing_goal_preserves_a_prior_assignment() {
    let mut b = support::builder();
    let s = b.fresh_state_key(Term::int(0));

    let always_false = support::intern(&b, "AlwaysFalse");
    b.register_primitive(deterministic_predicate(always_false, |_args, _frame, _bindings| false));

    let write_s = support::call_step(Term::StateVar(s), vec![], None);
    let not_false = support::call_step(
        support::task_ref(support::intern(&b, "Not")),
        vec![support::task_ref(always_false)],
        Some(write_s),
    );
    let set_s = support::assign_state(s, Expr::Value(Term::int(1)), Some(not_false));

    let main_name = support::intern(&b, "Main");
    support::register_compound(
        &mut b,
        "Main",
        vec![support::method(main_name, vec![], 0, Some(set_s))],
        taleforge_core::DispatchOrder::InOrder,
        false,
    );

    let solution = support::run_first(b, "Main", vec![]).expect("no fatal error").expect("Main succeeds");

    assert_eq!(solution.text, "1", "write(S) should read through to the value Main itself just assigned");
}
