//! Exclusive KB writes overwrite the prior key at that position (spec §8,
//! scenario 4): writing `/a/b!c` then `/a/b!d` must make `lookup(/a/b!c)`
//! fail, `lookup(/a/b!d)` succeed, and `dump` reflect only the latter —
//! driven through the `Write`/`Lookup`/`Dump`/`Not` primitives rather than
//! the `Kb` type directly, to exercise the call-step plumbing end to end.

mod support;

use taleforge_core::{deref, structurally_equal, Atom, ProgramBuilder, Term};

fn path(b: &ProgramBuilder, elems: &[(bool, &str)]) -> Term {
    Term::list(
        elems
            .iter()
            .map(|(exclusive, key)| Term::tuple(vec![Term::bool(*exclusive), Term::Atom(Atom::Str(support::intern(b, key)))]))
            .collect(),
    )
}

#[test]
fn exclusive_write_overwrites_prior_key_through_primitives() {
    let mut b = support::builder();
    let path_c = path(&b, &[(false, "a"), (false, "b"), (true, "c")]);
    let path_d = path(&b, &[(false, "a"), (false, "b"), (true, "d")]);

    let result_slot = taleforge_core::LocalSlot(0);
    let result_var = Term::Var(b.vars().fresh(None));

    let dump = support::call_step(support::task_ref(support::intern(&b, "Dump")), vec![Term::Local(result_slot)], None);
    let lookup_d = support::call_step(support::task_ref(support::intern(&b, "Lookup")), vec![path_d.clone()], Some(dump));
    let not_lookup_c = support::call_step(
        support::task_ref(support::intern(&b, "Not")),
        vec![support::goal(support::task_ref(support::intern(&b, "Lookup")), vec![path_c.clone()])],
        Some(lookup_d),
    );
    let write_d = support::call_step(support::task_ref(support::intern(&b, "Write")), vec![path_d], Some(not_lookup_c));
    let write_c = support::call_step(support::task_ref(support::intern(&b, "Write")), vec![path_c], Some(write_d));

    let main_name = support::intern(&b, "Main");
    support::register_compound(
        &mut b,
        "Main",
        vec![support::method(main_name, vec![Term::Local(result_slot)], 1, Some(write_c))],
        taleforge_core::DispatchOrder::InOrder,
        false,
    );

    let a = support::intern(&b, "a");
    let b_key = support::intern(&b, "b");
    let d = support::intern(&b, "d");
    let expected_dump = Term::list(vec![Term::list(vec![
        Term::tuple(vec![Term::bool(false), Term::Atom(Atom::Str(a))]),
        Term::tuple(vec![Term::bool(false), Term::Atom(Atom::Str(b_key))]),
        Term::tuple(vec![Term::bool(true), Term::Atom(Atom::Str(d))]),
    ])]);

    let solution = support::run_first(b, "Main", vec![result_var.clone()])
        .expect("no fatal error")
        .expect("lookup(/a/b!d) must succeed and lookup(/a/b!c) must fail after the overwrite");

    let dumped = deref(result_var, None, &solution.bindings);
    assert!(
        structurally_equal(&dumped, &expected_dump),
        "dump should reflect only the overwriting write, got {dumped}"
    );
}
