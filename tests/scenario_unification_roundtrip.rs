//! Unification round-trip (spec §8, scenario 1): unifying `(X, 2, Y)` with
//! `(1, 2, (3, Z))` succeeds with `X = 1`, `Y = (3, Z)`, and dereferencing
//! `Y` afterward returns the nested tuple with `Z` still unbound — exercised
//! directly against `unify`/`deref` rather than through a running program,
//! since this is a property of the term model itself (spec §4.1/§4.2).

use taleforge_core::{deref, structurally_equal, unify, BindingList, Term, VarAllocator};

#[test]
fn tuple_unification_binds_and_derefs_through_nested_structure() {
    let vars = VarAllocator::new();
    let x = Term::Var(vars.fresh(None));
    let y = Term::Var(vars.fresh(None));
    let z = Term::Var(vars.fresh(None));

    let lhs = Term::tuple(vec![x.clone(), Term::int(2), y.clone()]);
    let rhs = Term::tuple(vec![Term::int(1), Term::int(2), Term::tuple(vec![Term::int(3), z.clone()])]);

    let bindings = unify(&lhs, &rhs, None, &BindingList::empty()).expect("tuples of equal length and matching atoms unify");

    let resolved_x = deref(x, None, &bindings);
    assert!(structurally_equal(&resolved_x, &Term::int(1)), "X should be bound to 1, got {resolved_x}");

    let resolved_y = deref(y, None, &bindings);
    let expected_y = Term::tuple(vec![Term::int(3), z.clone()]);
    assert!(structurally_equal(&resolved_y, &expected_y), "Y should deref to (3, Z), got {resolved_y}");

    // Z itself must still be unbound: derefing it should return the same
    // unbound variable, not some resolved value.
    let Term::Tuple(items) = &resolved_y else { panic!("expected a tuple") };
    let resolved_z = deref(items[1].clone(), None, &bindings);
    assert!(resolved_z.is_unbound_var(), "Z should remain unbound after unification, got {resolved_z}");
}
