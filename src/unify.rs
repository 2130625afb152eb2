//! Unification (spec §4.1).
//!
//! Grounds the "tagged sum + recursive structural match" shape on the
//! corpus's closest unification engine (`chalk`'s resolvent/unifier style)
//! adapted to spec's exact rule set: no occurs-check, variable-ordering by
//! id rather than by binding-time rank, and an explicit feature-structure
//! case the chalk engine has no analogue for.

use crate::{
    binding::{deref, BindingList},
    error::UnifyFail,
    frame::Frame,
    term::{structurally_equal, Term},
};

/// Unifies `a` and `b` under `bindings`, returning an extended binding list
/// on success. `frame` resolves any `Term::Local` placeholders still
/// present in either side (method heads are unified against call arguments
/// before a fresh frame's locals are otherwise touched).
pub fn unify(a: &Term, b: &Term, frame: Option<&Frame>, bindings: &BindingList) -> Result<BindingList, UnifyFail> {
    let a = deref(a.clone(), frame, bindings);
    let b = deref(b.clone(), frame, bindings);
    unify_derefed(a, b, frame, bindings)
}

fn unify_derefed(a: Term, b: Term, frame: Option<&Frame>, bindings: &BindingList) -> Result<BindingList, UnifyFail> {
    match (a, b) {
        (Term::Atom(crate::term::Atom::Null), Term::Atom(crate::term::Atom::Null)) => Ok(bindings.clone()),

        // Variable-ordering rule: bind the variable with the larger id to
        // the one with the smaller id (or to a non-variable value). This
        // keeps the deref chain strictly decreasing in id, which is what
        // guarantees termination (spec §3 invariant) without an occurs-check.
        (Term::Var(x), Term::Var(y)) => {
            if x == y {
                Ok(bindings.clone())
            } else if x.id > y.id {
                Ok(bindings.extend(x, Term::Var(y)))
            } else {
                Ok(bindings.extend(y, Term::Var(x)))
            }
        }
        (Term::Var(v), other) | (other, Term::Var(v)) => Ok(bindings.extend(v, other)),

        (Term::Atom(x), Term::Atom(y)) => {
            if x == y {
                Ok(bindings.clone())
            } else {
                Err(UnifyFail)
            }
        }

        (Term::Tuple(xs), Term::Tuple(ys)) => {
            if xs.len() != ys.len() {
                return Err(UnifyFail);
            }
            let mut out = bindings.clone();
            for (x, y) in xs.iter().zip(ys.iter()) {
                out = unify(x, y, frame, &out)?;
            }
            Ok(out)
        }

        (Term::Pair(xh, xt), Term::Pair(yh, yt)) => {
            let out = unify(&xh, &yh, frame, bindings)?;
            unify(&xt, &yt, frame, &out)
        }

        // A pair and a tuple interoperate as cons-lists: promote the tuple
        // to a Pair chain terminated by `null` and unify element-wise.
        (pair @ Term::Pair(..), Term::Tuple(items)) | (Term::Tuple(items), pair @ Term::Pair(..)) => {
            let chain = Term::list(items.to_vec());
            unify_derefed(pair, chain, frame, bindings)
        }

        (Term::Feature(x), Term::Feature(y)) => unify_feature_structures(&x, &y, frame, bindings),

        (Term::Task(x), Term::Task(y)) => {
            if x == y {
                Ok(bindings.clone())
            } else {
                Err(UnifyFail)
            }
        }

        // Structurally-equal already-ground local/state-var placeholders
        // (shouldn't normally reach unify still wrapped, but harmless if
        // they do: a local/state reference only unifies with an identical
        // reference).
        (a, b) if structurally_equal(&a, &b) => Ok(bindings.clone()),

        _ => Err(UnifyFail),
    }
}

/// Unifies intersecting features pairwise; a feature present in only one
/// structure unifies against an implicit empty structure on the other side
/// (spec §4.1 "unify-with-empty for disjoint"), which for any non-variable
/// feature value simply means it is accepted as-is — unifying a concrete
/// term against "nothing there yet" always succeeds and contributes that
/// term to the merged result.
fn unify_feature_structures(
    x: &crate::term::FeatureMap,
    y: &crate::term::FeatureMap,
    frame: Option<&Frame>,
    bindings: &BindingList,
) -> Result<BindingList, UnifyFail> {
    let mut out = bindings.clone();
    for (key, xv) in x.iter() {
        if let Some(yv) = y.get(key) {
            out = unify(xv, yv, frame, &out)?;
        }
    }
    // Disjoint features from y alone need no additional binding work: their
    // values stand as already unified-with-empty. Callers that need the
    // *merged* feature structure (rather than just success/failure) build it
    // separately from the dereferenced value of each side.
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::term::{LogicVar, Number};

    fn v(id: u64) -> Term {
        Term::Var(LogicVar::unnamed(id))
    }

    #[test]
    fn unify_tuple_with_nested_unbound_tail() {
        // unify (X, 2, Y) with (1, 2, (3, Z))
        let lhs = Term::tuple(vec![v(0), Term::int(2), v(1)]);
        let rhs = Term::tuple(vec![
            Term::int(1),
            Term::int(2),
            Term::tuple(vec![Term::int(3), v(2)]),
        ]);
        let bindings = unify(&lhs, &rhs, None, &BindingList::empty()).expect("should unify");
        assert_eq!(deref(v(0), None, &bindings), Term::int(1));
        let y = deref(v(1), None, &bindings);
        match y {
            Term::Tuple(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], Term::int(3));
                assert!(matches!(deref(items[1].clone(), None, &bindings), Term::Var(_)));
            }
            other => panic!("expected tuple, got {other:?}"),
        }
    }

    #[test]
    fn atoms_must_match() {
        let bindings = BindingList::empty();
        assert!(unify(&Term::int(1), &Term::int(2), None, &bindings).is_err());
        assert!(unify(&Term::int(1), &Term::int(1), None, &bindings).is_ok());
    }

    #[test]
    fn variable_ordering_keeps_smaller_id_as_representative() {
        let bindings = BindingList::empty();
        let out = unify(&v(5), &v(2), None, &bindings).unwrap();
        // binding the larger id (5) to the smaller (2)
        assert_eq!(out.lookup(LogicVar::unnamed(5)), Some(v(2)));
        assert_eq!(out.lookup(LogicVar::unnamed(2)), None);
    }

    #[test]
    fn pair_and_tuple_interop_as_cons_lists() {
        let tuple = Term::tuple(vec![Term::int(1), Term::int(2)]);
        let pair = Term::Pair(Rc::new(Term::int(1)), Rc::new(Term::Pair(Rc::new(Term::int(2)), Rc::new(Term::null()))));
        assert!(unify(&tuple, &pair, None, &BindingList::empty()).is_ok());
    }

    #[test]
    fn bool_atoms() {
        let bindings = BindingList::empty();
        assert!(unify(&Term::bool(true), &Term::bool(true), None, &bindings).is_ok());
        assert!(unify(&Term::bool(true), &Term::bool(false), None, &bindings).is_err());
    }

    #[test]
    fn float_atoms_numbers_unused_directly_but_atom_eq_requires_same_variant() {
        let a = Term::Atom(crate::term::Atom::Num(Number::Float(1.5)));
        let b = Term::Atom(crate::term::Atom::Num(Number::Float(1.5)));
        assert!(unify(&a, &b, None, &BindingList::empty()).is_ok());
    }
}
