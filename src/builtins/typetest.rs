//! Type-test predicates and `=`/`Different` (spec §6).

use crate::{
    binding::deref,
    env::ProgramBuilder,
    primitive::deterministic_predicate,
    term::{structurally_equal, Atom, Term},
    unify::unify,
};

use super::name;

/// Registers the six type tests plus `=`/`Different`. `=` is a relation
/// (unifies, can bind), so it goes through `register_primitive` directly
/// with custom `call` logic rather than `deterministic_predicate`, which
/// only ever succeeds-or-fails without producing bindings.
pub fn register(builder: &mut ProgramBuilder) {
    register_test(builder, "IsString", |t| matches!(t, Term::Atom(Atom::Str(_))));
    register_test(builder, "IsNumber", |t| matches!(t, Term::Atom(Atom::Num(_))));
    register_test(builder, "IsTuple", |t| matches!(t, Term::Tuple(_) | Term::Pair(..)));
    register_test(builder, "IsVar", |t| matches!(t, Term::Var(_)));
    register_test(builder, "IsNonVar", |t| !matches!(t, Term::Var(_)));

    let ground_name = name(builder, "IsGround");
    builder.register_primitive(deterministic_predicate(ground_name, |args, frame, bindings| {
        args.len() == 1 && args[0].is_ground(frame.as_deref(), bindings)
    }));

    let eq_name = name(builder, "Unify");
    builder.register_primitive(crate::primitive::nondeterministic_relation(eq_name, |args, frame, bindings| {
        let [a, b] = args else { return Vec::new() };
        unify(a, b, frame.as_deref(), bindings).map(|b| vec![b]).unwrap_or_default()
    }));

    let different_name = name(builder, "Different");
    builder.register_primitive(deterministic_predicate(different_name, |args, frame, bindings| {
        let [a, b] = args else { return false };
        let a = deref(a.clone(), frame.as_deref(), bindings);
        let b = deref(b.clone(), frame.as_deref(), bindings);
        !structurally_equal(&a, &b)
    }));
}

fn register_test(builder: &mut ProgramBuilder, task_name: &str, test: impl Fn(&Term) -> bool + 'static) {
    let id = name(builder, task_name);
    builder.register_primitive(deterministic_predicate(id, move |args, frame, bindings| {
        args.len() == 1 && test(&deref(args[0].clone(), frame.as_deref(), bindings))
    }));
}
