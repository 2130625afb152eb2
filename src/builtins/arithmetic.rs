//! Arithmetic: the pure functions `Expr::Apply` evaluates for `Assignment`
//! steps, plus the arithmetic comparison primitives (spec §4.4, §6).

use crate::{
    binding::deref,
    env::ProgramBuilder,
    primitive::deterministic_predicate,
    term::{Atom, Number, Term},
};

use super::name;

fn as_f64(t: &Term) -> Option<f64> {
    match t {
        Term::Atom(Atom::Num(n)) => Some(n.as_f64()),
        _ => None,
    }
}

/// True iff both inputs are `Int`/`Big` (never `Float`) — arithmetic that
/// receives only integers stays exact; mixing in a single float pushes the
/// whole operation to `f64`.
fn both_int(a: &Number, b: &Number) -> bool {
    !a.is_float() && !b.is_float()
}

fn numeric_binop(
    args: &[Term],
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Option<Term> {
    let [Term::Atom(Atom::Num(a)), Term::Atom(Atom::Num(b))] = args else { return None };
    if both_int(a, b) {
        if let (Number::Int(x), Number::Int(y)) = (a, b) {
            if let Some(r) = int_op(*x, *y) {
                return Some(Term::int(r));
            }
        }
    }
    Some(Term::Atom(Atom::Num(Number::Float(float_op(a.as_f64(), b.as_f64())))))
}

/// Registers the pure functions `Expr::Apply` dispatches to by name, and the
/// numeric comparison primitives used directly as call targets.
pub fn register(builder: &mut ProgramBuilder) {
    let add = name(builder, "Add");
    builder.register_pure_fn(add, |args| {
        numeric_binop(args, |a, b| a.checked_add(b), |a, b| a + b)
    });

    let sub = name(builder, "Subtract");
    builder.register_pure_fn(sub, |args| {
        numeric_binop(args, |a, b| a.checked_sub(b), |a, b| a - b)
    });

    let mul = name(builder, "Multiply");
    builder.register_pure_fn(mul, |args| {
        numeric_binop(args, |a, b| a.checked_mul(b), |a, b| a * b)
    });

    let div = name(builder, "Divide");
    builder.register_pure_fn(div, |args| {
        let [Term::Atom(Atom::Num(a)), Term::Atom(Atom::Num(b))] = args else { return None };
        let y = b.as_f64();
        if y == 0.0 {
            return None;
        }
        Some(Term::Atom(Atom::Num(Number::Float(a.as_f64() / y))))
    });

    let modulo = name(builder, "Modulo");
    builder.register_pure_fn(modulo, |args| {
        let [Term::Atom(Atom::Num(Number::Int(a))), Term::Atom(Atom::Num(Number::Int(b)))] = args else { return None };
        if *b == 0 {
            return None;
        }
        Some(Term::int(a.rem_euclid(*b)))
    });

    let neg = name(builder, "Negate");
    builder.register_pure_fn(neg, |args| match args {
        [Term::Atom(Atom::Num(Number::Int(n)))] => Some(Term::int(-n)),
        [Term::Atom(Atom::Num(n))] => Some(Term::Atom(Atom::Num(Number::Float(-n.as_f64())))),
        _ => None,
    });

    let abs = name(builder, "Abs");
    builder.register_pure_fn(abs, |args| match args {
        [Term::Atom(Atom::Num(Number::Int(n)))] => Some(Term::int(n.abs())),
        [Term::Atom(Atom::Num(n))] => Some(Term::Atom(Atom::Num(Number::Float(n.as_f64().abs())))),
        _ => None,
    });

    let min_fn = name(builder, "MinOf");
    builder.register_pure_fn(min_fn, |args| numeric_binop(args, |a, b| Some(a.min(b)), f64::min));

    let max_fn = name(builder, "MaxOf");
    builder.register_pure_fn(max_fn, |args| numeric_binop(args, |a, b| Some(a.max(b)), f64::max));

    register_comparison(builder, "LessThan", |a, b| a < b);
    register_comparison(builder, "LessOrEqual", |a, b| a <= b);
    register_comparison(builder, "GreaterThan", |a, b| a > b);
    register_comparison(builder, "GreaterOrEqual", |a, b| a >= b);
    register_comparison(builder, "NumEqual", |a, b| (a - b).abs() < f64::EPSILON);
}

fn register_comparison(builder: &mut ProgramBuilder, task_name: &str, cmp: impl Fn(f64, f64) -> bool + 'static) {
    let id = name(builder, task_name);
    builder.register_primitive(deterministic_predicate(id, move |args, frame, bindings| {
        let [a, b] = args else { return false };
        let a = deref(a.clone(), frame.as_deref(), bindings);
        let b = deref(b.clone(), frame.as_deref(), bindings);
        match (as_f64(&a), as_f64(&b)) {
            (Some(x), Some(y)) => cmp(x, y),
            _ => false,
        }
    }));
}

