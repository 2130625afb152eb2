//! List predicates: `Member`, `Length`, `Nth`, `Cons` (spec §6).

use crate::{
    binding::deref,
    env::ProgramBuilder,
    primitive::{deterministic_function, nondeterministic_relation},
    term::Term,
    unify::unify,
};

use super::name;

/// Flattens a cons-list or tuple into its element terms. A non-list,
/// non-tuple term (including an unbound variable) has no elements.
fn sequence_items(seq: &Term) -> Vec<Term> {
    match seq {
        Term::Tuple(items) => items.to_vec(),
        Term::Pair(h, t) => {
            let mut out = vec![(**h).clone()];
            out.extend(sequence_items(t));
            out
        }
        _ => Vec::new(),
    }
}

pub fn register(builder: &mut ProgramBuilder) {
    let member_name = name(builder, "Member");
    builder.register_primitive(nondeterministic_relation(member_name, |args, frame, bindings| {
        let [item, seq] = args else { return Vec::new() };
        let seq = deref(seq.clone(), frame.as_deref(), bindings);
        sequence_items(&seq)
            .into_iter()
            .filter_map(|elem| unify(item, &elem, frame.as_deref(), bindings).ok())
            .collect()
    }));

    let length_name = name(builder, "Length");
    builder.register_primitive(deterministic_function(length_name, |args, frame, bindings| {
        let [seq] = args else { return None };
        let seq = deref(seq.clone(), frame.as_deref(), bindings);
        Some(Term::int(sequence_items(&seq).len() as i64))
    }));

    let nth_name = name(builder, "Nth");
    builder.register_primitive(deterministic_function(nth_name, |args, frame, bindings| {
        let [seq, index] = args else { return None };
        let seq = deref(seq.clone(), frame.as_deref(), bindings);
        let index = deref(index.clone(), frame.as_deref(), bindings);
        let Term::Atom(crate::term::Atom::Num(crate::term::Number::Int(i))) = index else { return None };
        let items = sequence_items(&seq);
        usize::try_from(i).ok().and_then(|i| items.get(i).cloned())
    }));

    let cons_name = name(builder, "Cons");
    builder.register_primitive(deterministic_function(cons_name, |args, frame, bindings| {
        let [head, tail] = args else { return None };
        let head = deref(head.clone(), frame.as_deref(), bindings);
        let tail = deref(tail.clone(), frame.as_deref(), bindings);
        Some(Term::Pair(std::rc::Rc::new(head), std::rc::Rc::new(tail)))
    }));
}
