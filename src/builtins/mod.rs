//! Higher-order built-ins and the primitive registry seeded at module init
//! (spec §4.9, §6).
//!
//! A "goal" argument — the second arg of `FindAll`, the body of `Not`, the
//! generator of `ForEach`, etc. — is represented as a plain `Term`: a
//! `Tuple` whose first element is the call target and whose remaining
//! elements are its arguments, or (for a zero-arg call) the bare target
//! value itself. This mirrors how `ouros`'s builtins dispatch on a
//! `Value` rather than needing a dedicated "thunk" type, and keeps goals
//! first-class data the loader can construct with the same `Term`
//! constructors as everything else.

pub mod arithmetic;
pub mod control;
pub mod extrema;
pub mod findall;
pub mod implies;
pub mod kb_ops;
pub mod list_ops;
pub mod parse;
pub mod reflect;
pub mod treesearch;
pub mod typetest;

use std::rc::Rc;

use crate::{
    binding::deref,
    env::Env,
    primitive::{Cont, StepResult},
    term::Term,
    textbuffer::TextBuffer,
};

/// Splits a reified goal term into `(target, args)`. See module docs.
pub(crate) fn split_goal(goal: &Term, env: &Env) -> (Term, Vec<Term>) {
    match deref(goal.clone(), env.frame.as_deref(), &env.bindings) {
        Term::Tuple(items) if !items.is_empty() => (items[0].clone(), items[1..].to_vec()),
        other => (other, Vec::new()),
    }
}

/// Invokes a reified goal term against `output`/`env`.
pub(crate) fn call_goal(
    goal: &Term,
    output: TextBuffer,
    env: Env,
    predecessor: Option<Rc<crate::frame::Frame>>,
    k: &mut Cont<'_>,
) -> StepResult {
    let (target, args) = split_goal(goal, &env);
    crate::call::dispatch(&target, &args, output, env, predecessor, k)
}

/// Registers every built-in this crate ships, plus the ambient primitives
/// spec §6 lists as seeded at module init (arithmetic comparisons, type
/// tests, list predicates, KB ops, randomization, string utilities). An
/// embedding is free to register additional primitives of its own on the
/// same [`crate::env::ProgramBuilder`]; nothing here is required.
pub fn register_all(builder: &mut crate::env::ProgramBuilder) {
    control::register(builder);
    findall::register(builder);
    implies::register(builder);
    extrema::register(builder);
    reflect::register(builder);
    parse::register(builder);
    treesearch::register(builder);
    arithmetic::register(builder);
    typetest::register(builder);
    list_ops::register(builder);
    kb_ops::register(builder);
}

fn name(builder: &crate::env::ProgramBuilder, s: &str) -> crate::intern::StringId {
    builder.interner().intern(s)
}

/// Wraps an inner [`crate::primitive::Primitive`] whose `name()` is a stub,
/// pairing it with the interned name it's actually registered under.
/// Avoids baking a `ProgramBuilder`-specific `StringId` into each builtin's
/// struct definition, since those are written before any builder exists.
#[derive(Debug)]
pub(crate) struct Named {
    pub(crate) inner: Rc<dyn crate::primitive::Primitive>,
    pub(crate) name: crate::intern::StringId,
}

impl crate::primitive::Primitive for Named {
    fn name(&self) -> crate::intern::StringId {
        self.name
    }

    fn call(
        &self,
        args: &[Term],
        output: TextBuffer,
        env: Env,
        predecessor: Option<Rc<crate::frame::Frame>>,
        k: &mut Cont<'_>,
    ) -> StepResult {
        self.inner.call(args, output, env, predecessor, k)
    }
}
