//! Primitive task protocol (spec §4.7).
//!
//! Grounds the "one calling convention, several ergonomic wrapper shapes"
//! design on `ouros::builtins::mod.rs`'s `Builtins` enum/dispatch: there a
//! closed set of CPython builtins share one `call` entry point; here the
//! registry is open (the embedding supplies it, spec §6), so we use a
//! `StringId`-keyed map of trait objects instead of an enum, but the
//! ergonomic-wrapper idea — most primitives don't want to hand-write the
//! raw continuation-passing shape — carries over directly.

use std::rc::Rc;

use crate::{
    binding::BindingList,
    env::Env,
    error::ExecError,
    frame::Frame,
    intern::StringId,
    term::Term,
    textbuffer::TextBuffer,
};

pub type StepResult = Result<bool, ExecError>;
/// The success continuation every step and primitive threads through: call
/// it with the (possibly advanced) output buffer and environment; its
/// return value is the overall success/failure of everything downstream.
pub type Cont<'a> = dyn FnMut(TextBuffer, Env) -> StepResult + 'a;

/// All built-ins conform to this single calling convention (spec §4.7).
pub trait Primitive: std::fmt::Debug {
    fn name(&self) -> StringId;

    /// `args` are already dereferenced top-level (callers resolve through
    /// [`crate::binding::deref`] before invoking); a primitive dereferences
    /// further into compound arguments itself as needed.
    fn call(
        &self,
        args: &[Term],
        output: TextBuffer,
        env: Env,
        predecessor: Option<Rc<Frame>>,
        k: &mut Cont<'_>,
    ) -> StepResult;
}

/// Registry of primitive tasks, built once at program load (spec §6 "the
/// embedding provides a mapping from task name to primitive
/// implementation").
#[derive(Default)]
pub struct PrimitiveRegistry {
    entries: ahash::AHashMap<StringId, Rc<dyn Primitive>>,
}

impl std::fmt::Debug for PrimitiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveRegistry").field("len", &self.entries.len()).finish()
    }
}

impl PrimitiveRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, prim: Rc<dyn Primitive>) {
        self.entries.insert(prim.name(), prim);
    }

    #[must_use]
    pub fn get(&self, name: StringId) -> Option<Rc<dyn Primitive>> {
        self.entries.get(&name).cloned()
    }
}

/// Wraps a Rust closure as a deterministic predicate: `args -> bool`. No
/// output, no bindings produced beyond what the caller already resolved;
/// succeeds at most once.
pub fn deterministic_predicate(
    name: StringId,
    f: impl Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> bool + 'static,
) -> Rc<dyn Primitive> {
    struct DetPred<F> {
        name: StringId,
        f: F,
    }
    impl<F: Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> bool> std::fmt::Debug for DetPred<F> {
        fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            fmt.debug_struct("DeterministicPredicate").finish()
        }
    }
    impl<F: Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> bool> Primitive for DetPred<F> {
        fn name(&self) -> StringId {
            self.name
        }

        fn call(
            &self,
            args: &[Term],
            output: TextBuffer,
            env: Env,
            _predecessor: Option<Rc<Frame>>,
            k: &mut Cont<'_>,
        ) -> StepResult {
            if (self.f)(args, &env.frame, &env.bindings) {
                k(output, env)
            } else {
                Ok(false)
            }
        }
    }
    Rc::new(DetPred { name, f })
}

/// Wraps a Rust closure as a deterministic N-ary function: computes a
/// value from `args[..n-1]` and unifies it against `args[n-1]` (the "out"
/// argument), per §4.7. Returns `None` to signal plain failure (e.g. a type
/// mismatch the caller should treat as backtracking, not a fatal error).
pub fn deterministic_function(
    name: StringId,
    f: impl Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> Option<Term> + 'static,
) -> Rc<dyn Primitive> {
    struct DetFn<F> {
        name: StringId,
        f: F,
    }
    impl<F: Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> Option<Term>> std::fmt::Debug for DetFn<F> {
        fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            fmt.debug_struct("DeterministicFunction").finish()
        }
    }
    impl<F: Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> Option<Term>> Primitive for DetFn<F> {
        fn name(&self) -> StringId {
            self.name
        }

        fn call(
            &self,
            args: &[Term],
            output: TextBuffer,
            env: Env,
            _predecessor: Option<Rc<Frame>>,
            k: &mut Cont<'_>,
        ) -> StepResult {
            if args.is_empty() {
                return Ok(false);
            }
            let (ins, out_arg) = args.split_at(args.len() - 1);
            match (self.f)(ins, &env.frame, &env.bindings) {
                Some(value) => match crate::unify::unify(&out_arg[0], &value, env.frame.as_deref(), &env.bindings) {
                    Ok(bindings) => k(output, env.with_bindings(bindings)),
                    Err(_) => Ok(false),
                },
                None => Ok(false),
            }
        }
    }
    Rc::new(DetFn { name, f })
}

/// Wraps a nondeterministic relation: an iterator factory over alternative
/// binding lists, one per solution. The primitive tries each in turn,
/// invoking `k` and — on failure — moving to the next, exactly like method
/// dispatch tries methods in order (§4.5).
pub fn nondeterministic_relation(
    name: StringId,
    solutions: impl Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> Vec<BindingList> + 'static,
) -> Rc<dyn Primitive> {
    struct Relation<F> {
        name: StringId,
        solutions: F,
    }
    impl<F> std::fmt::Debug for Relation<F> {
        fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            fmt.debug_struct("NondeterministicRelation").finish()
        }
    }
    impl<F: Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> Vec<BindingList>> Primitive for Relation<F> {
        fn name(&self) -> StringId {
            self.name
        }

        fn call(
            &self,
            args: &[Term],
            output: TextBuffer,
            env: Env,
            _predecessor: Option<Rc<Frame>>,
            k: &mut Cont<'_>,
        ) -> StepResult {
            for bindings in (self.solutions)(args, &env.frame, &env.bindings) {
                if k(output.clone(), env.with_bindings(bindings))? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
    Rc::new(Relation { name, solutions })
}

/// Wraps a deterministic text matcher: emits tokens in write mode, or
/// matches the next token(s) against the buffer in read mode (§4.7, §4.8).
pub fn text_matcher(
    name: StringId,
    tokens: impl Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> Option<Vec<crate::textbuffer::Token>> + 'static,
) -> Rc<dyn Primitive> {
    struct Matcher<F> {
        name: StringId,
        tokens: F,
    }
    impl<F> std::fmt::Debug for Matcher<F> {
        fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            fmt.debug_struct("TextMatcher").finish()
        }
    }
    impl<F: Fn(&[Term], &Option<Rc<Frame>>, &BindingList) -> Option<Vec<crate::textbuffer::Token>>> Primitive
        for Matcher<F>
    {
        fn name(&self) -> StringId {
            self.name
        }

        fn call(
            &self,
            args: &[Term],
            output: TextBuffer,
            env: Env,
            _predecessor: Option<Rc<Frame>>,
            k: &mut Cont<'_>,
        ) -> StepResult {
            let Some(toks) = (self.tokens)(args, &env.frame, &env.bindings) else {
                return Ok(false);
            };
            if output.is_write_mode() {
                k(output.append(&toks), env)
            } else {
                match output.unify_tokens(&toks) {
                    Some(advanced) => k(advanced, env),
                    None => Ok(false),
                }
            }
        }
    }
    Rc::new(Matcher { name, tokens })
}

/// A pure, deterministic function over already-dereferenced ground terms,
/// used by the `Assignment` step's arithmetic/functional expression
/// evaluator (§4.4) — distinct from [`Primitive`] because arithmetic never
/// backtracks, emits text, or touches state, so it needs none of the
/// continuation machinery.
pub type PureFn = Rc<dyn Fn(&[Term]) -> Option<Term>>;

#[derive(Default)]
pub struct PureFnRegistry {
    entries: ahash::AHashMap<StringId, PureFn>,
}

impl std::fmt::Debug for PureFnRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PureFnRegistry").field("len", &self.entries.len()).finish()
    }
}

impl PureFnRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: StringId, f: impl Fn(&[Term]) -> Option<Term> + 'static) {
        self.entries.insert(name, Rc::new(f));
    }

    #[must_use]
    pub fn get(&self, name: StringId) -> Option<PureFn> {
        self.entries.get(&name).cloned()
    }
}
