//! Step chains: the compiled body of a method (spec §4.4).
//!
//! A `Step` is one cell of a singly-linked chain, exactly as spec describes
//! it: each step holds a reference to the next step, and succeeds by
//! invoking a continuation that ultimately runs that next step (or, at the
//! end of the chain, whatever continuation the caller supplied). Grounds
//! the CPS shape on `ouros::run.rs`'s frame-stepping loop, reworked from an
//! imperative bytecode loop into an explicit `Cont` chain because our
//! control-flow primitives (`Branch`, `Cool`, and every higher-order
//! built-in in `crate::builtins`) need to *retry* a continuation on
//! backtracking, not just fall through once.

use std::rc::Rc;

use crate::{
    binding::{deref, BindingList},
    env::Env,
    error::{ExecError, ExecErrorKind},
    frame::Frame,
    primitive::{Cont, StepResult},
    state::State,
    term::{LocalSlot, StateKey, Term},
    textbuffer::{Token, TextBuffer},
};

/// A pure arithmetic/functional expression, evaluated by `Assignment`
/// (spec §4.4). Deliberately separate from the general `Call` step: this
/// evaluation is synchronous and touches neither the output buffer nor
/// `State`'s override chain (it only reads), so it needs none of the
/// continuation machinery a task call does.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal or a reference (`Local`/`StateVar`/`Var`) resolved via the
    /// normal deref chain, reading through to the current fluent value when
    /// what's left after deref is a `StateVar` (`Env::resolve`).
    Value(Term),
    /// Application of a registered pure function (spec §4.7 "deterministic
    /// N-ary function"), e.g. arithmetic operators.
    Apply(crate::intern::StringId, Vec<Expr>),
}

impl Expr {
    /// Evaluates the expression. Returns `None` if a referenced pure
    /// function is unregistered or refuses its arguments (a type mismatch),
    /// which the caller treats as plain logical failure, not a fatal error.
    pub fn eval(&self, env: &Env) -> Option<Term> {
        match self {
            Expr::Value(t) => Some(env.resolve(t.clone())),
            Expr::Apply(name, args) => {
                let f = env.program.pure_fns.get(*name)?;
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(a.eval(env)?);
                }
                f(&values)
            }
        }
    }
}

/// Where an `Assignment` step's computed value goes (spec §4.4).
#[derive(Debug, Clone)]
pub enum AssignTarget {
    State(StateKey),
    Local(LocalSlot),
}

/// How long a `Cool`-guarded call site stays cool after a success (spec
/// §4.4). `Forever` models the `Once`-like "never again this session"
/// shape; `Calls(n)` refuses exactly the next `n` calls through this site.
#[derive(Debug, Clone, Copy)]
pub enum CoolDuration {
    Calls(u32),
    Forever,
}

#[derive(Debug)]
pub enum StepKind {
    /// Appends literal tokens to the output buffer in write mode, or
    /// matches them against it in read mode (spec §4.4, §4.8).
    Emit(Vec<Token>),
    /// Invokes another task by name or value, per the call-step dispatch
    /// rules (spec §4.6, implemented in [`crate::call`]).
    Call { target: Term, args: Vec<Term> },
    Assignment { target: AssignTarget, expr: Expr },
    /// Tries each alternative body in order (or, if `shuffled`, in a
    /// random order chosen once per activation); the first alternative
    /// whose body succeeds — followed by this step's own `next` — wins.
    Branch { alternatives: Vec<Rc<Step>>, shuffled: bool },
    /// Gates `body` behind a per-site call counter kept in `State` at
    /// `counter_key` (spec §4.4). While the counter is positive the whole
    /// step fails outright, with no state change, which is what keeps
    /// backtracking "cool" correctly: undoing the success that set the
    /// counter also undoes the gate, since state is only ever carried
    /// forward through a continuation that actually commits.
    Cool { counter_key: StateKey, duration: CoolDuration, body: Rc<Step> },
    /// Conses `value` onto the head of a list-valued state variable.
    AddNext { target: StateKey, value: Expr },
    /// Pops the head of a list-valued state variable, unifying it with
    /// `into` if present; fails if the list is empty.
    RemoveNext { target: StateKey, into: Option<LocalSlot> },
}

/// One cell of a method body's step chain.
#[derive(Debug)]
pub struct Step {
    pub kind: StepKind,
    pub next: Option<Rc<Step>>,
}

impl Step {
    #[must_use]
    pub fn new(kind: StepKind, next: Option<Rc<Step>>) -> Rc<Self> {
        Rc::new(Self { kind, next })
    }
}

/// Runs a full step chain starting at `head`, eventually invoking `k` once
/// the chain is exhausted. `predecessor` is threaded through unchanged: it
/// names the frame whose successful completion preceded this chain, for
/// goal-chain reflection (spec §3).
pub fn eval_chain(
    head: Option<&Rc<Step>>,
    output: TextBuffer,
    env: Env,
    predecessor: Option<Rc<Frame>>,
    k: &mut Cont<'_>,
) -> StepResult {
    let Some(step) = head else {
        return k(output, env);
    };
    let next = step.next.clone();
    let pred = predecessor.clone();
    eval_step(step, output, env, predecessor, &mut move |out, env| {
        eval_chain(next.as_ref(), out, env, pred.clone(), k)
    })
}

fn eval_step(
    step: &Step,
    output: TextBuffer,
    env: Env,
    predecessor: Option<Rc<Frame>>,
    k: &mut Cont<'_>,
) -> StepResult {
    env.resources.borrow_mut().tick_step().map_err(|e| {
        ExecError::new(
            ExecErrorKind::ResourceExhausted(e),
            crate::frame::FrameTrace::capture_opt(env.frame.as_ref()),
        )
    })?;

    match &step.kind {
        StepKind::Emit(tokens) => {
            if output.is_write_mode() {
                k(output.append(tokens), env)
            } else {
                match output.unify_tokens(tokens) {
                    Some(advanced) => k(advanced, env),
                    None => Ok(false),
                }
            }
        }

        StepKind::Call { target, args } => crate::call::dispatch(target, args, output, env, predecessor, k),

        StepKind::Assignment { target, expr } => {
            let Some(value) = expr.eval(&env) else {
                return Ok(false);
            };
            if !value.is_ground(env.frame.as_deref(), &env.bindings) {
                return Ok(false);
            }
            match target {
                AssignTarget::State(key) => {
                    let state = env.state.bind(*key, value);
                    k(output, env.with_state(state))
                }
                AssignTarget::Local(slot) => {
                    let local = env.frame.as_ref().map_or(Term::null(), |f| f.local(*slot));
                    match crate::unify::unify(&local, &value, env.frame.as_deref(), &env.bindings) {
                        Ok(bindings) => k(output, env.with_bindings(bindings)),
                        Err(_) => Ok(false),
                    }
                }
            }
        }

        StepKind::Branch { alternatives, shuffled } => {
            if *shuffled {
                let mut order: Vec<usize> = (0..alternatives.len()).collect();
                shuffle_in_place(&mut order, &env);
                for i in order {
                    if eval_chain(Some(&alternatives[i]), output.clone(), env.clone(), predecessor.clone(), k)? {
                        return Ok(true);
                    }
                }
            } else {
                for alt in alternatives {
                    if eval_chain(Some(alt), output.clone(), env.clone(), predecessor.clone(), k)? {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }

        StepKind::Cool { counter_key, duration, body } => {
            let remaining = match env.state.get_override(*counter_key) {
                Some(Term::Atom(crate::term::Atom::Num(crate::term::Number::Int(n)))) => n,
                _ => 0,
            };
            if remaining > 0 {
                return Ok(false);
            }
            let key = *counter_key;
            let set_to = match duration {
                CoolDuration::Calls(n) => i64::from(*n),
                CoolDuration::Forever => i64::MAX,
            };
            eval_chain(Some(body), output, env, predecessor, &mut move |out, env| {
                let state = env.state.bind(key, Term::int(set_to));
                k(out, env.with_state(state))
            })
        }

        StepKind::AddNext { target, value } => {
            let Some(value) = value.eval(&env) else {
                return Ok(false);
            };
            let current = env.state.get_override(*target).unwrap_or_else(Term::null);
            let new_list = Term::Pair(Rc::new(value), Rc::new(current));
            let state = env.state.bind(*target, new_list);
            k(output, env.with_state(state))
        }

        StepKind::RemoveNext { target, into } => {
            let current = deref(
                env.state.get_override(*target).unwrap_or_else(Term::null),
                env.frame.as_deref(),
                &env.bindings,
            );
            let Term::Pair(head, tail) = current else {
                return Ok(false);
            };
            let state = env.state.bind(*target, (*tail).clone());
            let env = env.with_state(state);
            match into {
                Some(slot) => {
                    let local = env.frame.as_ref().map_or(Term::null(), |f| f.local(*slot));
                    match crate::unify::unify(&local, &head, env.frame.as_deref(), &env.bindings) {
                        Ok(bindings) => k(output, env.with_bindings(bindings)),
                        Err(_) => Ok(false),
                    }
                }
                None => k(output, env),
            }
        }
    }
}

/// Shuffles `order` using the program's seeded RNG (spec §4.9 `Branch`
/// "shuffled" mode and method-dispatch shuffling share the same source of
/// randomness, for reproducible replay given a fixed seed).
fn shuffle_in_place(order: &mut [usize], env: &Env) {
    use rand::seq::SliceRandom;
    let mut rng = env.program.rng.borrow_mut();
    order.shuffle(&mut *rng);
}
