//! Tasks and methods: the unit of definition and the dispatch algorithm
//! that picks among a task's methods (spec §4.5).
//!
//! Grounds the "one name, several implementations, try in order" shape on
//! `ouros::function::Function` (immutable call metadata) plus
//! `ouros::builtins::mod.rs`'s single dispatch point for either a Python
//! function or a builtin — here a `Task` is either a primitive or a set of
//! user-defined `Method`s, and `Task::call` is that single dispatch point.

use std::rc::Rc;

use crate::{
    binding::deref,
    env::Env,
    error::{ExecError, ExecErrorKind},
    frame::{Frame, FrameTrace},
    intern::StringId,
    primitive::{Cont, StepResult},
    step::Step,
    term::{LogicVar, Term},
    textbuffer::TextBuffer,
};

/// One clause of a compound task: a head pattern (unified against call
/// arguments), a fresh-local count, and a body step chain (`None` for a
/// fact with no body — it always succeeds once its head unifies).
#[derive(Debug)]
pub struct Method {
    pub task_name: StringId,
    /// Head pattern, one term per declared parameter, expressed in terms of
    /// `Term::Local` slots that get bound fresh on each activation.
    pub head: Vec<Term>,
    pub local_count: u16,
    pub body: Option<Rc<Step>>,
    /// Relative likelihood this method is tried first under a task's
    /// `Weighted` dispatch order (spec §4.5); ignored otherwise.
    pub weight: f64,
}

impl Method {
    /// A placeholder method used only to give the top-level [`Frame::root`]
    /// something to point at; never dispatched through, never appears in a
    /// frame trace a user sees (the root frame is always stripped from
    /// `caller_chain` output by callers that render traces, since it names
    /// no real call).
    #[must_use]
    pub fn synthetic_root() -> Rc<Self> {
        Rc::new(Self {
            task_name: StringId::from_raw(u32::MAX),
            head: Vec::new(),
            local_count: 0,
            body: None,
            weight: 1.0,
        })
    }
}

/// How a task's methods are tried (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOrder {
    /// Declaration order, first match wins the attempt (still backtracks
    /// into later methods if everything downstream later fails).
    InOrder,
    /// A fresh random permutation is chosen once per call.
    Shuffled,
    /// Declaration order but weighted random selection without replacement,
    /// using each method's `weight`.
    Weighted,
}

#[derive(Debug)]
pub struct CompoundTask {
    pub name: StringId,
    pub methods: Vec<Rc<Method>>,
    pub order: DispatchOrder,
    /// If true, at least one method's head must unify or the whole call is
    /// a fatal error rather than a plain failure (spec §4.5 "must-succeed
    /// tasks").
    pub must_succeed: bool,
}

/// A task is either a primitive (native Rust implementation) or a
/// user-defined compound task with one or more methods.
#[derive(Debug)]
pub enum Task {
    Primitive(Rc<dyn crate::primitive::Primitive>),
    Compound(CompoundTask),
}

impl Task {
    /// Invokes the task: dispatches to the primitive, or tries the compound
    /// task's methods per its `DispatchOrder`, backtracking into the next
    /// method whenever the continuation eventually reports failure.
    ///
    /// `caller` is the lexical frame the call site belongs to; `predecessor`
    /// is the most recently succeeded frame (goal-chain reflection, spec
    /// §3). A fresh [`Frame`] is pushed per method attempt, so each
    /// attempt's locals are independent even though they share `caller`.
    pub fn call(
        &self,
        args: &[Term],
        output: TextBuffer,
        env: Env,
        caller: Option<Rc<Frame>>,
        predecessor: Option<Rc<Frame>>,
        k: &mut Cont<'_>,
    ) -> StepResult {
        match self {
            Task::Primitive(prim) => prim.call(args, output, env, predecessor, k),
            Task::Compound(task) => Self::call_compound(task, args, output, env, caller, predecessor, k),
        }
    }

    fn call_compound(
        task: &CompoundTask,
        args: &[Term],
        output: TextBuffer,
        env: Env,
        caller: Option<Rc<Frame>>,
        predecessor: Option<Rc<Frame>>,
        k: &mut Cont<'_>,
    ) -> StepResult {
        let order = Self::method_order(task, &env);
        let mut any_head_matched = false;

        for method in order {
            let _guard = env.resources.borrow_mut().enter_frame().map_err(|e| {
                ExecError::new(ExecErrorKind::ResourceExhausted(e), FrameTrace::capture_opt(caller.as_ref()))
            })?;

            let locals: Vec<LogicVar> = (0..method.local_count)
                .map(|i| env.program.vars.fresh(method.head.get(i as usize).and_then(local_name)))
                .collect();
            let depth = caller.as_ref().map_or(0, |f| f.depth + 1);
            let frame = Rc::new(Frame::new(
                Rc::clone(&method),
                locals,
                args.to_vec(),
                caller.clone(),
                predecessor.clone(),
                depth,
            ));

            let mut bindings = env.bindings.clone();
            let mut matched = true;
            if method.head.len() != args.len() {
                matched = false;
            } else {
                for (param, arg) in method.head.iter().zip(args.iter()) {
                    match crate::unify::unify(param, arg, Some(&frame), &bindings) {
                        Ok(next) => bindings = next,
                        Err(_) => {
                            matched = false;
                            break;
                        }
                    }
                }
            }

            if !matched {
                continue;
            }
            any_head_matched = true;
            env.tracer.on_method_match(&frame);

            let call_env = env.with_bindings(bindings).with_frame(Rc::clone(&frame));
            let body = method.body.clone();
            let succeeded = crate::step::eval_chain(body.as_ref(), output.clone(), call_env, Some(frame.clone()), k)?;
            if succeeded {
                return Ok(true);
            }
            env.tracer.on_backtrack(&frame);
        }

        if !any_head_matched && task.must_succeed {
            return Err(ExecError::new(
                ExecErrorKind::CallFailed {
                    task: env.program.interner.resolve(task.name).to_string(),
                },
                FrameTrace::capture_opt(caller.as_ref()),
            ));
        }
        Ok(false)
    }

    fn method_order(task: &CompoundTask, env: &Env) -> Vec<Rc<Method>> {
        match task.order {
            DispatchOrder::InOrder => task.methods.clone(),
            DispatchOrder::Shuffled => {
                use rand::seq::SliceRandom;
                let mut methods = task.methods.clone();
                methods.shuffle(&mut *env.program.rng.borrow_mut());
                methods
            }
            DispatchOrder::Weighted => weighted_order(&task.methods, &env.program.rng),
        }
    }
}

/// Best-effort recovery of a head parameter's source name, for nicer
/// variable rendering in traces; only `Term::Var` heads (the common case
/// for a fresh per-call parameter) carry one.
fn local_name(term: &Term) -> Option<StringId> {
    match term {
        Term::Var(v) => v.name,
        _ => None,
    }
}

/// Weighted random order without replacement (spec §4.5 `Weighted`):
/// repeatedly draws one remaining method with probability proportional to
/// its `weight`.
fn weighted_order(methods: &[Rc<Method>], rng: &std::cell::RefCell<rand_chacha::ChaCha8Rng>) -> Vec<Rc<Method>> {
    use rand::Rng;

    let mut pool: Vec<Rc<Method>> = methods.to_vec();
    let mut out = Vec::with_capacity(pool.len());
    let mut rng = rng.borrow_mut();
    while !pool.is_empty() {
        let total: f64 = pool.iter().map(|m| m.weight.max(0.0)).sum();
        let pick = if total <= 0.0 {
            0
        } else {
            let mut r = rng.gen_range(0.0..total);
            let mut idx = pool.len() - 1;
            for (i, m) in pool.iter().enumerate() {
                let w = m.weight.max(0.0);
                if r < w {
                    idx = i;
                    break;
                }
                r -= w;
            }
            idx
        };
        out.push(pool.remove(pick));
    }
    out
}

/// Fallback used when a compound-task call site dereferences its target but
/// finds an ordinary value instead of a task (spec §4.6's non-task call
/// dispatch lives in [`crate::call`]; this just resolves `Term::Task`
/// references down to the registered `Task`).
#[must_use]
pub fn resolve_task_ref(term: &Term, env: &Env) -> Option<Rc<Task>> {
    match deref(term.clone(), env.frame.as_deref(), &env.bindings) {
        Term::Task(r) => env.program.lookup_task(r.0),
        _ => None,
    }
}
