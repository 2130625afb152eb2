//! Shared scaffolding for hand-building test programs.
//!
//! There is no parser in this crate (spec §1 out-of-scope), so every
//! integration test constructs its program directly through
//! `ProgramBuilder`/`Method`/`Step`/`Term`. These helpers just cut down on
//! the boilerplate of doing that for the common shapes: fact methods,
//! step chains, and running a task to its solution set.

#![allow(dead_code)]

use std::rc::Rc;

use taleforge_core::{
    builtins, AssignTarget, CompoundTask, DispatchOrder, Expr, ExecResult, Method, Program, ProgramBuilder,
    ResourceLimits, Runner, Solution, Step, StepKind, StringId, Task, Term, Token,
};

/// A fresh builder with every built-in primitive registered, seeded for
/// reproducible `Shuffled`/`Weighted` dispatch across test runs.
#[must_use]
pub fn builder() -> ProgramBuilder {
    let mut b = ProgramBuilder::new();
    b.with_seed(7);
    builtins::register_all(&mut b);
    b
}

#[must_use]
pub fn intern(b: &ProgramBuilder, s: &str) -> StringId {
    b.interner().intern(s)
}

/// A fact method: no body, succeeds as soon as its head unifies.
#[must_use]
pub fn fact(task_name: StringId, head: Vec<Term>) -> Rc<Method> {
    Rc::new(Method { task_name, head, local_count: 0, body: None, weight: 1.0 })
}

#[must_use]
pub fn method(task_name: StringId, head: Vec<Term>, local_count: u16, body: Option<Rc<Step>>) -> Rc<Method> {
    Rc::new(Method { task_name, head, local_count, body, weight: 1.0 })
}

/// Registers a compound task made of `methods`, returning its interned name.
pub fn register_compound(
    b: &mut ProgramBuilder,
    name: &str,
    methods: Vec<Rc<Method>>,
    order: DispatchOrder,
    must_succeed: bool,
) -> StringId {
    let id = intern(b, name);
    b.register_task(id, Rc::new(Task::Compound(CompoundTask { name: id, methods, order, must_succeed })));
    id
}

#[must_use]
pub fn task_ref(name: StringId) -> Term {
    Term::Task(taleforge_core::TaskRef(name))
}

#[must_use]
pub fn emit(text: &str, next: Option<Rc<Step>>) -> Rc<Step> {
    Step::new(StepKind::Emit(vec![Token::text(text)]), next)
}

#[must_use]
pub fn call_step(target: Term, args: Vec<Term>, next: Option<Rc<Step>>) -> Rc<Step> {
    Step::new(StepKind::Call { target, args }, next)
}

#[must_use]
pub fn assign_state(key: taleforge_core::StateKey, expr: Expr, next: Option<Rc<Step>>) -> Rc<Step> {
    Step::new(StepKind::Assignment { target: AssignTarget::State(key), expr }, next)
}

#[must_use]
pub fn assign_local(slot: taleforge_core::LocalSlot, expr: Expr, next: Option<Rc<Step>>) -> Rc<Step> {
    Step::new(StepKind::Assignment { target: AssignTarget::Local(slot), expr }, next)
}

/// A reified 0-or-more-arg goal term: `Tuple([target, ...args])`, or the bare
/// target itself for a 0-arg call (the shape `split_goal`/`call_goal` expect).
#[must_use]
pub fn goal(target: Term, args: Vec<Term>) -> Term {
    if args.is_empty() {
        target
    } else {
        let mut items = vec![target];
        items.extend(args);
        Term::tuple(items)
    }
}

/// Builds the finished [`Program`] and runs `task` to every solution it has,
/// with no resource limits (test programs are small and don't need the
/// default recursion/step caps).
pub fn run_all(b: ProgramBuilder, task: &str, args: Vec<Term>) -> ExecResult<Vec<Solution>> {
    let program: Program = b.build();
    let runner = Runner::new(program);
    runner.solutions(task, args, ResourceLimits::unbounded())
}

/// Runs `task` to its first solution only.
pub fn run_first(b: ProgramBuilder, task: &str, args: Vec<Term>) -> ExecResult<Option<Solution>> {
    let program: Program = b.build();
    let runner = Runner::new(program);
    runner.call(task, args, ResourceLimits::unbounded())
}
