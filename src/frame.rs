//! `MethodCallFrame` and the two stacks it links (spec §4.11).
//!
//! Grounds on `ouros::exception_public::StackFrame` (reflection/trace
//! rendering) and `ouros::function::Function` (immutable call metadata
//! living beside, not inside, the mutable-looking call machinery — here
//! there is no mutation at all, frames are built once and never touched
//! again).

use std::rc::Rc;

use crate::{
    intern::StringId,
    method::Method,
    term::{LogicVar, Term},
};

/// Runtime record of one active method call (spec §3 "Method call frame").
///
/// Created on each method entry; never mutated afterwards. Holds both the
/// lexical caller (who contains the call site) and the predecessor (the most
/// recently succeeded frame, for goal-chain reflection) — these are
/// independent chains, see spec's glossary entries for each.
#[derive(Debug)]
pub struct Frame {
    pub method: Rc<Method>,
    /// One fresh logic variable per local slot, allocated at frame entry.
    pub locals: Vec<LogicVar>,
    /// The resolved call arguments, kept for reflection's "render the
    /// original call expression with substituted values."
    pub call_args: Vec<Term>,
    /// Lexical caller: the frame of the method containing this call site.
    pub caller: Option<Rc<Frame>>,
    /// Goal chain: the most recently succeeded frame, regardless of lexical
    /// nesting.
    pub predecessor: Option<Rc<Frame>>,
    pub depth: usize,
}

impl Frame {
    #[must_use]
    pub fn root() -> Rc<Self> {
        Rc::new(Self {
            method: Method::synthetic_root(),
            locals: Vec::new(),
            call_args: Vec::new(),
            caller: None,
            predecessor: None,
            depth: 0,
        })
    }

    #[must_use]
    pub fn new(
        method: Rc<Method>,
        locals: Vec<LogicVar>,
        call_args: Vec<Term>,
        caller: Option<Rc<Frame>>,
        predecessor: Option<Rc<Frame>>,
        depth: usize,
    ) -> Self {
        Self {
            method,
            locals,
            call_args,
            caller,
            predecessor,
            depth,
        }
    }

    /// Resolves a local-variable slot reference to the frame's fresh logic
    /// variable for that slot, wrapped as a term so [`crate::binding::deref`]
    /// can continue through the binding list.
    #[must_use]
    pub fn local(&self, slot: crate::term::LocalSlot) -> Term {
        Term::Var(self.locals[slot.0 as usize])
    }

    /// Walks the lexical caller chain, innermost first.
    pub fn caller_chain(self: &Rc<Self>) -> impl Iterator<Item = Rc<Frame>> {
        let mut cur = Some(Rc::clone(self));
        std::iter::from_fn(move || {
            let this = cur.take()?;
            cur = this.caller.clone();
            Some(this)
        })
    }

    /// Walks the goal (predecessor) chain, innermost first.
    pub fn goal_chain(self: &Rc<Self>) -> impl Iterator<Item = Rc<Frame>> {
        let mut cur = Some(Rc::clone(self));
        std::iter::from_fn(move || {
            let this = cur.take()?;
            cur = this.predecessor.clone();
            Some(this)
        })
    }

    #[must_use]
    pub fn task_name(&self) -> StringId {
        self.method.task_name
    }
}

/// Read-only snapshot of a frame chain, captured when an [`crate::error::ExecError`]
/// is raised, so the error can outlive the `Rc<Frame>` chain it describes
/// (the chain may reference frames that get dropped once unwinding
/// completes). Kept deliberately small: task name plus resolved call args
/// per level.
#[derive(Debug, Clone, Default)]
pub struct FrameTrace(pub Vec<FrameTraceEntry>);

#[derive(Debug, Clone)]
pub struct FrameTraceEntry {
    pub task_name: StringId,
    pub call_args: Vec<Term>,
}

impl FrameTrace {
    #[must_use]
    pub fn capture(frame: &Rc<Frame>) -> Self {
        Self(
            frame
                .caller_chain()
                .map(|f| FrameTraceEntry {
                    task_name: f.task_name(),
                    call_args: f.call_args.clone(),
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Convenience for call sites that only have `Option<&Rc<Frame>>` on
    /// hand (e.g. before a frame has been pushed for the failing call).
    #[must_use]
    pub fn capture_opt(frame: Option<&Rc<Frame>>) -> Self {
        frame.map_or_else(Self::empty, Self::capture)
    }
}
