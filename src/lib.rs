//! Execution core for a text-generation / logic-programming language: a
//! term model and unifier, persistent binding/state/KB stores, a
//! continuation-passing step evaluator, method dispatch, and the
//! higher-order control built-ins layered on top (negation, find-all,
//! once, best-first search).
//!
//! This crate is the *runtime*, not the language: it consumes
//! already-constructed [`method::Method`] bodies ([`step::Step`] chains)
//! and a [`primitive::Primitive`] registry. Turning source text into those
//! structures — parsing, file loading, a debugger wrapper, a
//! documentation indexer — is an embedding host's job, not this crate's.

mod binding;
pub mod builtins;
mod call;
mod env;
mod error;
mod frame;
mod intern;
mod kb;
mod method;
mod primitive;
mod resource;
mod runner;
mod state;
mod step;
mod term;
mod textbuffer;
mod tracer;
mod unify;

pub use crate::{
    binding::{deref, BindingList},
    call::{dispatch as dispatch_call, stringify},
    env::{Env, Program, ProgramBuilder},
    error::{ArityExpectation, ExecError, ExecErrorKind, ExecResult, UnifyFail},
    frame::{Frame, FrameTrace, FrameTraceEntry},
    intern::{DisplayName, Interner, StringId},
    kb::{Kb, KbWriteError, PathElem, Sep},
    method::{CompoundTask, DispatchOrder, Method, Task},
    primitive::{
        deterministic_function, deterministic_predicate, nondeterministic_relation, text_matcher, Cont, Primitive,
        PrimitiveRegistry, PureFn, PureFnRegistry, StepResult,
    },
    resource::{ResourceError, ResourceLimits, ResourceTracker, DEFAULT_MAX_RECURSION_DEPTH},
    runner::{join_tokens, Runner, Solution},
    state::{State, StateDefaults, StateKeyAllocator},
    step::{eval_chain, AssignTarget, CoolDuration, Expr, Step, StepKind},
    term::{
        structurally_equal, term_cmp, Atom, AtomKey, FeatureMap, LocalSlot, LogicVar, Number, StateKey, TaskRef, Term,
        VarAllocator,
    },
    textbuffer::{TextBuffer, Token},
    tracer::{NoopTracer, RecordingTracer, TraceEvent, Tracer},
    unify::unify,
};
