//! `Program` (the fixed, load-time registry of tasks and primitives) and
//! `Env` (spec §3's `BindingEnvironment`: the immutable, copy-on-change
//! `{module, frame, binding list, state}` bundle threaded through every
//! operation).

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    binding::BindingList,
    frame::Frame,
    intern::{Interner, StringId},
    kb::Kb,
    method::Task,
    primitive::{PrimitiveRegistry, PureFnRegistry},
    resource::ResourceTracker,
    state::{State, StateDefaults, StateKeyAllocator},
    term::{StateKey, VarAllocator},
    tracer::{NoopTracer, Tracer},
};

/// The immutable, load-time-constructed program: tasks, primitives, and the
/// shared allocators/interner a running program needs. Everything here is
/// fixed once `Program::build` returns — the core never adds a task or
/// primitive at runtime (that's the parser/loader's job, out of scope per
/// spec §1).
#[derive(Debug)]
pub struct Program {
    pub interner: Interner,
    pub vars: VarAllocator,
    pub state_keys: StateKeyAllocator,
    pub defaults: StateDefaults,
    pub tasks: AHashMap<StringId, Rc<Task>>,
    pub primitives: PrimitiveRegistry,
    pub pure_fns: PureFnRegistry,
    /// Shared seeded RNG, consulted by `Branch`'s shuffled mode, shuffled
    /// method dispatch, and the `Random*` primitives (spec §4.9, §6), so a
    /// fixed seed reproduces an entire run deterministically.
    pub rng: RefCell<ChaCha8Rng>,
    /// The per-module `Mention` hook task, invoked by call-step dispatch
    /// when a zero-arg call target is an arbitrary value rather than a
    /// task (spec §4.6). `None` falls back to stringify-and-emit.
    pub mention_task: Option<StringId>,
}

impl Program {
    #[must_use]
    pub fn lookup_task(&self, name: StringId) -> Option<Rc<Task>> {
        self.tasks.get(&name).cloned()
    }
}

/// Builds a [`Program`] incrementally; mirrors how an external loader would
/// hand the core a finished set of tasks (spec §6 "the core does not
/// parse" — this builder is *called by* that loader, not a parser itself).
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    interner: Interner,
    vars: VarAllocator,
    state_keys: StateKeyAllocator,
    defaults: StateDefaults,
    tasks: AHashMap<StringId, Rc<Task>>,
    primitives: PrimitiveRegistry,
    pure_fns: PureFnRegistry,
    seed: u64,
    mention_task: Option<StringId>,
}

impl ProgramBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_task(&mut self, name: StringId, task: Rc<Task>) {
        self.tasks.insert(name, task);
    }

    /// Registers a primitive both under its own name, in the flat task
    /// namespace `Call` steps dispatch through (spec §4.6/§4.7 draw no
    /// distinction between calling a compound task and a primitive one), and
    /// in the `PrimitiveRegistry`, which an embedding can use to introspect
    /// what's available without touching the task map directly.
    pub fn register_primitive(&mut self, prim: Rc<dyn crate::primitive::Primitive>) {
        let name = prim.name();
        self.tasks.insert(name, Rc::new(crate::method::Task::Primitive(Rc::clone(&prim))));
        self.primitives.register(prim);
    }

    pub fn register_pure_fn(&mut self, name: StringId, f: impl Fn(&[crate::term::Term]) -> Option<crate::term::Term> + 'static) {
        self.pure_fns.register(name, f);
    }

    /// Seeds the program's shared RNG; defaults to `0` if never called,
    /// which is deterministic but not secret — callers that want
    /// unpredictable randomization should seed from their own entropy
    /// source before building.
    pub fn with_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    pub fn set_mention_task(&mut self, name: StringId) {
        self.mention_task = Some(name);
    }

    /// Allocates a fresh `StateKey` for a user global/fluent and registers
    /// its default value (spec §4.3 "a per-element default").
    pub fn fresh_state_key(&mut self, default: crate::term::Term) -> StateKey {
        let key = self.state_keys.fresh();
        self.defaults.register(key, default);
        key
    }

    #[must_use]
    pub fn build(self) -> Program {
        Program {
            interner: self.interner,
            vars: self.vars,
            state_keys: self.state_keys,
            defaults: self.defaults,
            tasks: self.tasks,
            primitives: self.primitives,
            pure_fns: self.pure_fns,
            rng: RefCell::new(ChaCha8Rng::seed_from_u64(self.seed)),
            mention_task: self.mention_task,
        }
    }

    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    #[must_use]
    pub fn vars(&self) -> &VarAllocator {
        &self.vars
    }
}

/// spec §3's `BindingEnvironment`: `{module, current frame, binding list,
/// state}`, plus the ambient resource tracker and tracer (SPEC_FULL.md §4.4
/// addition), plus the exclusion-logic KB root.
///
/// Spec §4.10/§6 describe the KB root as living "in the environment's State
/// under a well-known state element." We thread it as its own `Rc`-shared
/// field instead of forcing it through `Term` (which would otherwise need a
/// host-specific variant breaking spec §3's closed term-variant list); the
/// observable behavior is identical — cloning `Env` snapshots the KB exactly
/// like any other state element, and an older `Env`'s KB stays valid after a
/// younger one writes to it, per spec §3's state-snapshot invariant.
#[derive(Clone)]
pub struct Env {
    pub program: Rc<Program>,
    pub frame: Option<Rc<Frame>>,
    pub bindings: BindingList,
    pub state: State,
    pub kb: Kb,
    pub resources: Rc<RefCell<ResourceTracker>>,
    pub tracer: Rc<dyn Tracer>,
}

impl Env {
    #[must_use]
    pub fn new(program: Rc<Program>, resources: ResourceTracker) -> Self {
        Self {
            program,
            frame: Some(Frame::root()),
            bindings: BindingList::empty(),
            state: State::empty(),
            kb: Kb::empty(),
            resources: Rc::new(RefCell::new(resources)),
            tracer: Rc::new(NoopTracer),
        }
    }

    #[must_use]
    pub fn with_tracer(mut self, tracer: Rc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    #[must_use]
    pub fn with_bindings(&self, bindings: BindingList) -> Self {
        Self {
            bindings,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_state(&self, state: State) -> Self {
        Self { state, ..self.clone() }
    }

    #[must_use]
    pub fn with_frame(&self, frame: Rc<Frame>) -> Self {
        Self {
            frame: Some(frame),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_kb(&self, kb: Kb) -> Self {
        Self { kb, ..self.clone() }
    }

    #[must_use]
    pub fn frame(&self) -> Option<&Rc<Frame>> {
        self.frame.as_ref()
    }

    /// Resolves a term to the value an operation should actually act on:
    /// first through the ordinary local/logic-variable deref chain, then —
    /// if what's left is a bare state-variable reference — through the
    /// state map (override, else registered default, spec §4.3 `TryGet`).
    ///
    /// State is a component of the binding environment separate from the
    /// binding list (spec §3), consulted only where an operation explicitly
    /// reads a fluent: a call step's target/args (spec §4.6, "dereferenced
    /// before dispatch") and an assignment's right-hand expression (spec
    /// §4.4, "resolved via the normal deref chain"). Plain structural
    /// unification never reaches into `State` on its own.
    #[must_use]
    pub fn resolve(&self, term: crate::term::Term) -> crate::term::Term {
        let term = crate::binding::deref(term, self.frame.as_deref(), &self.bindings);
        match term {
            crate::term::Term::StateVar(key) => {
                let value = self.program.defaults.try_get(&self.state, key);
                crate::binding::deref(value, self.frame.as_deref(), &self.bindings)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("frame_depth", &self.frame.as_ref().map_or(0, |f| f.depth))
            .finish()
    }
}
