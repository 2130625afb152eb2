//! Optional reflection/debugging hooks.
//!
//! Grounds on `ouros::tracer::VmTracer` (a trait of call/exit/fail hooks fed
//! by the VM loop, with a `NoopTracer` default). Spec §5 is explicit that a
//! `break`/`step` debugger handshake is an *external wrapper*, not part of
//! the core; this trait is the seam such a wrapper attaches to, not an
//! implementation of one.

use std::rc::Rc;

use crate::{frame::Frame, intern::StringId};

pub trait Tracer: std::fmt::Debug {
    fn on_call(&self, _task: StringId, _frame: &Rc<Frame>) {}
    fn on_method_match(&self, _frame: &Rc<Frame>) {}
    fn on_backtrack(&self, _frame: &Rc<Frame>) {}
}

/// Default tracer: does nothing. Zero overhead beyond a vtable call the
/// optimizer typically inlines away.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Records call/backtrack events in order, for tests and for embeddings that
/// want a cheap trace without implementing their own `Tracer`.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub events: std::cell::RefCell<Vec<TraceEvent>>,
}

#[derive(Debug, Clone)]
pub enum TraceEvent {
    Call(StringId),
    MethodMatch,
    Backtrack,
}

impl Tracer for RecordingTracer {
    fn on_call(&self, task: StringId, _frame: &Rc<Frame>) {
        self.events.borrow_mut().push(TraceEvent::Call(task));
    }

    fn on_method_match(&self, _frame: &Rc<Frame>) {
        self.events.borrow_mut().push(TraceEvent::MethodMatch);
    }

    fn on_backtrack(&self, _frame: &Rc<Frame>) {
        self.events.borrow_mut().push(TraceEvent::Backtrack);
    }
}
