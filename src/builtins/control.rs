//! `Begin`/`And`, `Or`, `Not`/`NotAny`, `Once`/`ExactlyOnce` (spec §4.9).

use std::rc::Rc;

use crate::{
    binding::deref,
    env::{Env, ProgramBuilder},
    error::{ExecError, ExecErrorKind},
    frame::{Frame, FrameTrace},
    primitive::{Cont, Primitive, StepResult},
    term::Term,
    textbuffer::TextBuffer,
};

use super::{call_goal, name};

#[derive(Debug)]
struct Begin;
impl Primitive for Begin {
    fn name(&self) -> crate::intern::StringId {
        unreachable!("registered under a dynamic name")
    }
    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        run_sequence(args, 0, output, env, predecessor, k)
    }
}

fn run_sequence(
    goals: &[Term],
    idx: usize,
    output: TextBuffer,
    env: Env,
    predecessor: Option<Rc<Frame>>,
    k: &mut Cont<'_>,
) -> StepResult {
    match goals.get(idx) {
        None => k(output, env),
        Some(goal) => {
            let goal = goal.clone();
            let rest = goals.to_vec();
            call_goal(&goal, output, env, predecessor.clone(), &mut move |out, env| {
                run_sequence(&rest, idx + 1, out, env, predecessor.clone(), k)
            })
        }
    }
}

#[derive(Debug)]
struct Or;
impl Primitive for Or {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }
    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        for goal in args {
            if call_goal(goal, output.clone(), env.clone(), predecessor.clone(), k)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug)]
struct Not;
impl Primitive for Not {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }
    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let Some(goal) = args.first() else { return Ok(false) };
        let resolved = deref(goal.clone(), env.frame.as_deref(), &env.bindings);
        if !resolved.is_ground(env.frame.as_deref(), &env.bindings) {
            return Err(ExecError::new(
                ExecErrorKind::ArgInstantiation {
                    task: "Not".to_string(),
                    position: 0,
                    expected_ground: true,
                },
                FrameTrace::capture_opt(env.frame.as_ref()),
            ));
        }
        let mut found = false;
        // A throwaway buffer: text emitted by the negated goal never reaches
        // the outer output (spec: "emits no text ... on success", and since
        // we stop at the first solution, discarded output from a failing
        // branch can't leak either).
        call_goal(&resolved, TextBuffer::write_mode(), env.clone(), predecessor, &mut |_out, _env| {
            found = true;
            Ok(true)
        })?;
        if found {
            Ok(false)
        } else {
            k(output, env)
        }
    }
}

#[derive(Debug)]
struct NotAny;
impl Primitive for NotAny {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }
    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let mut found = false;
        for goal in args {
            let resolved = deref(goal.clone(), env.frame.as_deref(), &env.bindings);
            call_goal(&resolved, TextBuffer::write_mode(), env.clone(), predecessor.clone(), &mut |_out, _env| {
                found = true;
                Ok(true)
            })?;
            if found {
                break;
            }
        }
        if found {
            Ok(false)
        } else {
            k(output, env)
        }
    }
}

#[derive(Debug)]
struct Once { must_succeed: bool }
impl Primitive for Once {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }
    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let Some(goal) = args.first() else { return Ok(false) };
        let mut first: Option<(TextBuffer, Env)> = None;
        call_goal(goal, output, env.clone(), predecessor.clone(), &mut |out, env| {
            first = Some((out, env));
            Ok(true)
        })?;
        match first {
            Some((out, env)) => k(out, env),
            None if self.must_succeed => Err(ExecError::new(
                ExecErrorKind::CallFailed { task: "ExactlyOnce".to_string() },
                FrameTrace::capture_opt(env.frame.as_ref()),
            )),
            None => Ok(false),
        }
    }
}

use super::Named;

pub fn register(builder: &mut ProgramBuilder) {
    for n in ["Begin", "And"] {
        builder.register_primitive(Rc::new(Named { inner: Rc::new(Begin), name: name(builder, n) }));
    }
    builder.register_primitive(Rc::new(Named { inner: Rc::new(Or), name: name(builder, "Or") }));
    builder.register_primitive(Rc::new(Named { inner: Rc::new(Not), name: name(builder, "Not") }));
    builder.register_primitive(Rc::new(Named { inner: Rc::new(NotAny), name: name(builder, "NotAny") }));
    builder.register_primitive(Rc::new(Named {
        inner: Rc::new(Once { must_succeed: false }),
        name: name(builder, "Once"),
    }));
    builder.register_primitive(Rc::new(Named {
        inner: Rc::new(Once { must_succeed: true }),
        name: name(builder, "ExactlyOnce"),
    }));
}
