//! Exclusion-logic KB primitives: `Write`, `Delete`, `Lookup`, `Dump` (spec
//! §4.10, §6).
//!
//! A sentence is passed as a cons-list of `(isExclusive, key)` pairs: the
//! boolean atom distinguishes `!` (exclusive, `true`) from `/`
//! (non-exclusive, `false`). This is the loader's encoding of spec §4.10's
//! path syntax down to a plain term, chosen because `Term` has no dedicated
//! separator variant.

use std::rc::Rc;

use crate::{
    binding::deref,
    env::{Env, ProgramBuilder},
    error::{ExecError, ExecErrorKind},
    frame::{Frame, FrameTrace},
    kb::{KbWriteError, PathElem, Sep},
    primitive::{Cont, Primitive, StepResult},
    term::{Atom, Term},
};

use super::name;

fn sequence_items(seq: &Term) -> Vec<Term> {
    match seq {
        Term::Tuple(items) => items.to_vec(),
        Term::Pair(h, t) => {
            let mut out = vec![(**h).clone()];
            out.extend(sequence_items(t));
            out
        }
        _ => Vec::new(),
    }
}

fn term_to_path(path: &Term, env: &Env) -> Option<Vec<PathElem>> {
    let path = deref(path.clone(), env.frame.as_deref(), &env.bindings);
    sequence_items(&path)
        .into_iter()
        .map(|elem| {
            let elem = deref(elem, env.frame.as_deref(), &env.bindings);
            let items = sequence_items(&elem);
            let [exclusive, key] = <[Term; 2]>::try_from(items).ok()?;
            let sep = match deref(exclusive, env.frame.as_deref(), &env.bindings) {
                Term::Atom(Atom::Bool(true)) => Sep::Bang,
                Term::Atom(Atom::Bool(false)) => Sep::Slash,
                _ => return None,
            };
            Some(PathElem { sep, key })
        })
        .collect()
}

fn write_error(err: KbWriteError, env: &Env, task: &str) -> ExecError {
    let kind = match err {
        KbWriteError::SeparatorMismatch => ExecErrorKind::KbSeparatorMismatch { position: task.to_string() },
        KbWriteError::NonGroundKey => ExecErrorKind::KbNonGroundKey,
    };
    ExecError::new(kind, FrameTrace::capture_opt(env.frame.as_ref()))
}

#[derive(Debug)]
struct Write;

impl Primitive for Write {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: crate::textbuffer::TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [path] = args else { return Ok(false) };
        let Some(path) = term_to_path(path, &env) else {
            return Err(write_error(KbWriteError::NonGroundKey, &env, "Write"));
        };
        match env.kb.write(&path, env.frame.as_deref(), &env.bindings) {
            Ok(kb) => k(output, env.with_kb(kb)),
            Err(e) => Err(write_error(e, &env, "Write")),
        }
    }
}

#[derive(Debug)]
struct Delete;

impl Primitive for Delete {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: crate::textbuffer::TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [path] = args else { return Ok(false) };
        let Some(path) = term_to_path(path, &env) else {
            return Err(write_error(KbWriteError::NonGroundKey, &env, "Delete"));
        };
        match env.kb.delete(&path, env.frame.as_deref(), &env.bindings) {
            Ok(kb) => k(output, env.with_kb(kb)),
            Err(e) => Err(write_error(e, &env, "Delete")),
        }
    }
}

#[derive(Debug)]
struct Lookup;

impl Primitive for Lookup {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: crate::textbuffer::TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [path] = args else { return Ok(false) };
        // Unbound keys are legal here (lookup unifies over them to
        // enumerate); only the sentence's *shape* (sep/key pairing) must be
        // known, not every key's value.
        let Some(elems) = term_to_path(path, &env) else { return Ok(false) };
        for bindings in env.kb.lookup(&elems, env.frame.as_deref(), &env.bindings) {
            if k(output.clone(), env.clone().with_bindings(bindings))? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug)]
struct Dump;

impl Primitive for Dump {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: crate::textbuffer::TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [out] = args else { return Ok(false) };
        let sentences = env.kb.dump();
        let rendered: Vec<Term> = sentences
            .into_iter()
            .map(|sentence| {
                Term::list(
                    sentence
                        .into_iter()
                        .map(|(sep, key)| Term::tuple(vec![Term::bool(matches!(sep, Sep::Bang)), key]))
                        .collect(),
                )
            })
            .collect();
        match crate::unify::unify(out, &Term::list(rendered), env.frame.as_deref(), &env.bindings) {
            Ok(bindings) => k(output, env.with_bindings(bindings)),
            Err(_) => Ok(false),
        }
    }
}

pub fn register(builder: &mut ProgramBuilder) {
    builder.register_primitive(Rc::new(super::Named { inner: Rc::new(Write), name: name(builder, "Write") }));
    builder.register_primitive(Rc::new(super::Named { inner: Rc::new(Delete), name: name(builder, "Delete") }));
    builder.register_primitive(Rc::new(super::Named { inner: Rc::new(Lookup), name: name(builder, "Lookup") }));
    builder.register_primitive(Rc::new(super::Named { inner: Rc::new(Dump), name: name(builder, "Dump") }));
}
