//! Call-step dispatch: what happens when a `Call` step's target is not
//! obviously a task (spec §4.6).
//!
//! `Target` and `Args` are dereferenced, then dispatched by the target's
//! *runtime shape* rather than by any declared type — the same "value
//! decides how it's invoked" idea as `ouros::object::Object`'s call
//! protocol (`__call__` vs. plain value), generalized to several shapes
//! instead of one.

use std::rc::Rc;

use crate::{
    env::Env,
    error::{ExecError, ExecErrorKind},
    frame::{Frame, FrameTrace},
    method::resolve_task_ref,
    primitive::{Cont, StepResult},
    term::{Atom, Term},
    textbuffer::Token,
};

/// Dispatches one `Call` step. `args` are the (not-yet-dereferenced) call
/// arguments; `target` is dereferenced here, once, before any shape check.
pub fn dispatch(
    target: &Term,
    args: &[Term],
    output: crate::textbuffer::TextBuffer,
    env: Env,
    predecessor: Option<Rc<Frame>>,
    k: &mut Cont<'_>,
) -> StepResult {
    let resolved = env.resolve(target.clone());

    // A task call pushes a fresh frame for its own body (`Task::call` ->
    // `call_compound`'s `call_env`), but `k` here is the *caller's*
    // continuation — the rest of the caller's own step chain. Restore the
    // caller's frame before resuming it, so a `Term::Local` reference later
    // in the same chain still indexes the caller's locals, not the
    // callee's (spec §4.4 steps share one frame for their whole chain).
    let caller_frame = env.frame.clone();

    if let Term::Task(_) = &resolved {
        if let Some(task) = resolve_task_ref(&resolved, &env) {
            env.tracer.on_call(task_name_of(&resolved), env.frame.as_ref().unwrap());
            return task.call(args, output, env.clone(), env.frame.clone(), predecessor, &mut |out, result_env| {
                let restored = match &caller_frame {
                    Some(f) => result_env.with_frame(Rc::clone(f)),
                    None => result_env,
                };
                k(out, restored)
            });
        }
        return Err(ExecError::new(
            ExecErrorKind::UndefinedTask {
                rendered: stringify(&resolved, &env),
            },
            FrameTrace::capture_opt(env.frame.as_ref()),
        ));
    }

    match (&resolved, args.len()) {
        // Mapping target, 2 args: a key<->value relation (spec §4.6).
        (Term::Feature(map), 2) => call_mapping(map, &args[0], &args[1], output, env, k),

        // Sequence target, 1 arg: membership (spec §4.6).
        (Term::Tuple(_) | Term::Pair(..), 1) => call_membership(&resolved, &args[0], output, env, k),

        // Sequence target, 0 args, every element a literal atom: emit it as
        // a run of text tokens rather than falling through to the generic
        // "stringify the whole value" rule below (spec §4.6 "a literal
        // token sequence -> emit it").
        (Term::Tuple(_) | Term::Pair(..), 0) if is_literal_token_run(&resolved) => {
            let tokens = literal_tokens(&resolved, &env);
            if output.is_write_mode() {
                k(output.append(&tokens), env)
            } else {
                match output.unify_tokens(&tokens) {
                    Some(advanced) => k(advanced, env),
                    None => Ok(false),
                }
            }
        }

        // Boolean target: an assertion.
        (Term::Atom(Atom::Bool(b)), 0) => {
            if *b {
                k(output, env)
            } else {
                Ok(false)
            }
        }

        // Unbound variable or null as a call target is always fatal,
        // regardless of arg count (spec §4.6).
        (Term::Var(_), _) => Err(ExecError::new(
            ExecErrorKind::UndefinedTask { rendered: "<unbound variable>".to_string() },
            FrameTrace::capture_opt(env.frame.as_ref()),
        )),
        (Term::Atom(Atom::Null), _) => Err(ExecError::new(
            ExecErrorKind::UndefinedTask { rendered: "null".to_string() },
            FrameTrace::capture_opt(env.frame.as_ref()),
        )),

        // Any other value called with zero args: the per-module `Mention`
        // hook if the embedding registered one, else stringify and emit.
        (_, 0) => call_mention_or_stringify(&resolved, output, env, predecessor, k),

        // Anything else (e.g. a bare atom called with arguments) has no
        // defined shape to dispatch by.
        _ => Err(ExecError::new(
            ExecErrorKind::UndefinedTask { rendered: stringify(&resolved, &env) },
            FrameTrace::capture_opt(env.frame.as_ref()),
        )),
    }
}

fn task_name_of(term: &Term) -> crate::intern::StringId {
    match term {
        Term::Task(r) => r.0,
        _ => unreachable!("task_name_of called on a non-task term"),
    }
}

fn call_mapping(
    map: &crate::term::FeatureMap,
    key_arg: &Term,
    value_arg: &Term,
    output: crate::textbuffer::TextBuffer,
    env: Env,
    k: &mut Cont<'_>,
) -> StepResult {
    let key = env.resolve(key_arg.clone());
    if !key.is_unbound_var() {
        // Key side is bound: a single deterministic lookup-by-name is not
        // directly expressible (FeatureMap keys are `StringId`s, not
        // `Term`s), so we compare against every entry's key rendered as a
        // term and unify; with a ground key this still only matches once.
        for (name, value) in map.iter() {
            let name_term = Term::Atom(Atom::Str(*name));
            if let Ok(b1) = crate::unify::unify(&key, &name_term, env.frame.as_deref(), &env.bindings) {
                if let Ok(b2) = crate::unify::unify(value_arg, value, env.frame.as_deref(), &b1) {
                    if k(output.clone(), env.with_bindings(b2))? {
                        return Ok(true);
                    }
                }
            }
        }
        return Ok(false);
    }
    // Key unbound: enumerate every (name, value) pair, trying to unify the
    // value side first (cheaper to fail fast when the caller is really
    // searching by value).
    for (name, value) in map.iter() {
        let name_term = Term::Atom(Atom::Str(*name));
        if let Ok(b1) = crate::unify::unify(value_arg, value, env.frame.as_deref(), &env.bindings) {
            if let Ok(b2) = crate::unify::unify(&key, &name_term, env.frame.as_deref(), &b1) {
                if k(output.clone(), env.with_bindings(b2))? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

fn call_membership(
    seq: &Term,
    member_arg: &Term,
    output: crate::textbuffer::TextBuffer,
    env: Env,
    k: &mut Cont<'_>,
) -> StepResult {
    for item in sequence_items(seq) {
        if let Ok(bindings) = crate::unify::unify(member_arg, &item, env.frame.as_deref(), &env.bindings) {
            if k(output.clone(), env.with_bindings(bindings))? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Collects a `Tuple` or proper `Pair`-chain's elements as an owned `Vec`,
/// without dereferencing (the caller unifies each element, which derefs as
/// needed).
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

fn is_literal_token_run(seq: &Term) -> bool {
    sequence_items(seq).iter().all(|t| matches!(t, Term::Atom(Atom::Str(_))))
}

fn literal_tokens(seq: &Term, env: &Env) -> Vec<Token> {
    sequence_items(seq)
        .into_iter()
        .map(|t| match t {
            Term::Atom(Atom::Str(id)) => Token::text(env.program.interner.resolve(id).to_string()),
            other => Token::text(other.to_string()),
        })
        .collect()
}

fn call_mention_or_stringify(
    value: &Term,
    output: crate::textbuffer::TextBuffer,
    env: Env,
    predecessor: Option<Rc<Frame>>,
    k: &mut Cont<'_>,
) -> StepResult {
    if let Some(mention) = env.program.mention_task.and_then(|name| env.program.lookup_task(name)) {
        let caller_frame = env.frame.clone();
        return mention.call(
            &[value.clone()],
            output,
            env.clone(),
            env.frame.clone(),
            predecessor,
            &mut |out, result_env| {
                let restored = match &caller_frame {
                    Some(f) => result_env.with_frame(Rc::clone(f)),
                    None => result_env,
                };
                k(out, restored)
            },
        );
    }
    let text = stringify(value, &env);
    if output.is_write_mode() {
        k(output.append(&[Token::text(text)]), env)
    } else {
        match output.unify_tokens(&[Token::text(text)]) {
            Some(advanced) => k(advanced, env),
            None => Ok(false),
        }
    }
}

/// Renders a dereferenced value as display text, resolving `Atom::Str`
/// through the interner (unlike `Term`'s `Display` impl, which shows
/// `#str{id}` for debuggability rather than the actual text).
#[must_use]
pub fn stringify(term: &Term, env: &Env) -> String {
    match term {
        Term::Atom(Atom::Str(id)) => env.program.interner.resolve(*id).to_string(),
        other => other.to_string(),
    }
}
