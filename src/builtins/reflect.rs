//! `PreviousCall`, `UniqueCall` (goal-chain reflection) and `SaveText`
//! (diverts emitted output into a term instead of the outer buffer)
//! (spec §4.9, §4.11).

use std::rc::Rc;

use crate::{
    env::{Env, ProgramBuilder},
    frame::Frame,
    primitive::{Cont, Primitive, StepResult},
    term::{structurally_equal, Atom, Term},
    textbuffer::{Token, TextBuffer},
    unify::unify,
};

use super::{name, Named};

/// `PreviousCall(?taskName, ?args, ?result)`-shaped: walks the goal
/// (predecessor) chain from the current frame outward, unifying each
/// ancestor's task name and call args against the given pattern, trying
/// the most recent first and backtracking into older ones on failure.
#[derive(Debug)]
struct PreviousCall { unique: bool }

impl Primitive for PreviousCall {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [task_pattern, args_pattern] = args else { return Ok(false) };
        let Some(frame) = env.frame.clone() else { return Ok(false) };

        let mut seen_task_args: Vec<Term> = Vec::new();
        for ancestor in frame.goal_chain().skip(1) {
            let task_term = Term::Atom(Atom::Str(ancestor.task_name()));
            let args_term = Term::list(ancestor.call_args.clone());

            if self.unique && seen_task_args.iter().any(|t| structurally_equal(t, &args_term)) {
                continue;
            }

            if let Ok(b1) = unify(task_pattern, &task_term, env.frame.as_deref(), &env.bindings) {
                if let Ok(b2) = unify(args_pattern, &args_term, env.frame.as_deref(), &b1) {
                    seen_task_args.push(args_term.clone());
                    if k(output.clone(), env.clone().with_bindings(b2))? {
                        return Ok(true);
                    }
                    continue;
                }
            }
            if self.unique {
                seen_task_args.push(args_term);
            }
        }
        Ok(false)
    }
}

/// `SaveText(goal, ?out)`: runs `goal` once (first solution only) against
/// a fresh write-mode buffer instead of the outer one, then binds the
/// tokens it emitted — each rendered as a string atom — as a list to
/// `out`. The outer buffer is left untouched.
#[derive(Debug)]
struct SaveText;

impl Primitive for SaveText {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [goal, out] = args else { return Ok(false) };
        let inner = TextBuffer::write_mode();
        let mut result = None;
        super::call_goal(goal, inner.clone(), env.clone(), predecessor, &mut |out2, env2| {
            result = Some((out2.tokens_since(&inner), env2));
            Ok(true)
        })?;
        let Some((tokens, env2)) = result else { return Ok(false) };
        let items: Vec<Term> = tokens.iter().map(|t| token_to_term(t, &env2)).collect();
        match unify(out, &Term::list(items), env2.frame.as_deref(), &env2.bindings) {
            Ok(bindings) => k(output, env2.with_bindings(bindings)),
            Err(_) => Ok(false),
        }
    }
}

/// `CallerChainAncestor(?taskName, ?args)`: same shape as `PreviousCall`
/// but walks the *lexical* caller chain instead of the goal chain — "who
/// contains the call site" rather than "who last succeeded" (spec §4.11,
/// §9 "Reflection surface").
#[derive(Debug)]
struct CallerChainAncestor;

impl Primitive for CallerChainAncestor {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [task_pattern, args_pattern] = args else { return Ok(false) };
        let Some(frame) = env.frame.clone() else { return Ok(false) };

        for ancestor in frame.caller_chain().skip(1) {
            let task_term = Term::Atom(Atom::Str(ancestor.task_name()));
            let args_term = Term::list(ancestor.call_args.clone());
            if let Ok(b1) = unify(task_pattern, &task_term, env.frame.as_deref(), &env.bindings) {
                if let Ok(b2) = unify(args_pattern, &args_term, env.frame.as_deref(), &b1) {
                    if k(output.clone(), env.clone().with_bindings(b2))? {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

/// `TaskCalls(taskName, ?list)`: collects every goal-chain ancestor whose
/// task name equals the (ground) `taskName`, each rendered as its
/// argument list, into `?list` — the static "who called this task so
/// far" view `ouros`'s reflective builtins expose as a read-only query
/// over already-live frame links, not a new search (spec §9).
#[derive(Debug)]
struct TaskCalls;

impl Primitive for TaskCalls {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [task_name, list] = args else { return Ok(false) };
        let Term::Atom(Atom::Str(wanted)) = crate::binding::deref(task_name.clone(), env.frame.as_deref(), &env.bindings) else {
            return Ok(false);
        };
        let Some(frame) = env.frame.clone() else { return Ok(false) };

        let matches: Vec<Term> = frame
            .goal_chain()
            .skip(1)
            .filter(|f| f.task_name() == wanted)
            .map(|f| Term::list(f.call_args.clone()))
            .collect();

        match unify(list, &Term::list(matches), env.frame.as_deref(), &env.bindings) {
            Ok(bindings) => k(output, env.with_bindings(bindings)),
            Err(_) => Ok(false),
        }
    }
}

/// `LastMethodCallFrame(?rendered)`: renders the *current* frame's
/// original call expression — task name plus each argument substituted
/// with its current dereferenced value — as a string atom (spec §4.11
/// "render the original call expression with substituted values").
#[derive(Debug)]
struct LastMethodCallFrame;

impl Primitive for LastMethodCallFrame {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, _predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [rendered] = args else { return Ok(false) };
        let Some(frame) = env.frame.clone() else { return Ok(false) };

        let task_name = env.program.interner.resolve(frame.task_name());
        let values: Vec<String> = frame
            .call_args
            .iter()
            .map(|a| crate::call::stringify(&crate::binding::deref(a.clone(), env.frame.as_deref(), &env.bindings), &env))
            .collect();
        let text = if values.is_empty() {
            task_name.to_string()
        } else {
            format!("{task_name}({})", values.join(", "))
        };
        let rendered_term = Term::Atom(Atom::Str(env.program.interner.intern(&text)));
        match unify(rendered, &rendered_term, env.frame.as_deref(), &env.bindings) {
            Ok(bindings) => k(output, env.with_bindings(bindings)),
            Err(_) => Ok(false),
        }
    }
}

fn token_to_term(token: &Token, env: &Env) -> Term {
    let text = match token {
        Token::Text(s) => s.clone(),
        Token::NewParagraph => "\n\n".to_string(),
        Token::NewLine | Token::FreshLine => "\n".to_string(),
        Token::ForceSpace => " ".to_string(),
    };
    Term::Atom(Atom::Str(env.program.interner.intern(&text)))
}

pub fn register(builder: &mut ProgramBuilder) {
    builder.register_primitive(Rc::new(Named {
        inner: Rc::new(PreviousCall { unique: false }),
        name: name(builder, "PreviousCall"),
    }));
    builder.register_primitive(Rc::new(Named {
        inner: Rc::new(PreviousCall { unique: true }),
        name: name(builder, "UniqueCall"),
    }));
    builder.register_primitive(Rc::new(Named { inner: Rc::new(SaveText), name: name(builder, "SaveText") }));
    builder.register_primitive(Rc::new(Named {
        inner: Rc::new(CallerChainAncestor),
        name: name(builder, "CallerChainAncestor"),
    }));
    builder.register_primitive(Rc::new(Named { inner: Rc::new(TaskCalls), name: name(builder, "TaskCalls") }));
    builder.register_primitive(Rc::new(Named {
        inner: Rc::new(LastMethodCallFrame),
        name: name(builder, "LastMethodCallFrame"),
    }));
}
