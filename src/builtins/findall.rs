//! `FindAll`, `FindUnique`, `FindFirstNUnique`, `FindAtMostNUnique`,
//! `ForEach`, `AccumulateOutput[WithSeparators]` (spec §4.9).

use std::rc::Rc;

use crate::{
    binding::deref,
    env::{Env, ProgramBuilder},
    frame::Frame,
    primitive::{Cont, Primitive, StepResult},
    term::{structurally_equal, Term},
    textbuffer::{Token, TextBuffer},
    unify::unify,
};

use super::{call_goal, name, Named};

/// `FindAll(?result, call, ?list)`: forces the continuation to return
/// false so `call` is driven to exhaustion, collecting the dereferenced
/// value of `result` at each success.
#[derive(Debug)]
struct FindAll { dedup: bool, limit: Option<usize>, require_limit: bool }

impl Primitive for FindAll {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [result, goal, list] = args else { return Ok(false) };
        let mut collected: Vec<Term> = Vec::new();
        call_goal(goal, output.clone(), env.clone(), predecessor, &mut |_out, env2| {
            let value = deref(result.clone(), env2.frame.as_deref(), &env2.bindings);
            if !self.dedup || !collected.iter().any(|v| structurally_equal(v, &value)) {
                collected.push(value);
            }
            if let Some(n) = self.limit {
                if collected.len() >= n {
                    return Ok(true);
                }
            }
            Ok(false)
        })?;
        if self.require_limit {
            if let Some(n) = self.limit {
                if collected.len() < n {
                    return Ok(false);
                }
            }
        }
        let list_term = Term::list(collected);
        match unify(list, &list_term, env.frame.as_deref(), &env.bindings) {
            Ok(bindings) => k(output, env.with_bindings(bindings)),
            Err(_) => Ok(false),
        }
    }
}

/// `FindFirstNUnique`/`FindAtMostNUnique` additionally take the count `N`
/// as their second argument, ahead of `call`: `(?result, N, call, ?list)`.
#[derive(Debug)]
struct FindNUnique { require_limit: bool }

impl Primitive for FindNUnique {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [result, n_arg, goal, list] = args else { return Ok(false) };
        let n = match deref(n_arg.clone(), env.frame.as_deref(), &env.bindings) {
            Term::Atom(crate::term::Atom::Num(crate::term::Number::Int(n))) if n >= 0 => n as usize,
            _ => return Ok(false),
        };
        let inner = FindAll { dedup: true, limit: Some(n), require_limit: self.require_limit };
        inner.call(&[result.clone(), goal.clone(), list.clone()], output, env, predecessor, k)
    }
}

/// `ForEach(generator, body)`: drives `generator` to exhaustion, then runs
/// `body` once under each generator solution's bindings, threading output
/// and state forward across iterations but discarding bindings between
/// them. Solutions are collected eagerly before `body` runs at all — a
/// documented simplification of the source's interleaved-backtracking
/// shape (spec §9 explicitly allows swapping continuation-passing for a
/// resumable-generator model; this is the same trade in the other
/// direction, eager rather than lazy).
#[derive(Debug)]
struct ForEach;

impl Primitive for ForEach {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [generator, body] = args else { return Ok(false) };
        let solutions = collect_bindings(generator, &env, predecessor.clone())?;

        let mut cur_output = output;
        let mut cur_state = env.state.clone();
        for bindings in solutions {
            let iter_env = env.with_bindings(bindings).with_state(cur_state.clone());
            let mut advanced = None;
            call_goal(body, cur_output.clone(), iter_env, predecessor.clone(), &mut |out2, env2| {
                advanced = Some((out2, env2.state.clone()));
                Ok(true)
            })?;
            if let Some((out2, state2)) = advanced {
                cur_output = out2;
                cur_state = state2;
            }
        }
        k(cur_output, env.with_state(cur_state))
    }
}

/// Runs `generator` to exhaustion against a throwaway output buffer,
/// collecting each solution's binding list. Shared by `ForEach` and
/// `Implies`.
pub(crate) fn collect_bindings(
    generator: &Term,
    env: &Env,
    predecessor: Option<Rc<Frame>>,
) -> Result<Vec<crate::binding::BindingList>, crate::error::ExecError> {
    let mut out = Vec::new();
    call_goal(generator, TextBuffer::write_mode(), env.clone(), predecessor, &mut |_out, env2| {
        out.push(env2.bindings.clone());
        Ok(false)
    })?;
    Ok(out)
}

/// `AccumulateOutput(generator, separators?, terminator?)`: like `ForEach`
/// over `generator` alone (no separate body — the generator's own emitted
/// text is what gets accumulated), interposing separator tokens between
/// successive iterations' output and a terminator after the last.
#[derive(Debug)]
struct AccumulateOutput { with_separators: bool }

impl Primitive for AccumulateOutput {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let (generator, separator, terminator) = if self.with_separators {
            let [g, sep, term] = args else { return Ok(false) };
            (g, Some(sep), Some(term))
        } else {
            let [g] = args else { return Ok(false) };
            (g, None, None)
        };

        let sep_tokens: Vec<Token> = separator.map_or_else(Vec::new, |t| term_tokens(t, &env));
        let term_tokens_: Vec<Token> = terminator.map_or_else(Vec::new, |t| term_tokens(t, &env));

        let throwaway = TextBuffer::write_mode();
        let mut runs: Vec<(Vec<Token>, crate::state::State)> = Vec::new();
        let mut last_state = env.state.clone();
        call_goal(generator, throwaway.clone(), env.clone(), predecessor, &mut |out2, env2| {
            runs.push((out2.tokens_since(&throwaway), env2.state.clone()));
            last_state = env2.state.clone();
            Ok(false)
        })?;

        let mut joined = output;
        for (i, (tokens, _)) in runs.iter().enumerate() {
            if i > 0 {
                joined = joined.append(&sep_tokens);
            }
            joined = joined.append(tokens);
        }
        if !runs.is_empty() {
            joined = joined.append(&term_tokens_);
        }
        k(joined, env.with_state(last_state))
    }
}

fn term_tokens(t: &Term, env: &Env) -> Vec<Token> {
    match deref(t.clone(), env.frame.as_deref(), &env.bindings) {
        Term::Atom(crate::term::Atom::Str(id)) => vec![Token::text(env.program.interner.resolve(id).to_string())],
        Term::Tuple(items) => items.iter().map(|i| Token::text(crate::call::stringify(i, env))).collect(),
        other => vec![Token::text(other.to_string())],
    }
}

pub fn register(builder: &mut ProgramBuilder) {
    let entries: Vec<(&str, Rc<dyn Primitive>)> = vec![
        ("FindAll", Rc::new(FindAll { dedup: false, limit: None, require_limit: false })),
        ("FindUnique", Rc::new(FindAll { dedup: true, limit: None, require_limit: false })),
        ("FindFirstNUnique", Rc::new(FindNUnique { require_limit: true })),
        ("FindAtMostNUnique", Rc::new(FindNUnique { require_limit: false })),
        ("ForEach", Rc::new(ForEach)),
        ("AccumulateOutput", Rc::new(AccumulateOutput { with_separators: false })),
        ("AccumulateOutputWithSeparators", Rc::new(AccumulateOutput { with_separators: true })),
    ];
    for (n, prim) in entries {
        builder.register_primitive(Rc::new(Named { inner: prim, name: name(builder, n) }));
    }
}
