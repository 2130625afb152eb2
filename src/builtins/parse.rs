//! `Parse(call, text)`: runs `call` in read mode over `text`'s token
//! sequence; succeeds iff the call fully consumes the input (spec §4.9).

use std::rc::Rc;

use crate::{
    binding::deref,
    env::{Env, ProgramBuilder},
    frame::Frame,
    primitive::{Cont, Primitive, StepResult},
    term::{Atom, Term},
    textbuffer::{Token, TextBuffer},
};

use super::{call_goal, name, Named};

#[derive(Debug)]
struct Parse;

impl Primitive for Parse {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [goal, text] = args else { return Ok(false) };
        let tokens = term_to_tokens(text, &env);
        let read_buf = TextBuffer::read_mode(tokens);
        call_goal(goal, read_buf, env.clone(), predecessor, &mut |out2, env2| {
            if out2.read_completed() {
                k(output.clone(), env2)
            } else {
                Ok(false)
            }
        })
    }
}

/// Converts a `text` argument — a tuple/pair list of string atoms, or a
/// single string atom treated as one token — into the token sequence
/// `Parse` reads against. Tokenizing free-form prose into words is the
/// loader's job (spec §1 "surface-syntax parser" is out of scope); by the
/// time a program reaches the core, `text` is already a sequence of
/// discrete tokens.
fn term_to_tokens(text: &Term, env: &Env) -> Vec<Token> {
    match deref(text.clone(), env.frame.as_deref(), &env.bindings) {
        Term::Atom(Atom::Str(id)) => vec![Token::text(env.program.interner.resolve(id).to_string())],
        other @ (Term::Tuple(_) | Term::Pair(..)) => sequence_items(&other)
            .into_iter()
            .map(|t| match deref(t, env.frame.as_deref(), &env.bindings) {
                Term::Atom(Atom::Str(id)) => Token::text(env.program.interner.resolve(id).to_string()),
                other => Token::text(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

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

pub fn register(builder: &mut ProgramBuilder) {
    builder.register_primitive(Rc::new(Named { inner: Rc::new(Parse), name: name(builder, "Parse") }));
}
