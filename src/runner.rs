//! Top-level calling convention (spec §6): run a task name against a
//! fresh write-mode buffer and an empty environment, returning the joined
//! text and final state on success, or a failure signal on exhaustion.
//!
//! Grounds on `ouros::run::Runner` — a thin, serializable front door over
//! the executor that hides frame/environment plumbing from an embedding
//! host. Unlike `ouros::run::Runner::start`'s external-function pause
//! points, our "pause" points are backtracking choice points; rather than
//! reify those as a resumable `VMSnapshot` (spec §6's `Snapshot` Open
//! Question — see DESIGN.md), `Solutions::all` drives every alternative
//! to completion eagerly and hands back the full stream, the same
//! simplification `FindAll`/`ForEach` already make (spec §9 licenses
//! trading laziness for an eagerly-collected solution set).

use std::rc::Rc;

use crate::{
    env::{Env, Program},
    error::ExecResult,
    frame::FrameTrace,
    resource::{ResourceLimits, ResourceTracker},
    state::State,
    term::Term,
    textbuffer::{TextBuffer, Token},
};

/// One successful run of a task: the text it emitted (already
/// orthographically joined, spec §6), the raw token sequence it emitted,
/// the final persistent `State`, and the top-level argument bindings
/// (useful to an embedding that passed unbound variables and wants their
/// solved values).
#[derive(Debug, Clone)]
pub struct Solution {
    pub text: String,
    pub tokens: Vec<Token>,
    pub state: State,
    pub bindings: crate::binding::BindingList,
}

/// Front door over a built [`Program`]. Does no parsing — the program is
/// handed over fully constructed (spec §1 "the core does not parse").
#[derive(Debug, Clone)]
pub struct Runner {
    program: Rc<Program>,
}

impl Runner {
    #[must_use]
    pub fn new(program: Program) -> Self {
        Self { program: Rc::new(program) }
    }

    #[must_use]
    pub fn from_rc(program: Rc<Program>) -> Self {
        Self { program }
    }

    #[must_use]
    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    /// Runs `task` to its first solution. `Ok(None)` is spec §6's "failure
    /// signal" — plain logical failure, not an error. `Err` is a fatal
    /// [`crate::error::ExecError`] (stack overflow, undefined task, etc.).
    pub fn call(&self, task: &str, args: Vec<Term>, limits: ResourceLimits) -> ExecResult<Option<Solution>> {
        Ok(self.solutions(task, args, limits)?.into_iter().next())
    }

    /// Streaming variant (spec §6 "Streaming variants return each solution
    /// on backtrack"): every solution the task has, in the order
    /// backtracking would visit them.
    pub fn solutions(&self, task: &str, args: Vec<Term>, limits: ResourceLimits) -> ExecResult<Vec<Solution>> {
        let Some(task_obj) = self.program.tasks.get(&self.program.interner.intern(task)).cloned() else {
            return Err(crate::error::ExecError::new(
                crate::error::ExecErrorKind::UndefinedTask { rendered: task.to_string() },
                FrameTrace::empty(),
            ));
        };

        let tracker = ResourceTracker::new(limits);
        let env = Env::new(Rc::clone(&self.program), tracker);
        let output = TextBuffer::write_mode();

        let mut solutions = Vec::new();
        task_obj.call(&args, output.clone(), env.clone(), env.frame.clone(), None, &mut |out, env2| {
            solutions.push(Solution {
                text: join_tokens(&out.tokens_since(&output)),
                tokens: out.tokens_since(&output),
                state: env2.state.clone(),
                bindings: env2.bindings.clone(),
            });
            Ok(false)
        })?;
        Ok(solutions)
    }
}

/// Orthographic fix-up (spec §4.8/§6): join adjacent tokens with a single
/// space unless either side is punctuation, honoring the four layout
/// specials. Conceptually "part of the writer, external to the core"
/// (spec §6), but the top-level calling convention explicitly returns
/// already-joined text, so the minimal join rule lives here rather than
/// in a full external writer module — see DESIGN.md.
#[must_use]
pub fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut at_line_start = true;
    let mut prev_text_end: Option<char> = None;

    for tok in tokens {
        match tok {
            Token::Text(s) => {
                if s.is_empty() {
                    continue;
                }
                let first = s.chars().next().unwrap();
                if !at_line_start && !out.is_empty() {
                    let needs_space = !is_punctuation(first) && !matches!(prev_text_end, Some(c) if is_open_punctuation(c));
                    if needs_space {
                        out.push(' ');
                    }
                }
                out.push_str(s);
                prev_text_end = s.chars().next_back();
                at_line_start = false;
            }
            Token::NewParagraph => {
                out.push_str("\n\n");
                at_line_start = true;
                prev_text_end = None;
            }
            Token::NewLine => {
                out.push('\n');
                at_line_start = true;
                prev_text_end = None;
            }
            Token::FreshLine => {
                if !at_line_start {
                    out.push('\n');
                    at_line_start = true;
                    prev_text_end = None;
                }
            }
            Token::ForceSpace => {
                out.push(' ');
                prev_text_end = None;
            }
        }
    }
    out
}

fn is_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | ')' | ']' | '}' | '\'' | '"')
}

fn is_open_punctuation(c: char) -> bool {
    matches!(c, '(' | '[' | '{')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_words_with_single_space() {
        let toks = vec![Token::text("hello"), Token::text("world")];
        assert_eq!(join_tokens(&toks), "hello world");
    }

    #[test]
    fn no_space_before_punctuation() {
        let toks = vec![Token::text("hello"), Token::text(","), Token::text("world"), Token::text(".")];
        assert_eq!(join_tokens(&toks), "hello, world.");
    }

    #[test]
    fn fresh_line_is_idempotent() {
        let toks = vec![Token::text("a"), Token::FreshLine, Token::FreshLine, Token::text("b")];
        assert_eq!(join_tokens(&toks), "a\nb");
    }

    #[test]
    fn new_paragraph_inserts_blank_line() {
        let toks = vec![Token::text("a"), Token::NewParagraph, Token::text("b")];
        assert_eq!(join_tokens(&toks), "a\n\nb");
    }
}
