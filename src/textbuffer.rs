//! `TextBuffer`: write-mode token accumulator and read-mode token cursor
//! (spec §4.8).
//!
//! Grounds on `ouros::io::PrintWriter`'s idea of abstracting "where text
//! goes" away from the evaluator, generalized here to *also* abstract
//! "where text comes from" (read mode), since spec's `Parse` built-in
//! (§4.9) runs a call in read mode over pre-tokenized input using the same
//! step machinery that normally writes.

use std::rc::Rc;

/// One unit of text output. Plain text tokens plus the four layout
/// specials from spec §4.8.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Token {
    Text(String),
    NewParagraph,
    NewLine,
    /// Emit a newline only if not already at the start of a line.
    FreshLine,
    /// Insert a space between two tokens that would otherwise run together.
    ForceSpace,
}

impl Token {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// Write-mode: append-only, backed by a shared growable array so `append`
/// can return a new logical view in O(1) without copying already-written
/// tokens. `append(tokens)` conceptually returns a fresh buffer; in practice
/// we share the backing `Vec` behind `Rc<RefCell<_>>` and track only the
/// logical length each view has claimed, mirroring a persistent-array
/// append where old views stay valid.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    mode: Mode,
}

#[derive(Debug, Clone)]
enum Mode {
    Write { backing: Rc<std::cell::RefCell<Vec<Token>>>, len: usize },
    Read { tokens: Rc<[Token]>, pos: usize },
}

impl TextBuffer {
    #[must_use]
    pub fn write_mode() -> Self {
        Self {
            mode: Mode::Write {
                backing: Rc::new(std::cell::RefCell::new(Vec::new())),
                len: 0,
            },
        }
    }

    #[must_use]
    pub fn read_mode(tokens: Vec<Token>) -> Self {
        Self {
            mode: Mode::Read {
                tokens: Rc::from(tokens),
                pos: 0,
            },
        }
    }

    #[must_use]
    pub fn is_write_mode(&self) -> bool {
        matches!(self.mode, Mode::Write { .. })
    }

    /// Appends `tokens` to the backing array (truncating any tokens written
    /// by a sibling branch past our logical length — the usual "only the
    /// most recently extended view matters" discipline of an append-only
    /// log shared across backtracking attempts) and returns a new view.
    ///
    /// # Panics
    /// Panics if called in read mode; callers must check [`Self::is_write_mode`].
    #[must_use]
    pub fn append(&self, tokens: &[Token]) -> Self {
        let Mode::Write { backing, len } = &self.mode else {
            panic!("append called on a read-mode TextBuffer");
        };
        {
            let mut buf = backing.borrow_mut();
            buf.truncate(*len);
            buf.extend_from_slice(tokens);
        }
        Self {
            mode: Mode::Write {
                backing: Rc::clone(backing),
                len: len + tokens.len(),
            },
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.mode {
            Mode::Write { len, .. } => *len,
            Mode::Read { pos, .. } => *pos,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The tokens written between an earlier buffer snapshot (`before.len()`)
    /// and this one. Used by `FindAll`/`SaveText` to collect emitted output
    /// from a sub-call without re-threading an accumulator by hand.
    #[must_use]
    pub fn tokens_since(&self, before: &Self) -> Vec<Token> {
        let Mode::Write { backing, len } = &self.mode else {
            return Vec::new();
        };
        backing.borrow()[before.len().min(*len)..*len].to_vec()
    }

    /// Read mode: returns the next token and a buffer advanced past it, or
    /// `None` at end of input.
    #[must_use]
    pub fn next_token(&self) -> Option<(Token, Self)> {
        let Mode::Read { tokens, pos } = &self.mode else {
            return None;
        };
        let tok = tokens.get(*pos)?.clone();
        Some((
            tok,
            Self {
                mode: Mode::Read {
                    tokens: Rc::clone(tokens),
                    pos: pos + 1,
                },
            },
        ))
    }

    /// Read mode: matches `expected` against the upcoming tokens, returning
    /// an advanced buffer on success.
    #[must_use]
    pub fn unify_tokens(&self, expected: &[Token]) -> Option<Self> {
        let Mode::Read { tokens, pos } = &self.mode else {
            return None;
        };
        let end = pos + expected.len();
        if end > tokens.len() || tokens[*pos..end] != *expected {
            return None;
        }
        Some(Self {
            mode: Mode::Read {
                tokens: Rc::clone(tokens),
                pos: end,
            },
        })
    }

    /// Read mode: true at end of input.
    #[must_use]
    pub fn read_completed(&self) -> bool {
        match &self.mode {
            Mode::Read { tokens, pos } => *pos >= tokens.len(),
            Mode::Write { .. } => false,
        }
    }
}
