//! The term model (spec §3).
//!
//! Grounds the tagged-sum shape on `ouros::value::Value`/`ouros::object::Object`:
//! there, a runtime `Value` is a small `Copy` enum with heap references for
//! anything non-scalar. Here the same idea, minus the heap/refcounting
//! machinery — our compound terms share structure through `Rc`, which is
//! sufficient because the core never mutates a term in place (spec's
//! "binding lists are append-only" invariant extends to every compound
//! value).

use std::{cmp::Ordering, fmt, rc::Rc};

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::{frame::Frame, intern::StringId};

/// Numeric atom payload. `Int` is the common fast path; `Big` only appears
/// once arithmetic overflows `i64` (spec §3 leaves width unspecified; we pin
/// it to avoid silent wraparound in arithmetic primitives).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Number {
    Int(i64),
    Big(BigInt),
    Float(f64),
}

impl Number {
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(n) => *n as f64,
            Self::Big(n) => {
                let (sign, digits) = n.to_u64_digits();
                let mut value = digits.iter().rev().fold(0.0_f64, |acc, d| acc * 2f64.powi(64) + *d as f64);
                if sign == num_bigint::Sign::Minus {
                    value = -value;
                }
                value
            }
            Self::Float(f) => *f,
        }
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Big(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

/// A scalar value: one of the five atom kinds from spec §3.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Atom {
    Str(StringId),
    Num(Number),
    Bool(bool),
    /// The `null` atom; also used as the cons-list nil terminator.
    Null,
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(id) => write!(f, "#str{}", id.index()),
            Self::Num(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// A hashable, ground-only projection of an atom, used as a key in the
/// exclusion-logic KB trie (see [`crate::kb`]) where keys must be ground at
/// write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomKey {
    Str(StringId),
    Int(i64),
    Bool(bool),
    Null,
}

impl TryFrom<&Atom> for AtomKey {
    type Error = ();

    fn try_from(atom: &Atom) -> Result<Self, Self::Error> {
        match atom {
            Atom::Str(id) => Ok(Self::Str(*id)),
            Atom::Num(Number::Int(n)) => Ok(Self::Int(*n)),
            Atom::Bool(b) => Ok(Self::Bool(*b)),
            Atom::Null => Ok(Self::Null),
            Atom::Num(_) => Err(()),
        }
    }
}

/// Identity + monotonically assigned id for a logic variable (spec §3).
///
/// `id` is the tiebreak used by the unifier's variable-ordering rule and
/// also the thing that makes two `LogicVar` values "the same variable":
/// equal ids are the same variable by construction, since ids are only ever
/// handed out once, by [`VarAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LogicVar {
    pub id: u64,
    pub name: Option<StringId>,
}

impl LogicVar {
    #[must_use]
    pub fn unnamed(id: u64) -> Self {
        Self { id, name: None }
    }
}

/// Hands out fresh, strictly increasing variable ids.
///
/// One allocator per `Runner`/session (ground: `ouros::intern`'s
/// monotonic-index interners). Kept separate from the string interner
/// because variable identity, not variable name, is what unification cares
/// about — two variables can share a source name without being the same
/// variable.
#[derive(Debug, Default)]
pub struct VarAllocator {
    next: std::cell::Cell<u64>,
}

impl VarAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&self, name: Option<StringId>) -> LogicVar {
        let id = self.next.get();
        self.next.set(id + 1);
        LogicVar { id, name }
    }
}

/// Compile-time reference to a method's local-variable slot (spec §3).
///
/// Only meaningful inside a method body/head, before a frame has been
/// entered; resolving one requires the active [`Frame`]'s local array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LocalSlot(pub u16);

/// Global or fluent key into the [`crate::state::State`] map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StateKey(pub u32);

/// A first-class task value (spec §3 "task reference").
///
/// Stored as a name because the task registry lives on the owning
/// `Module`/`Program`, not inside `Term` itself — keeping `Term` free of a
/// back-reference to the program it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaskRef(pub StringId);

/// A feature structure: an order-preserving mapping from feature name to
/// term (spec §3). `IndexMap` keeps write order stable for `dump`/repr
/// output and deterministic iteration during unification.
pub type FeatureMap = IndexMap<StringId, Term>;

/// A value of one of spec §3's term variants.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Term {
    Atom(Atom),
    Var(LogicVar),
    Local(LocalSlot),
    StateVar(StateKey),
    Tuple(Rc<[Term]>),
    /// Cons cell: `Pair(head, tail)`. Proper lists end in `Atom(Atom::Null)`;
    /// anything else in tail position makes the list improper.
    Pair(Rc<Term>, Rc<Term>),
    Feature(Rc<FeatureMap>),
    Task(TaskRef),
}

impl Term {
    #[must_use]
    pub fn null() -> Self {
        Self::Atom(Atom::Null)
    }

    #[must_use]
    pub fn bool(b: bool) -> Self {
        Self::Atom(Atom::Bool(b))
    }

    #[must_use]
    pub fn int(n: i64) -> Self {
        Self::Atom(Atom::Num(Number::Int(n)))
    }

    #[must_use]
    pub fn tuple(items: Vec<Term>) -> Self {
        Self::Tuple(Rc::from(items))
    }

    /// Builds a proper cons-list from `items`, terminated by `null`.
    #[must_use]
    pub fn list(items: Vec<Term>) -> Self {
        items
            .into_iter()
            .rev()
            .fold(Term::null(), |tail, head| Term::Pair(Rc::new(head), Rc::new(tail)))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Atom(Atom::Null))
    }

    #[must_use]
    pub fn is_unbound_var(&self) -> bool {
        matches!(self, Self::Var(_))
    }

    /// Whether this term (already dereferenced through `frame`/`bindings` by
    /// the caller) is ground: contains no unbound logic variable anywhere in
    /// its structure. Required by `Not`, `Assignment`, and the `Ground` type
    /// test primitive (spec §4.9, §6).
    #[must_use]
    pub fn is_ground(&self, frame: Option<&Frame>, bindings: &crate::binding::BindingList) -> bool {
        match crate::binding::deref(self.clone(), frame, bindings) {
            Term::Var(_) => false,
            Term::Tuple(items) => items.iter().all(|t| t.is_ground(frame, bindings)),
            Term::Pair(h, t) => h.is_ground(frame, bindings) && t.is_ground(frame, bindings),
            Term::Feature(map) => map.values().all(|t| t.is_ground(frame, bindings)),
            Term::Local(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(a) => write!(f, "{a}"),
            Self::Var(v) => write!(f, "_G{}", v.id),
            Self::Local(l) => write!(f, "_L{}", l.0),
            Self::StateVar(s) => write!(f, "_S{}", s.0),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, t) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str(")")
            }
            Self::Pair(h, t) => write!(f, "[{h}|{t}]"),
            Self::Feature(map) => {
                f.write_str("{")?;
                for (i, (_, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
            Self::Task(_) => f.write_str("<task>"),
        }
    }
}

/// Structural equality over *already-dereferenced* terms, used by
/// `FindUnique`/`Max`/`Min` dedup and by `=`/`Different` once both sides are
/// ground or compared variable-for-variable. Two unbound variables compare
/// equal only if they're the same variable (by id).
pub fn structurally_equal(a: &Term, b: &Term) -> bool {
    match (a, b) {
        (Term::Atom(x), Term::Atom(y)) => x == y,
        (Term::Var(x), Term::Var(y)) => x == y,
        (Term::Local(x), Term::Local(y)) => x == y,
        (Term::StateVar(x), Term::StateVar(y)) => x == y,
        (Term::Task(x), Term::Task(y)) => x == y,
        (Term::Tuple(x), Term::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| structurally_equal(a, b))
        }
        (Term::Pair(xh, xt), Term::Pair(yh, yt)) => structurally_equal(xh, yh) && structurally_equal(xt, yt),
        (Term::Feature(x), Term::Feature(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|yv| structurally_equal(v, yv)))
        }
        _ => false,
    }
}

/// Ordering used by `Max`/`Min` (spec §4.9) and for `dump`'s sorted sentence
/// list (spec §4.10). Numbers compare by value, strings/atoms by their
/// `Display` rendering otherwise, to keep output deterministic without
/// requiring interner access at comparison sites.
#[must_use]
pub fn term_cmp(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::Atom(Atom::Num(x)), Term::Atom(Atom::Num(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        _ => format!("{a}").cmp(&format!("{b}")),
    }
}
