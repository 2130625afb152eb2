//! Persistent binding list and `deref` (spec §3, §4.2).
//!
//! Grounds the persistence strategy on `ouros::types::chain_map::ChainMap`'s
//! "earlier entries win, never mutate, clone is cheap" discipline, adapted
//! from owned map layers to a singly forward-linked `Rc` cons chain: our
//! lists grow one cell at a time (one new binding per successful unify step),
//! not by whole-layer composition, so a cons chain is the natural persistent
//! shape and gives the "O(1) snapshot for backtracking" spec §3 asks for —
//! cloning a `BindingList` is `Rc::clone`.

use std::rc::Rc;

use crate::{frame::Frame, term::{LogicVar, Term}};

#[derive(Debug)]
enum Node {
    Nil,
    Cons { var: LogicVar, value: Term, rest: BindingList },
}

/// A persistent singly-linked list of `(variable, value)` cells.
///
/// Bindings are never mutated; extending binds a new cell and returns a new
/// `BindingList` that shares its tail with the old one.
#[derive(Debug, Clone)]
pub struct BindingList(Rc<Node>);

impl Default for BindingList {
    fn default() -> Self {
        Self::empty()
    }
}

impl BindingList {
    #[must_use]
    pub fn empty() -> Self {
        Self(Rc::new(Node::Nil))
    }

    /// Extends the list with a new binding. Never rewrites an existing cell.
    #[must_use]
    pub fn extend(&self, var: LogicVar, value: Term) -> Self {
        Self(Rc::new(Node::Cons {
            var,
            value,
            rest: self.clone(),
        }))
    }

    /// Walks the chain until `var` is found or the list is exhausted.
    #[must_use]
    pub fn lookup(&self, var: LogicVar) -> Option<Term> {
        let mut node = &self.0;
        loop {
            match node.as_ref() {
                Node::Nil => return None,
                Node::Cons { var: v, value, rest } => {
                    if *v == var {
                        return Some(value.clone());
                    }
                    node = &rest.0;
                }
            }
        }
    }
}

/// Follows the binding chain for a variable (or the frame-local chain for a
/// compile-time local reference) to its current value, or to an unbound
/// variable. Terminates because binding-list extension never introduces a
/// cycle: a variable may only alias a variable with a strictly smaller id
/// (spec §3 invariant), so the chain of aliases is strictly decreasing.
#[must_use]
pub fn deref(mut term: Term, frame: Option<&Frame>, bindings: &BindingList) -> Term {
    loop {
        match term {
            Term::Local(slot) => {
                let Some(frame) = frame else {
                    // A local reference with no active frame is a construction
                    // error upstream (method bodies never run frame-less); treat
                    // as permanently unbound rather than panicking.
                    return Term::Local(slot);
                };
                term = frame.local(slot);
            }
            Term::Var(v) => match bindings.lookup(v) {
                Some(next) => term = next,
                None => return Term::Var(v),
            },
            other => return other,
        }
    }
}
