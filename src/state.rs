//! Persistent `State` map (spec §3, §4.3).
//!
//! Same cons-chain persistence technique as [`crate::binding::BindingList`]
//! — copy-on-write by construction, `Rc::clone` to snapshot. `State` backs
//! both user globals/fluents and the "state elements" the embedding or the
//! core itself registers (the exclusion-logic KB root is one such element,
//! spec §4.10).

use std::{cell::Cell, rc::Rc};

use ahash::AHashMap;

use crate::term::{StateKey, Term};

/// Allocates fresh, process-unique [`StateKey`]s.
///
/// Grounds on `ouros::intern`'s monotonic-index scheme. Spec §6 notes state
/// keys are "identified by object identity of the key" in the source
/// language; we get the same effect cheaply with a counter instead of
/// hashing by pointer identity (an Open Question resolution also applied to
/// `Cool`'s per-site key, see DESIGN.md).
#[derive(Debug, Default)]
pub struct StateKeyAllocator {
    next: Cell<u32>,
}

impl StateKeyAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&self) -> StateKey {
        let id = self.next.get();
        self.next.set(id + 1);
        StateKey(id)
    }
}

#[derive(Debug)]
enum Node {
    Nil,
    Cons { key: StateKey, value: Term, rest: State },
}

/// A persistent mapping from state-variable to term, plus a per-element
/// default consulted when a key has never been overridden.
#[derive(Debug, Clone)]
pub struct State(Rc<Node>);

impl Default for State {
    fn default() -> Self {
        Self::empty()
    }
}

impl State {
    #[must_use]
    pub fn empty() -> Self {
        Self(Rc::new(Node::Nil))
    }

    /// Returns a new `State` with `key` overridden to `value`. The receiver
    /// is untouched: backtracking recovers the prior state by simply using
    /// the previous `State` reference, never by undoing this call.
    #[must_use]
    pub fn bind(&self, key: StateKey, value: Term) -> Self {
        Self(Rc::new(Node::Cons {
            key,
            value,
            rest: self.clone(),
        }))
    }

    /// Consults the override chain only; `None` means "never bound in this
    /// state", distinct from a bound-to-null value.
    #[must_use]
    pub fn get_override(&self, key: StateKey) -> Option<Term> {
        let mut node = &self.0;
        loop {
            match node.as_ref() {
                Node::Nil => return None,
                Node::Cons { key: k, value, rest } => {
                    if *k == key {
                        return Some(value.clone());
                    }
                    node = &rest.0;
                }
            }
        }
    }
}

/// Per-key default values, registered once at program init (e.g. the KB root
/// default is an empty trie). Not itself part of `State`'s persistence —
/// defaults never change during execution, only the override chain does.
#[derive(Debug, Default)]
pub struct StateDefaults(AHashMap<StateKey, Term>);

impl StateDefaults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: StateKey, default: Term) {
        self.0.insert(key, default);
    }

    /// `TryGet`: override, then default, then an unbound sentinel.
    #[must_use]
    pub fn try_get(&self, state: &State, key: StateKey) -> Term {
        state
            .get_override(key)
            .or_else(|| self.0.get(&key).cloned())
            .unwrap_or(Term::null())
    }
}
