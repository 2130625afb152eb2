//! String interning for atom names, local/state-variable names, and feature labels.
//!
//! Interning keeps `Term::clone()` cheap: every name that would otherwise be a
//! heap-allocated `String` is instead a small `Copy` index into a shared table.
//! This matters because the binding list and state map (see [`crate::binding`],
//! [`crate::state`]) clone terms constantly while threading through
//! continuations.

use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashMap;

/// Index into an [`Interner`]'s table.
///
/// `u32` keeps `Term` small; interners in practice hold far fewer than 4
/// billion distinct names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct StringId(u32);

impl StringId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Builds a `StringId` from a raw index without going through an
    /// `Interner`. Used only for sentinel ids (e.g. the synthetic root
    /// frame's task name) that are never resolved through `Interner::resolve`.
    #[must_use]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// Append-only string interner shared by a [`crate::env::Module`].
///
/// Grounded on `ouros::intern::Interns`: a `Vec<Rc<str>>` for storage plus a
/// map from string to id for dedup on insert. Never shrinks; a program's
/// atom/name vocabulary is fixed once loaded.
#[derive(Debug, Default)]
pub struct Interner {
    strings: RefCell<Vec<Rc<str>>>,
    lookup: RefCell<AHashMap<Rc<str>, StringId>>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `s`, returning its id. Repeated interning of equal strings
    /// always returns the same id.
    pub fn intern(&self, s: &str) -> StringId {
        if let Some(id) = self.lookup.borrow().get(s) {
            return *id;
        }
        let rc: Rc<str> = Rc::from(s);
        let mut strings = self.strings.borrow_mut();
        let id = StringId(strings.len() as u32);
        strings.push(Rc::clone(&rc));
        self.lookup.borrow_mut().insert(rc, id);
        id
    }

    #[must_use]
    pub fn resolve(&self, id: StringId) -> Rc<str> {
        Rc::clone(&self.strings.borrow()[id.index()])
    }
}

/// A name rendered for error messages and the KB dump; carries its own
/// resolved text so call sites don't need interner access just to `Display`.
#[derive(Debug, Clone)]
pub struct DisplayName(pub Rc<str>);

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
