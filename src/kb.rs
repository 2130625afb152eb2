//! Exclusion-logic knowledge base (spec §4.10).
//!
//! A persistent trie over *sentences*: alternating separator/key sequences.
//! Grounds the path-copying discipline on `ouros::types::chain_map::ChainMap`
//! (rebuild-on-write, old references stay valid) and the non-exclusive
//! branch's "multiple children" map on the same `IndexMap` the term model
//! uses for feature structures, for the same reason: deterministic iteration
//! order for `dump`.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    binding::{deref, BindingList},
    frame::Frame,
    term::{Atom, AtomKey, Term},
    unify::unify,
};

/// Which kind of edge led to a trie position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sep {
    /// `/`: non-exclusive: multiple children may coexist under one parent.
    Slash,
    /// `!`: exclusive: at most one (key, child) pair survives.
    Bang,
}

/// One element of a sentence: a separator paired with the key atom that
/// follows it.
#[derive(Debug, Clone)]
pub struct PathElem {
    pub sep: Sep,
    pub key: Term,
}

#[derive(Debug, Clone, Default)]
struct KbNode {
    /// True if a sentence ends exactly at this node.
    terminal: bool,
    /// Non-exclusive children, in write order.
    slash: Rc<IndexMap<AtomKey, Rc<KbNode>>>,
    /// At most one exclusive child; writing a new key overwrites (subtracts)
    /// the prior subtree entirely.
    bang: Option<(AtomKey, Rc<KbNode>)>,
}

/// A persistent exclusion-logic trie. Cheap to clone (`Rc::clone` of the
/// root); `write`/`delete` return a new `Kb` rather than mutating, so an
/// older `Kb` captured in an ancestor `Env` stays valid (spec §3).
#[derive(Debug, Clone)]
pub struct Kb {
    root: Rc<KbNode>,
}

impl Default for Kb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Error distinguishing the two fatal conditions spec §4.10/§7 calls out for
/// KB writes, kept separate from [`crate::error::UnifyFail`] since these are
/// genuine errors (loader/program bugs), not backtrackable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KbWriteError {
    SeparatorMismatch,
    NonGroundKey,
}

impl Kb {
    #[must_use]
    pub fn empty() -> Self {
        Self { root: Rc::new(KbNode::default()) }
    }

    fn ground_key(term: &Term, frame: Option<&Frame>, bindings: &BindingList) -> Result<AtomKey, KbWriteError> {
        match deref(term.clone(), frame, bindings) {
            Term::Atom(atom) => AtomKey::try_from(&atom).map_err(|()| KbWriteError::NonGroundKey),
            _ => Err(KbWriteError::NonGroundKey),
        }
    }

    /// Writes `path` into the trie, returning the new root. All keys must be
    /// ground. Reusing a key at a position through the *other* separator
    /// than previously used there is a fatal error (spec: "separator
    /// mismatch on write is a fatal error").
    pub fn write(&self, path: &[PathElem], frame: Option<&Frame>, bindings: &BindingList) -> Result<Self, KbWriteError> {
        let root = Self::write_node(&self.root, path, frame, bindings)?;
        Ok(Self { root })
    }

    fn write_node(
        node: &Rc<KbNode>,
        path: &[PathElem],
        frame: Option<&Frame>,
        bindings: &BindingList,
    ) -> Result<Rc<KbNode>, KbWriteError> {
        let Some((head, rest)) = path.split_first() else {
            let mut next = (**node).clone();
            next.terminal = true;
            return Ok(Rc::new(next));
        };
        let key = Self::ground_key(&head.key, frame, bindings)?;
        let mut next = (**node).clone();
        match head.sep {
            Sep::Slash => {
                if matches!(&next.bang, Some((bk, _)) if *bk == key) {
                    return Err(KbWriteError::SeparatorMismatch);
                }
                let child = next.slash.get(&key).cloned().unwrap_or_default();
                let new_child = Self::write_node(&child, rest, frame, bindings)?;
                let mut map = (*next.slash).clone();
                map.insert(key, new_child);
                next.slash = Rc::new(map);
            }
            Sep::Bang => {
                if next.slash.contains_key(&key) {
                    return Err(KbWriteError::SeparatorMismatch);
                }
                let child = match &next.bang {
                    Some((bk, bc)) if *bk == key => bc.clone(),
                    _ => Rc::new(KbNode::default()),
                };
                let new_child = Self::write_node(&child, rest, frame, bindings)?;
                next.bang = Some((key, new_child));
            }
        }
        Ok(Rc::new(next))
    }

    /// Deletes `path` if present. Deleting a non-existent path is a no-op
    /// (not a fatal error): `lookup` will simply continue to fail for it.
    pub fn delete(&self, path: &[PathElem], frame: Option<&Frame>, bindings: &BindingList) -> Result<Self, KbWriteError> {
        match Self::delete_node(&self.root, path, frame, bindings)? {
            Some(root) => Ok(Self { root }),
            None => Ok(Self::empty()),
        }
    }

    fn delete_node(
        node: &Rc<KbNode>,
        path: &[PathElem],
        frame: Option<&Frame>,
        bindings: &BindingList,
    ) -> Result<Option<Rc<KbNode>>, KbWriteError> {
        let Some((head, rest)) = path.split_first() else {
            let mut next = (**node).clone();
            next.terminal = false;
            return Ok(Some(Rc::new(next)));
        };
        let key = Self::ground_key(&head.key, frame, bindings)?;
        let mut next = (**node).clone();
        match head.sep {
            Sep::Slash => {
                if let Some(child) = next.slash.get(&key).cloned() {
                    if let Some(new_child) = Self::delete_node(&child, rest, frame, bindings)? {
                        let mut map = (*next.slash).clone();
                        map.insert(key, new_child);
                        next.slash = Rc::new(map);
                    } else {
                        let mut map = (*next.slash).clone();
                        map.shift_remove(&key);
                        next.slash = Rc::new(map);
                    }
                }
            }
            Sep::Bang => {
                if let Some((bk, bc)) = &next.bang {
                    if *bk == key {
                        next.bang = Self::delete_node(bc, rest, frame, bindings)?.map(|c| (key, c));
                    }
                }
            }
        }
        Ok(Some(Rc::new(next)))
    }

    /// Enumerates every binding list produced by matching `path` against the
    /// trie, unifying non-ground keys against each candidate child in turn
    /// (spec: lookup "unifies over non-ground keys and thereby enumerates
    /// matching sentences"). Eager: returns every solution at once, which is
    /// adequate for the KB sizes this language targets and keeps the
    /// nondeterministic-relation wrapper (§4.7) trivial to drive.
    #[must_use]
    pub fn lookup(&self, path: &[PathElem], frame: Option<&Frame>, bindings: &BindingList) -> Vec<BindingList> {
        Self::lookup_node(&self.root, path, frame, bindings)
    }

    fn lookup_node(node: &Rc<KbNode>, path: &[PathElem], frame: Option<&Frame>, bindings: &BindingList) -> Vec<BindingList> {
        let Some((head, rest)) = path.split_first() else {
            return if node.terminal { vec![bindings.clone()] } else { Vec::new() };
        };
        let mut results = Vec::new();
        match head.sep {
            Sep::Slash => {
                for (key, child) in node.slash.iter() {
                    let key_term = atom_key_to_term(key);
                    if let Ok(next_bindings) = unify(&head.key, &key_term, frame, bindings) {
                        results.extend(Self::lookup_node(child, rest, frame, &next_bindings));
                    }
                }
            }
            Sep::Bang => {
                if let Some((key, child)) = &node.bang {
                    let key_term = atom_key_to_term(key);
                    if let Ok(next_bindings) = unify(&head.key, &key_term, frame, bindings) {
                        results.extend(Self::lookup_node(child, rest, frame, &next_bindings));
                    }
                }
            }
        }
        results
    }

    /// Produces the sorted list of every complete sentence stored in the
    /// trie (spec: `dump`).
    #[must_use]
    pub fn dump(&self) -> Vec<Vec<(Sep, Term)>> {
        let mut out = Vec::new();
        Self::dump_node(&self.root, &mut Vec::new(), &mut out);
        out.sort_by(|a, b| render_sentence(a).cmp(&render_sentence(b)));
        out
    }

    fn dump_node(node: &Rc<KbNode>, prefix: &mut Vec<(Sep, Term)>, out: &mut Vec<Vec<(Sep, Term)>>) {
        if node.terminal {
            out.push(prefix.clone());
        }
        for (key, child) in node.slash.iter() {
            prefix.push((Sep::Slash, atom_key_to_term(key)));
            Self::dump_node(child, prefix, out);
            prefix.pop();
        }
        if let Some((key, child)) = &node.bang {
            prefix.push((Sep::Bang, atom_key_to_term(key)));
            Self::dump_node(child, prefix, out);
            prefix.pop();
        }
    }
}

fn atom_key_to_term(key: &AtomKey) -> Term {
    match key {
        AtomKey::Str(id) => Term::Atom(Atom::Str(*id)),
        AtomKey::Int(n) => Term::int(*n),
        AtomKey::Bool(b) => Term::bool(*b),
        AtomKey::Null => Term::null(),
    }
}

fn render_sentence(sentence: &[(Sep, Term)]) -> String {
    let mut s = String::new();
    for (sep, key) in sentence {
        s.push(match sep {
            Sep::Slash => '/',
            Sep::Bang => '!',
        });
        s.push_str(&key.to_string());
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slash(key: Term) -> PathElem {
        PathElem { sep: Sep::Slash, key }
    }

    fn bang(key: Term) -> PathElem {
        PathElem { sep: Sep::Bang, key }
    }

    #[test]
    fn write_then_lookup_roundtrip() {
        let kb = Kb::empty();
        let bindings = BindingList::empty();
        let path = vec![slash(Term::int(1)), slash(Term::int(2))];
        let kb = kb.write(&path, None, &bindings).unwrap();
        assert!(!kb.lookup(&path, None, &bindings).is_empty());
        let kb = kb.delete(&path, None, &bindings).unwrap();
        assert!(kb.lookup(&path, None, &bindings).is_empty());
    }

    #[test]
    fn exclusive_write_overwrites_prior_key() {
        let bindings = BindingList::empty();
        let base = vec![slash(Term::int(1)), slash(Term::int(2))];
        let mut path_c = base.clone();
        path_c.push(bang(Term::int(3)));
        let mut path_d = base.clone();
        path_d.push(bang(Term::int(4)));

        let kb = Kb::empty().write(&path_c, None, &bindings).unwrap();
        let kb = kb.write(&path_d, None, &bindings).unwrap();

        assert!(kb.lookup(&path_c, None, &bindings).is_empty());
        assert!(!kb.lookup(&path_d, None, &bindings).is_empty());

        let dumped = kb.dump();
        assert_eq!(dumped.len(), 1);
    }
}
