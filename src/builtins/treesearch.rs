//! `TreeSearch(start, nextNode, goalNode, nodeUtility, ?result)`: best-first
//! search over a frontier ordered by utility (spec §4.9, scenario 6).

use std::{cmp::Ordering, collections::BinaryHeap, rc::Rc};

use crate::{
    binding::deref,
    env::{Env, ProgramBuilder},
    frame::Frame,
    primitive::{Cont, Primitive, StepResult},
    state::State,
    term::Term,
    textbuffer::TextBuffer,
    unify::unify,
};

use super::{call_goal, name, Named};

/// Total-order wrapper around `f64` utility so frontier entries can live in
/// a `BinaryHeap` (a max-heap — exactly "expand highest utility first").
/// NaN sorts as less than everything, which keeps the heap from panicking
/// without needing a fallible comparator at every push/pop.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Utility(f64);

impl Eq for Utility {}
impl PartialOrd for Utility {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Utility {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Less)
    }
}

struct FrontierEntry {
    utility: Utility,
    node: Term,
    bindings: crate::binding::BindingList,
    state: State,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.utility == other.utility
    }
}
impl Eq for FrontierEntry {}
impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utility.cmp(&other.utility)
    }
}

#[derive(Debug)]
struct TreeSearch;

impl Primitive for TreeSearch {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [start, next_node, goal_node, node_utility, result] = args else { return Ok(false) };

        let mut heap: BinaryHeap<FrontierEntry> = BinaryHeap::new();
        let start = deref(start.clone(), env.frame.as_deref(), &env.bindings);
        let u0 = evaluate_utility(node_utility, &start, &env, predecessor.clone())?.unwrap_or(Utility(f64::MIN));
        heap.push(FrontierEntry { utility: u0, node: start, bindings: env.bindings.clone(), state: env.state.clone() });

        while let Some(entry) = heap.pop() {
            let node_env = env.with_bindings(entry.bindings.clone()).with_state(entry.state.clone());

            let mut is_goal = false;
            call_goal(
                &goal_call(goal_node, &entry.node),
                TextBuffer::write_mode(),
                node_env.clone(),
                predecessor.clone(),
                &mut |_out, _env| {
                    is_goal = true;
                    Ok(true)
                },
            )?;

            if is_goal {
                match unify(result, &entry.node, node_env.frame.as_deref(), &node_env.bindings) {
                    Ok(bindings) => {
                        if k(output.clone(), node_env.with_bindings(bindings))? {
                            return Ok(true);
                        }
                    }
                    Err(_) => {}
                }
                continue;
            }

            let child_var = Term::Var(env.program.vars.fresh(None));
            call_goal(
                &goal_call(next_node, &entry.node).paired_with(child_var.clone()),
                TextBuffer::write_mode(),
                node_env.clone(),
                predecessor.clone(),
                &mut |_out, env2| {
                    let child = deref(child_var.clone(), env2.frame.as_deref(), &env2.bindings);
                    if let Some(u) = evaluate_utility(node_utility, &child, &env2, predecessor.clone())? {
                        heap.push(FrontierEntry {
                            utility: u,
                            node: child,
                            bindings: env2.bindings.clone(),
                            state: env2.state.clone(),
                        });
                    }
                    Ok(false)
                },
            )?;
        }
        Ok(false)
    }
}

/// Builds the reified 1-arg goal `task(node)`.
fn goal_call(task: &Term, node: &Term) -> Term {
    Term::tuple(vec![task.clone(), node.clone()])
}

trait PairWith {
    fn paired_with(self, extra: Term) -> Term;
}
impl PairWith for Term {
    /// Extends a reified `task(arg)` goal with one more trailing argument,
    /// i.e. `task(arg, extra)` — used to turn `nextNode`'s 1-arg goal shape
    /// into the 2-arg `nextNode(node, childOut)` relation shape it's
    /// actually called with.
    fn paired_with(self, extra: Term) -> Term {
        match self {
            Term::Tuple(items) => {
                let mut v = items.to_vec();
                v.push(extra);
                Term::tuple(v)
            }
            other => Term::tuple(vec![other, extra]),
        }
    }
}

fn evaluate_utility(
    task: &Term,
    node: &Term,
    env: &Env,
    predecessor: Option<Rc<Frame>>,
) -> Result<Option<Utility>, crate::error::ExecError> {
    let out_var = Term::Var(env.program.vars.fresh(None));
    let mut value = None;
    call_goal(
        &goal_call(task, node).paired_with(out_var.clone()),
        TextBuffer::write_mode(),
        env.clone(),
        predecessor,
        &mut |_out, env2| {
            if let Term::Atom(crate::term::Atom::Num(n)) = deref(out_var.clone(), env2.frame.as_deref(), &env2.bindings) {
                value = Some(Utility(n.as_f64()));
            }
            Ok(true)
        },
    )?;
    Ok(value)
}

pub fn register(builder: &mut ProgramBuilder) {
    builder.register_primitive(Rc::new(Named { inner: Rc::new(TreeSearch), name: name(builder, "TreeSearch") }));
}
