//! `Implies(gen, body)`: succeeds iff `body` succeeds for every solution of
//! `gen`; preserves text and state the same way `ForEach` does (spec §4.9).

use std::rc::Rc;

use crate::{
    env::{Env, ProgramBuilder},
    frame::Frame,
    primitive::{Cont, Primitive, StepResult},
    term::Term,
    textbuffer::TextBuffer,
};

use super::{call_goal, collect_bindings, name, Named};

#[derive(Debug)]
struct Implies;

impl Primitive for Implies {
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
            match advanced {
                Some((out2, state2)) => {
                    cur_output = out2;
                    cur_state = state2;
                }
                // One solution of `gen` for which `body` has no solution at
                // all: the universal claim fails.
                None => return Ok(false),
            }
        }
        k(cur_output, env.with_state(cur_state))
    }
}

pub fn register(builder: &mut ProgramBuilder) {
    builder.register_primitive(Rc::new(Named { inner: Rc::new(Implies), name: name(builder, "Implies") }));
}
