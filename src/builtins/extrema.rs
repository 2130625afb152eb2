//! `Max(?value, goal, ?out)` / `Min(?value, goal, ?out)` (spec §4.9):
//! enumerate every solution of `goal`, keep the one with the extreme
//! dereferenced value of `value`, then replay that solution's bindings,
//! output, and state as if it were the only one ever tried.

use std::rc::Rc;

use crate::{
    binding::deref,
    env::{Env, ProgramBuilder},
    frame::Frame,
    primitive::{Cont, Primitive, StepResult},
    term::{term_cmp, Term},
    textbuffer::TextBuffer,
    unify::unify,
};

use super::{call_goal, name, Named};

#[derive(Debug)]
struct Extremum { want_max: bool }

impl Primitive for Extremum {
    fn name(&self) -> crate::intern::StringId {
        unreachable!()
    }

    fn call(&self, args: &[Term], output: TextBuffer, env: Env, predecessor: Option<Rc<Frame>>, k: &mut Cont<'_>) -> StepResult {
        let [value, goal, out] = args else { return Ok(false) };
        let mut best: Option<(Term, TextBuffer, Env)> = None;
        let throwaway = TextBuffer::write_mode();
        call_goal(goal, throwaway, env.clone(), predecessor, &mut |out2, env2| {
            let v = deref(value.clone(), env2.frame.as_deref(), &env2.bindings);
            let better = match &best {
                None => true,
                Some((bv, ..)) => {
                    let ord = term_cmp(&v, bv);
                    if self.want_max { ord.is_gt() } else { ord.is_lt() }
                }
            };
            if better {
                best = Some((v, out2, env2));
            }
            Ok(false)
        })?;
        let Some((value, _inner_out, winner_env)) = best else { return Ok(false) };
        match unify(out, &value, winner_env.frame.as_deref(), &winner_env.bindings) {
            Ok(bindings) => k(output, winner_env.with_bindings(bindings)),
            Err(_) => Ok(false),
        }
    }
}

pub fn register(builder: &mut ProgramBuilder) {
    builder.register_primitive(Rc::new(Named { inner: Rc::new(Extremum { want_max: true }), name: name(builder, "Max") }));
    builder.register_primitive(Rc::new(Named { inner: Rc::new(Extremum { want_max: false }), name: name(builder, "Min") }));
}
