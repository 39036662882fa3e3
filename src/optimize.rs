/*!
A pass that short-circuits `Goto` chains in a compiled program.

Parsing composes fragments with `Goto` instructions, so the compiled
program routinely contains hops that do nothing but forward to another
instruction. Every successor field that points into such a chain is
rewritten to the chain's final, non-`Goto` target. The gotos themselves
stay in place but become unreachable; a `Goto` has a single successor and
no side effect, so bypassing one cannot change which program points a
thread reaches or the order it reaches them in.

Progress guards are left alone: an `Advance` is a dedup point that every
repetition must retain, even though it also executes as an unconditional
transition.
*/

use log::trace;

use crate::nfa::{Instr, InstrId, Program};

/// Rewrite every successor that points at a `Goto` to that goto chain's
/// final target. Returns the number of goto instructions bypassed.
pub(crate) fn eliminate_gotos(program: &mut Program) -> usize {
    // final_target[id] is Some for each goto, holding the successor its
    // chain ultimately leads to.
    let mut final_target: Vec<Option<InstrId>> = (0..program.len())
        .map(|id| match *program.instr(id) {
            Instr::Goto { next } => Some(next),
            _ => None,
        })
        .collect();
    let goto_count =
        final_target.iter().filter(|target| target.is_some()).count();
    if goto_count == 0 {
        return 0;
    }

    // Shorten chains until no recorded target is itself a goto. Each pass
    // strictly shortens at least one chain; the parser cannot produce a
    // goto cycle, since a goto's successor is always patched to an
    // instruction appended later.
    let mut changed = true;
    while changed {
        changed = false;
        for id in 0..final_target.len() {
            let Some(target) = final_target[id] else { continue };
            if let Some(beyond) = final_target[target] {
                debug_assert!(beyond != id, "goto cycle at {}", id);
                final_target[id] = Some(beyond);
                changed = true;
            }
        }
    }

    // Point every successor field past the chains.
    for id in 0..program.len() {
        match *program.instr_mut(id) {
            Instr::MatchCharCategory { ref mut next, .. }
            | Instr::Goto { ref mut next }
            | Instr::Advance { ref mut next }
            | Instr::MarkGroupStart { ref mut next, .. }
            | Instr::MarkGroupEnd { ref mut next, .. } => {
                if let Some(target) = final_target[*next] {
                    *next = target;
                }
            }
            Instr::Fork { ref mut next, ref mut next2 } => {
                if let Some(target) = final_target[*next] {
                    *next = target;
                }
                if let Some(target) = final_target[*next2] {
                    *next2 = target;
                }
            }
            Instr::Accept => {}
        }
    }

    trace!("bypassed {} goto instructions", goto_count);
    goto_count
}
