/*!
A parallel simulation of a compiled program over an input string, in the
style of Pike's VM.

The simulation holds one *closure* at a time: the set of program points
reachable from the start via epsilon transitions given the input consumed
so far, each paired with the capture snapshot of the path that reached it.
Stepping the closure over one input character produces the next closure.
Candidate order within a closure is discovery order, which follows the
preferred branch of every fork first; that order is what delivers
leftmost-first, greedy match semantics without backtracking.
*/

use log::trace;

use crate::{
    matches::MatchResults,
    nfa::{Instr, InstrId, Program},
};

/// Run `program` over `haystack`, writing capture extents into `results`.
///
/// Returns true, and marks `results` ready, if an accepting path consumed
/// a prefix of the haystack. Whatever the outcome, `results` ends up with
/// one entry per group of the program.
pub(crate) fn run(
    program: &Program,
    haystack: &str,
    results: &mut MatchResults,
) -> bool {
    trace!(
        "running {} instructions over {} haystack bytes",
        program.len(),
        haystack.len(),
    );
    results.reset();

    let mut curr = Closure::new(program.len());
    let mut next = Closure::new(program.len());
    let mut stack = Vec::new();
    add_to_closure(
        program,
        &mut stack,
        &mut curr,
        program.start_id(),
        0,
        MatchResults::new(),
    );

    let mut at = 0;
    while !curr.candidates.is_empty() {
        let ch = haystack[at..].chars().next();
        for cand in curr.candidates.drain(..) {
            match *program.instr(cand.pc) {
                Instr::Accept => {
                    // The highest-priority accept of this step wins, and
                    // every remaining candidate could only produce an
                    // equal-or-worse result here, so the rest of the step
                    // is pruned. Candidates that already advanced into the
                    // next closure outrank this accept and keep running;
                    // if one of them accepts later it overwrites this
                    // result.
                    *results = cand.capture;
                    results.set_ready();
                    break;
                }
                Instr::MatchCharCategory { cc, next: target } => {
                    if let Some(ch) = ch {
                        if cc.matches(ch) {
                            add_to_closure(
                                program,
                                &mut stack,
                                &mut next,
                                target,
                                at + ch.len_utf8(),
                                cand.capture,
                            );
                        }
                    }
                }
                _ => unreachable!(
                    "only char matches and accepts can be candidates"
                ),
            }
        }
        core::mem::swap(&mut curr, &mut next);
        next.clear();
        // The position moves exactly once per step, whether or not any
        // candidate matched; otherwise an input with no matching
        // candidate would stall the loop.
        at += ch.map_or(1, char::len_utf8);
    }

    results.resize(program.mark_count());
    results.ready()
}

/// A single active thread of the simulation: a program point waiting on
/// input (`MatchCharCategory`) or signalling acceptance (`Accept`), paired
/// with its capture snapshot.
#[derive(Clone, Debug)]
struct Candidate {
    pc: InstrId,
    capture: MatchResults,
}

/// The set of threads active at one input position.
///
/// `candidates` is ordered; the order is the match priority. `visited`
/// holds every program point reached while building the closure,
/// including pass-through instructions, so that each point is considered
/// at most once per position. The first path to reach a point keeps it;
/// that is both what makes the simulation polynomial and what resolves
/// capture ties leftmost-first.
#[derive(Debug)]
struct Closure {
    candidates: Vec<Candidate>,
    visited: SparseSet,
}

impl Closure {
    fn new(capacity: usize) -> Closure {
        Closure { candidates: vec![], visited: SparseSet::new(capacity) }
    }

    fn clear(&mut self) {
        self.candidates.clear();
        self.visited.clear();
    }
}

/// Add the epsilon closure of `pc` to `closure`, recording group marks
/// into `capture` along the way. `at` is the current input position.
///
/// The traversal is depth first with the preferred fork branch walked
/// first, using `stack` (kept allocated by the caller) instead of the call
/// stack. Lower-priority fork branches wait on the stack with their own
/// capture snapshots.
fn add_to_closure(
    program: &Program,
    stack: &mut Vec<(InstrId, MatchResults)>,
    closure: &mut Closure,
    pc: InstrId,
    at: usize,
    capture: MatchResults,
) {
    debug_assert!(stack.is_empty());
    stack.push((pc, capture));
    while let Some((mut pc, mut capture)) = stack.pop() {
        // Chains of epsilon successors are followed in place rather than
        // round-tripped through the stack.
        loop {
            if !closure.visited.insert(pc) {
                break;
            }
            match *program.instr(pc) {
                Instr::MatchCharCategory { .. } | Instr::Accept => {
                    closure.candidates.push(Candidate { pc, capture });
                    break;
                }
                Instr::Goto { next } => pc = next,
                // The visited set already guarantees that no thread can
                // come back around to a repetition head without the input
                // position having advanced, which is all the progress
                // guard has to ensure. So at runtime it degenerates to an
                // unconditional transition.
                Instr::Advance { next } => pc = next,
                Instr::Fork { next, next2 } => {
                    stack.push((next2, capture.clone()));
                    pc = next;
                }
                Instr::MarkGroupStart { next, group_id } => {
                    capture.set_start(group_id, at);
                    pc = next;
                }
                Instr::MarkGroupEnd { next, group_id } => {
                    capture.set_end(group_id, at);
                    pc = next;
                }
            }
        }
    }
}

/// A set of instruction identifiers with constant time insertion,
/// membership testing and clearing.
///
/// The data structure is based on: https://research.swtch.com/sparse
/// Note though that no uninitialized memory is used, and the set is
/// reused across steps, so the initial allocation cost is paid once per
/// search.
#[derive(Debug)]
struct SparseSet {
    /// The number of elements currently in this set.
    len: usize,
    /// The members in insertion order.
    dense: Vec<InstrId>,
    /// Maps an id to its location in `dense`. An id is in the set if and
    /// only if sparse[id] < len && dense[sparse[id]] == id.
    sparse: Vec<usize>,
}

impl SparseSet {
    fn new(capacity: usize) -> SparseSet {
        SparseSet {
            len: 0,
            dense: vec![0; capacity],
            sparse: vec![0; capacity],
        }
    }

    /// Insert `id` into this set. Returns false if it was already there.
    fn insert(&mut self, id: InstrId) -> bool {
        if self.contains(id) {
            return false;
        }
        let index = self.len;
        self.dense[index] = id;
        self.sparse[id] = index;
        self.len += 1;
        true
    }

    fn contains(&self, id: InstrId) -> bool {
        let index = self.sparse[id];
        index < self.len && self.dense[index] == id
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}
