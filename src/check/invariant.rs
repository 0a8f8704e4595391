// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::check::muc::{self, CoreQuery};
use crate::check::search::SearchContext;
use crate::ltl::{flatten, negated_next, propositional_sat, Context, FormulaRef};
use indexmap::IndexSet;

/// Outcome of strengthening the core attached to a state.
enum Strengthened {
    /// a step escaping the cores exists, the transition was recorded
    Progress(FormulaRef),
    /// every extension of the core is blocked as well
    Exhausted,
}

/// Entry point of an invariant episode. Called when the outstanding obligations cannot
/// make progress from `state`. Either fills the witness stack with forward steps that
/// discharge an obligation, or leaves it empty because the obligations are trapped; the
/// caller then folds the collected cores into the avoid formula.
pub fn run(ctx: &mut Context, search: &mut SearchContext, state: FormulaRef) {
    debug_assert!(search.witness.is_empty());
    debug_assert!(!search.obligation_untils.is_empty());
    search.unsat_root = Some(state);
    let initial = ctx.and_set(search.obligation_untils.iter().copied());
    match strengthen(ctx, search, state, initial) {
        Strengthened::Exhausted => {}
        Strengthened::Progress(next) => pursue(ctx, search, next),
    }
}

/// Removes `core` from the potential set, then repeatedly asks whether `state` can take a
/// step that escapes both the core and the remaining potential cores. While the answer is
/// no, the core is grown by a minimal extension from the conjuncts of `state`. Superseded
/// cores are saved for the constraint stack so the pursuit can unwind through them.
fn strengthen(
    ctx: &mut Context,
    search: &mut SearchContext,
    state: FormulaRef,
    mut core: FormulaRef,
) -> Strengthened {
    search.potential_unsat.swap_remove(&core);
    let flat = flatten(ctx, state);
    let mut base = flat;
    if let Some(avoid) = search.avoid {
        base = ctx.and(base, avoid);
    }
    if let Some(blocked) = search.negated_potential(ctx) {
        base = ctx.and(base, blocked);
    }
    let mut superseded = Vec::new();
    let mut probe = {
        let exclusion = negated_next(ctx, core);
        let g = ctx.and(base, exclusion);
        propositional_sat(ctx, g)
    };
    while probe.is_none() {
        let core_set: IndexSet<FormulaRef> = ctx.conjuncts(core).into_iter().collect();
        let mut fixed = Vec::new();
        let mut candidates = Vec::new();
        for c in ctx.conjuncts(state) {
            if core_set.contains(&c) || search.globals.contains(&c) {
                fixed.push(c);
            } else {
                candidates.push(c);
            }
        }
        let query = CoreQuery {
            fixed,
            avoid: search.avoid,
            blocked_potential: search.negated_potential(ctx),
            exclusion: Some(negated_next(ctx, core)),
        };
        let extension = muc::minimize(ctx, &query, &candidates);
        if extension.is_empty() {
            break;
        }
        superseded.push(core);
        core = ctx.and_set(core_set.into_iter().chain(extension));
        probe = {
            let exclusion = negated_next(ctx, core);
            let g = ctx.and(base, exclusion);
            propositional_sat(ctx, g)
        };
    }
    search.graph.record_core(state, core);
    search.potential_unsat.insert(core);
    match probe {
        None => Strengthened::Exhausted,
        Some(assignment) => {
            search.constraint_stack.extend(superseded);
            let next = assignment.successor(ctx);
            search.graph.record_transition(state, assignment, next);
            Strengthened::Progress(next)
        }
    }
}

/// Chases the superseded cores back down: from each state the pursuit tries to take a step
/// that escapes the core on top of the constraint stack, or, once only the bottom entry is
/// left, a step that discharges an obligation marker. On success the path back to the
/// episode root is replayed into the witness stack.
fn pursue(ctx: &mut Context, search: &mut SearchContext, start: FormulaRef) {
    let mut state = start;
    loop {
        assert!(
            !search.constraint_stack.is_empty(),
            "pursuit requires a pending core"
        );
        let flat = flatten(ctx, state);
        let mut g = flat;
        if let Some(avoid) = search.avoid {
            g = ctx.and(g, avoid);
        }
        let at_bottom = search.constraint_stack.len() == 1;
        let target = if at_bottom {
            ctx.or_set(search.obligations.iter().copied())
        } else {
            negated_next(ctx, *search.constraint_stack.last().unwrap())
        };
        g = ctx.and(g, target);
        match propositional_sat(ctx, g) {
            Some(assignment) => {
                let next = assignment.successor(ctx);
                // every pursued state entered the graph as a strengthened core or as the
                // target of an earlier transition
                debug_assert!(search.graph.contains(state));
                search.graph.record_transition(state, assignment, next);
                if at_bottom {
                    let root = search.unsat_root.expect("episode root is set");
                    search.graph.replay(next, root, &mut search.witness);
                    return;
                }
                let top = search.constraint_stack.pop().unwrap();
                search.potential_unsat.insert(top);
                state = next;
            }
            None => {
                let core = search.constraint_stack.pop().unwrap();
                match strengthen(ctx, search, state, core) {
                    Strengthened::Progress(next) => {
                        state = next;
                    }
                    Strengthened::Exhausted => {
                        search.constraint_stack.push(core);
                        match backtrack(ctx, search) {
                            Some(next) => state = next,
                            None => return,
                        }
                    }
                }
            }
        }
    }
}

/// The pursuit is stuck everywhere. Re-strengthen the recorded states until one of them
/// breaks through, or until the collected cores form an unsat invariant.
fn backtrack(ctx: &mut Context, search: &mut SearchContext) -> Option<FormulaRef> {
    loop {
        if is_unsat_invariant(ctx, search) {
            return None;
        }
        let snapshot = search.graph.states_with_cores();
        let mut progressed = None;
        for (state, core) in snapshot {
            if let Strengthened::Progress(next) = strengthen(ctx, search, state, core) {
                progressed = Some(next);
                break;
            }
        }
        if let Some(next) = progressed {
            return Some(next);
        }
    }
}

/// Checks whether the potential cores are closed under succession: no state satisfying a
/// core together with the global obligations can step outside the cores. Once this holds
/// the cores can never discharge the trapped obligations and the episode refutes them.
fn is_unsat_invariant(ctx: &mut Context, search: &mut SearchContext) -> bool {
    debug_assert!(!search.potential_unsat.is_empty());
    let ored = ctx.or_set(search.potential_unsat.iter().copied());
    let escape = negated_next(ctx, ored);
    let mut f = ored;
    if !search.globals.is_empty() {
        let globals = ctx.and_set(search.globals.iter().copied());
        f = ctx.and(f, globals);
    }
    let mut g = flatten(ctx, f);
    g = ctx.and(g, escape);
    if let Some(avoid) = search.avoid {
        g = ctx.and(g, avoid);
    }
    propositional_sat(ctx, g).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::obligations;

    fn search_for(ctx: &mut Context, root: FormulaRef) -> SearchContext {
        SearchContext::new(ctx, root)
    }

    #[test]
    fn trapped_obligation_is_refuted() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let not_b = ctx.not(b);
        let u = ctx.until(a, b);
        let g = ctx.globally(not_b);
        let root = ctx.and(u, g);
        let mut search = search_for(&mut ctx, root);
        assert!(!search.obligations.is_empty());
        run(&mut ctx, &mut search, root);
        assert!(search.witness.is_empty(), "G !b traps a U b forever");
        assert!(!search.potential_unsat.is_empty());
    }

    #[test]
    fn reachable_discharge_fills_witness() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let xb = ctx.next(b);
        let not_b = ctx.not(b);
        let u = ctx.until(a, b);
        // b is forced false now but becomes reachable in the next step
        let root = ctx.and_set([u, not_b, xb]);
        let mut search = search_for(&mut ctx, root);
        obligations::update(&ctx, &mut search, root);
        run(&mut ctx, &mut search, root);
        assert!(
            !search.witness.is_empty(),
            "the obligation can be discharged one step later"
        );
        // the recovered steps form a path starting at the episode root
        let (step, _next) = search.witness.pop().unwrap();
        assert!(crate::ltl::progress(&mut ctx, root, &step).is_some());
    }
}
