// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::check::invariant;
use crate::check::muc::{self, CoreQuery};
use crate::check::obligations;
use crate::check::search::SearchContext;
use crate::ltl::{flatten, propositional_sat, Assignment, Context, FormulaRef};

/// One expansion of a state during the depth first search. Alternatives are enumerated by
/// blocking the cube of every assignment that already led into a rejected subtree.
pub struct Expansion {
    pub formula: FormulaRef,
    pub flatted: FormulaRef,
    pub blocked: Option<FormulaRef>,
}

impl Expansion {
    pub fn new(ctx: &mut Context, formula: FormulaRef) -> Self {
        let flatted = flatten(ctx, formula);
        Self {
            formula,
            flatted,
            blocked: None,
        }
    }

    /// Rules out `assignment` (and nothing else) from future selections.
    pub fn block(&mut self, ctx: &mut Context, assignment: &Assignment) {
        let cube = assignment.cube(ctx);
        let not_cube = ctx.not(cube);
        self.blocked = Some(match self.blocked {
            None => not_cube,
            Some(prev) => ctx.and(prev, not_cube),
        });
    }
}

/// Picks the next transition out of the expanded state, or `None` when the state offers no
/// further useful transition. The priority order is: replayed witness steps, the loop
/// closing hint, obligation progress, plain progress while no obligation is outstanding.
/// When the outstanding obligations cannot progress at all, an invariant episode decides
/// whether they are merely delayed or trapped.
pub fn select(
    ctx: &mut Context,
    search: &mut SearchContext,
    expansion: &mut Expansion,
) -> Option<(Assignment, FormulaRef)> {
    if let Some(pair) = search.witness.pop() {
        return Some(pair);
    }

    let mut flatted = expansion.flatted;
    if let Some(blocked) = expansion.blocked {
        flatted = ctx.and(flatted, blocked);
    }

    // the hint is single shot: whether or not it can be satisfied it is consumed
    if let Some(wanted) = search.next_wanted.take() {
        let g = ctx.and(flatted, wanted);
        if let Some(assignment) = propositional_sat(ctx, g) {
            return Some(pair_from(ctx, search, assignment));
        }
    }

    obligations::update(ctx, search, expansion.formula);
    if search.refuted(ctx) {
        return None;
    }

    let mut base = flatted;
    if let Some(avoid) = search.avoid {
        base = ctx.and(base, avoid);
    }
    let Some(plain) = propositional_sat(ctx, base) else {
        // no transition at all: distinguish exhaustion by blocking from a dead state
        if expansion.blocked.is_some() {
            let mut unblocked = expansion.flatted;
            if let Some(avoid) = search.avoid {
                unblocked = ctx.and(unblocked, avoid);
            }
            if propositional_sat(ctx, unblocked).is_some() {
                return None;
            }
        }
        learn_dead_state(ctx, search, expansion.formula);
        return None;
    };

    if search.obligations.is_empty() {
        return Some(pair_from(ctx, search, plain));
    }

    let markers = ctx.or_set(search.obligations.iter().copied());
    let g = ctx.and(base, markers);
    if let Some(assignment) = propositional_sat(ctx, g) {
        return Some(pair_from(ctx, search, assignment));
    }

    // obligations cannot progress here; only learn from that if it is not an artifact of
    // the blocked alternatives
    if expansion.blocked.is_some() {
        let mut unblocked = expansion.flatted;
        if let Some(avoid) = search.avoid {
            unblocked = ctx.and(unblocked, avoid);
        }
        let g = ctx.and(unblocked, markers);
        if propositional_sat(ctx, g).is_some() {
            return None;
        }
    }

    invariant::run(ctx, search, expansion.formula);
    let result = if search.witness.is_empty() {
        let learned = ctx.or_set(search.potential_unsat.iter().copied());
        search.fold_avoid(ctx, Some(learned));
        None
    } else {
        search.witness.pop()
    };
    search.end_episode();
    result
}

/// A state whose expansion is propositionally unsatisfiable even without blocking. Its
/// minimal core is folded into the avoid formula; an empty core refutes the whole query.
fn learn_dead_state(ctx: &mut Context, search: &mut SearchContext, state: FormulaRef) {
    let mut fixed = Vec::new();
    let mut candidates = Vec::new();
    for c in ctx.conjuncts(state) {
        if search.globals.contains(&c) {
            fixed.push(c);
        } else {
            candidates.push(c);
        }
    }
    let query = CoreQuery {
        fixed,
        avoid: search.avoid,
        blocked_potential: None,
        exclusion: None,
    };
    let core = muc::minimize(ctx, &query, &candidates);
    if core.is_empty() {
        search.fold_avoid(ctx, None);
    } else {
        let core = ctx.and_set(core);
        search.fold_avoid(ctx, Some(core));
    }
}

/// Wraps a chosen assignment into a transition and keeps the obligation set in sync: a
/// state without outstanding obligations adopts the obligations of its successor, any
/// discharged marker retires its obligation.
fn pair_from(
    ctx: &mut Context,
    search: &mut SearchContext,
    assignment: Assignment,
) -> (Assignment, FormulaRef) {
    let next = assignment.successor(ctx);
    if search.obligations.is_empty() {
        let (markers, untils) = obligations::initial(ctx, next);
        search.obligations = markers;
        search.obligation_untils = untils;
    } else {
        for marker in assignment.discharged_markers(ctx) {
            if search.obligations.swap_remove(&marker) {
                let until = ctx.until_of_marker(marker);
                search.obligation_untils.swap_remove(&until);
            }
        }
    }
    (assignment, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obligation_progress_is_preferred() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let u = ctx.until(a, b);
        let mut search = SearchContext::new(&mut ctx, u);
        let mut expansion = Expansion::new(&mut ctx, u);
        let (assignment, next) = select(&mut ctx, &mut search, &mut expansion).unwrap();
        // with b immediately available the obligation is discharged right away
        assert_eq!(assignment.value(b), Some(true));
        assert_eq!(next, ctx.tru());
        assert!(search.obligations.is_empty());
    }

    #[test]
    fn blocking_enumerates_alternatives() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let g = ctx.globally(a);
        let mut search = SearchContext::new(&mut ctx, g);
        let mut expansion = Expansion::new(&mut ctx, g);
        let (first, next) = select(&mut ctx, &mut search, &mut expansion).unwrap();
        assert_eq!(next, g);
        expansion.block(&mut ctx, &first);
        // `G a` admits essentially one step, blocking it exhausts the state without
        // learning an avoid term
        let avoid_before = search.avoid;
        while let Some((step, _)) = select(&mut ctx, &mut search, &mut expansion) {
            expansion.block(&mut ctx, &step);
        }
        assert_eq!(search.avoid, avoid_before);
        assert!(!search.refuted(&ctx));
    }

    #[test]
    fn dead_state_refutes_query() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        let xa = ctx.next(a);
        let xna = ctx.next(not_a);
        // both successors contradict the consistency seed
        let root = ctx.and_set([xa, xna]);
        let mut search = SearchContext::new(&mut ctx, root);
        let mut expansion = Expansion::new(&mut ctx, root);
        assert!(select(&mut ctx, &mut search, &mut expansion).is_none());
        assert!(search.avoid.is_some());
    }

    #[test]
    fn trapped_obligation_learns_avoid_term() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let not_b = ctx.not(b);
        let u = ctx.until(a, b);
        let g = ctx.globally(not_b);
        let root = ctx.and(u, g);
        let mut search = SearchContext::new(&mut ctx, root);
        let mut expansion = Expansion::new(&mut ctx, root);
        assert!(select(&mut ctx, &mut search, &mut expansion).is_none());
        // the episode learned that re-entering the until is hopeless
        let avoid = search.avoid.unwrap();
        let xu = ctx.next(u);
        let probe = ctx.and(avoid, xu);
        assert!(propositional_sat(&ctx, probe).is_none());
        // episode state was reset
        assert!(search.potential_unsat.is_empty());
        assert!(search.constraint_stack.is_empty());
    }
}
