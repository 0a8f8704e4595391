// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ltl::{flatten, propositional_sat, Context, FormulaRef};

/// Fixed context of a core extraction query. A candidate set is tested by conjoining the
/// fixed conjuncts with the remaining candidates, expanding one step and checking the
/// propositional abstraction together with the side constraints.
pub struct CoreQuery {
    /// conjuncts that are part of every test, e.g. the global obligations
    pub fixed: Vec<FormulaRef>,
    /// learned avoid formula, if any
    pub avoid: Option<FormulaRef>,
    /// `!X(...)` exclusion forcing the test away from already known cores
    pub blocked_potential: Option<FormulaRef>,
    /// additional exclusion, e.g. `!X(core)` while strengthening
    pub exclusion: Option<FormulaRef>,
}

impl CoreQuery {
    fn is_unsat(&self, ctx: &mut Context, members: impl IntoIterator<Item = FormulaRef>) -> bool {
        let conj = ctx.and_set(self.fixed.iter().copied().chain(members));
        let mut probe = flatten(ctx, conj);
        for side in [self.avoid, self.blocked_potential, self.exclusion]
            .into_iter()
            .flatten()
        {
            probe = ctx.and(probe, side);
        }
        propositional_sat(ctx, probe).is_none()
    }
}

/// Shrinks `candidates` to a minimal subset that is still unsatisfiable together with the
/// fixed conjuncts of `query`, by binary search over the candidate set. Requires the full
/// candidate set to be unsatisfiable; returns the affirmed members. An empty result means
/// the fixed conjuncts alone are already unsatisfiable.
pub fn minimize(ctx: &mut Context, query: &CoreQuery, candidates: &[FormulaRef]) -> Vec<FormulaRef> {
    let mut affirmed: Vec<FormulaRef> = Vec::new();
    let mut pending: Vec<Vec<FormulaRef>> = vec![candidates.to_vec()];
    while let Some(subset) = pending.pop() {
        if subset.is_empty() {
            continue;
        }
        // everything except this subset: affirmed members plus the still pending ones
        let rest = || {
            affirmed
                .iter()
                .chain(pending.iter().flatten())
                .copied()
                .collect::<Vec<_>>()
        };
        if query.is_unsat(ctx, rest()) {
            // the subset is redundant, drop it entirely
            continue;
        }
        if subset.len() == 1 {
            affirmed.push(subset[0]);
            continue;
        }
        let (left, right) = subset.split_at(subset.len() / 2);
        let with_left = rest().into_iter().chain(left.iter().copied());
        if query.is_unsat(ctx, with_left.collect::<Vec<_>>()) {
            pending.push(left.to_vec());
            continue;
        }
        let with_right = rest().into_iter().chain(right.iter().copied());
        if query.is_unsat(ctx, with_right.collect::<Vec<_>>()) {
            pending.push(right.to_vec());
            continue;
        }
        // the contradiction straddles the split, keep refining both halves
        pending.push(left.to_vec());
        pending.push(right.to_vec());
    }
    affirmed
}
