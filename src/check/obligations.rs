// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::check::search::SearchContext;
use crate::ltl::{Context, Formula, FormulaRef};
use indexmap::IndexSet;

/// Collects the outstanding obligations of a state: for every top-level until conjunct we
/// track both the until node and its marker atom.
pub fn initial(
    ctx: &Context,
    state: FormulaRef,
) -> (IndexSet<FormulaRef>, IndexSet<FormulaRef>) {
    let mut markers = IndexSet::new();
    let mut untils = IndexSet::new();
    for c in ctx.conjuncts(state) {
        if matches!(ctx.get(c), Formula::Until(_, _)) {
            markers.insert(ctx.marker_of(c));
            untils.insert(c);
        }
    }
    (markers, untils)
}

/// Drops obligations whose until no longer appears as a top-level conjunct of `state`.
/// Obligations are never added here, only [`initial`] and the per step discharge
/// bookkeeping change membership otherwise.
pub fn update(ctx: &Context, search: &mut SearchContext, state: FormulaRef) {
    let (markers_now, untils_now) = initial(ctx, state);
    search.obligations.retain(|m| markers_now.contains(m));
    search.obligation_untils.retain(|u| untils_now.contains(u));
}
