// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::check::search::SearchContext;
use crate::check::select::{self, Expansion};
use crate::check::types::{CheckResult, CheckerOptions, Witness};
use crate::ltl::{
    distribute_next, flatten, nnf, Context, Formula, FormulaRef,
};
use indexmap::IndexSet;

/// Checks whether `e` is satisfiable over infinite traces. A positive verdict comes with a
/// lasso shaped witness trace.
pub fn check(ctx: &mut Context, e: FormulaRef, options: &CheckerOptions) -> CheckResult {
    let e = nnf(ctx, e);
    let e = distribute_next(ctx, e);
    if e == ctx.tru() {
        return CheckResult::Sat(Witness::default());
    }
    if e == ctx.fals() {
        return CheckResult::Unsat;
    }
    let mut search = SearchContext::new(ctx, e);
    if dfs(ctx, &mut search, options) {
        CheckResult::Sat(build_witness(&search))
    } else {
        CheckResult::Unsat
    }
}

/// Expands the state on top of the search path and recurses into every selected successor.
/// A branch succeeds by reaching the `true` state or by closing an accepting loop; failed
/// successors are blocked and their states remembered as explored.
fn dfs(ctx: &mut Context, search: &mut SearchContext, options: &CheckerOptions) -> bool {
    let state = *search.path.last().unwrap();
    set_hint(ctx, search, options);
    let mut expansion = Expansion::new(ctx, state);
    while let Some((assignment, next)) = select::select(ctx, search, &mut expansion) {
        if next == ctx.fals() {
            expansion.block(ctx, &assignment);
            continue;
        }
        search.edges.push(assignment.clone());
        if next == ctx.tru() {
            search.loop_start = None;
            return true;
        }
        if !search.explored.contains(&next) {
            if let Some(&pos) = search.on_path.get(&next) {
                if loop_accepts(ctx, search, pos) {
                    search.loop_start = Some(pos);
                    return true;
                }
            } else {
                search.on_path.insert(next, search.path.len());
                search.path.push(next);
                if dfs(ctx, search, options) {
                    return true;
                }
                search.path.pop();
                search.on_path.swap_remove(&next);
                if search.next_satisfied_pos > 0 && search.path.len() - 1 < search.next_satisfied_pos
                {
                    search.next_satisfied_pos -= 1;
                }
                search.explored.insert(next);
            }
        }
        search.edges.pop();
        expansion.block(ctx, &assignment);
        if search.refuted(ctx) {
            return false;
        }
    }
    false
}

/// A loop back to `pos` is accepting if every until obligation of the revisited state is
/// discharged somewhere along the loop, including the closing edge.
fn loop_accepts(ctx: &Context, search: &SearchContext, pos: usize) -> bool {
    let mut discharged = IndexSet::new();
    for step in &search.edges[pos..] {
        discharged.extend(step.discharged_markers(ctx).into_iter());
    }
    ctx.conjuncts(search.path[pos])
        .into_iter()
        .filter(|c| matches!(ctx.get(*c), Formula::Until(_, _)))
        .all(|u| discharged.contains(&ctx.marker_of(u)))
}

/// When every obligation is currently discharged the search should bend back towards an
/// earlier state on the path instead of drifting through ever new states. The hint is a
/// disjunction of next-variable profiles, one per reachable earlier state, and is consumed
/// by the next selection.
fn set_hint(ctx: &mut Context, search: &mut SearchContext, options: &CheckerOptions) {
    if !search.obligations.is_empty() || !search.root_has_until {
        return;
    }
    search.hint_attempts += 1;
    if search.hint_attempts > options.max_hint_attempts {
        return;
    }
    let state = *search.path.last().unwrap();
    let flat = flatten(ctx, state);
    let nexts = collect_nexts(ctx, flat);
    search.satisfied_pos = search.next_satisfied_pos;
    search.next_satisfied_pos = search.path.len() - 1;
    let mut hint: Option<FormulaRef> = None;
    for ii in (0..=search.satisfied_pos.min(search.path.len() - 1)).rev() {
        let target = search.path[ii];
        if let Some(profile) = steer_to(ctx, target, &nexts) {
            hint = Some(match hint {
                None => profile,
                Some(prev) => ctx.or(prev, profile),
            });
        }
    }
    search.next_wanted = hint;
}

/// All `X f` variables of a flattened formula, skipping those wrapping a `G` payload since
/// globals persist without steering.
fn collect_nexts(ctx: &Context, flat: FormulaRef) -> IndexSet<FormulaRef> {
    let mut out = IndexSet::new();
    let mut todo = vec![flat];
    let mut seen = IndexSet::new();
    while let Some(cur) = todo.pop() {
        if !seen.insert(cur) {
            continue;
        }
        match *ctx.get(cur) {
            Formula::Next(inner) => {
                if !ctx.is_global(inner) {
                    out.insert(cur);
                }
            }
            Formula::Not(a) => todo.push(a),
            Formula::And(a, b) | Formula::Or(a, b) => {
                todo.push(a);
                todo.push(b);
            }
            _ => {}
        }
    }
    out
}

/// The next-variable profile that makes `target` the successor: require the next variable
/// of every conjunct of `target`, forbid all others. `None` if some conjunct of `target`
/// cannot be produced by the available next variables.
fn steer_to(
    ctx: &mut Context,
    target: FormulaRef,
    nexts: &IndexSet<FormulaRef>,
) -> Option<FormulaRef> {
    let mut wanted = IndexSet::new();
    for c in ctx.conjuncts(target) {
        let nx = ctx.next(c);
        if nexts.contains(&nx) {
            wanted.insert(nx);
        } else if ctx.is_global(c) {
            continue;
        } else if ctx.is_literal(c) {
            wanted.insert(nx);
        } else {
            return None;
        }
    }
    let mut unwanted = Vec::new();
    for nx in nexts.iter() {
        if !wanted.contains(nx) {
            unwanted.push(ctx.not(*nx));
        }
    }
    let want = ctx.and_set(wanted);
    let forbid = ctx.and_set(unwanted);
    Some(ctx.and(want, forbid))
}

/// Assembles the lasso from the recorded edges: everything before the loop start is the
/// prefix, the rest (including the loop closing edge) repeats forever.
fn build_witness(search: &SearchContext) -> Witness {
    let split = search.loop_start.unwrap_or(search.edges.len());
    Witness {
        prefix: search.edges[..split].to_vec(),
        cycle: search.edges[split..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_str(ctx: &mut Context, e: FormulaRef) -> CheckResult {
        check(ctx, e, &CheckerOptions::default())
    }

    #[test]
    fn propositional_formulas() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        assert!(check_str(&mut ctx, a).is_sat());
        let contradiction = ctx.and(a, not_a);
        assert!(!check_str(&mut ctx, contradiction).is_sat());
    }

    #[test]
    fn witness_of_a_literal_is_a_single_step() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let CheckResult::Sat(witness) = check_str(&mut ctx, a) else {
            panic!("`a` is satisfiable");
        };
        assert_eq!(witness.prefix.len(), 1);
        assert!(witness.cycle.is_empty());
        assert_eq!(witness.prefix[0].value(a), Some(true));
    }

    #[test]
    fn hint_steers_back_to_visited_states() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let fa = ctx.eventually(a);
        let gfa = ctx.globally(fa);
        // G F a only terminates quickly because the hint bends the path back on itself
        let CheckResult::Sat(witness) = check_str(&mut ctx, gfa) else {
            panic!("G F a is satisfiable");
        };
        assert!(!witness.cycle.is_empty(), "G F a needs a lasso");
    }
}
