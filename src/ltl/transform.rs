// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ltl::{Context, Formula, FormulaRef};

/// Rewrites `e` into negation normal form, pushing negations down to the atoms.
pub fn nnf(ctx: &mut Context, e: FormulaRef) -> FormulaRef {
    nnf_rec(ctx, e, false)
}

fn nnf_rec(ctx: &mut Context, e: FormulaRef, negate: bool) -> FormulaRef {
    match *ctx.get(e) {
        Formula::True => {
            if negate {
                ctx.fals()
            } else {
                ctx.tru()
            }
        }
        Formula::False => {
            if negate {
                ctx.tru()
            } else {
                ctx.fals()
            }
        }
        Formula::Atom(_) => {
            if negate {
                ctx.not(e)
            } else {
                e
            }
        }
        Formula::Not(inner) => nnf_rec(ctx, inner, !negate),
        Formula::And(a, b) => {
            let a = nnf_rec(ctx, a, negate);
            let b = nnf_rec(ctx, b, negate);
            if negate {
                ctx.or(a, b)
            } else {
                ctx.and(a, b)
            }
        }
        Formula::Or(a, b) => {
            let a = nnf_rec(ctx, a, negate);
            let b = nnf_rec(ctx, b, negate);
            if negate {
                ctx.and(a, b)
            } else {
                ctx.or(a, b)
            }
        }
        Formula::Next(inner) => {
            let inner = nnf_rec(ctx, inner, negate);
            ctx.next(inner)
        }
        Formula::Until(a, b) => {
            let a = nnf_rec(ctx, a, negate);
            let b = nnf_rec(ctx, b, negate);
            if negate {
                ctx.release(a, b)
            } else {
                ctx.until(a, b)
            }
        }
        Formula::Release(a, b) => {
            let a = nnf_rec(ctx, a, negate);
            let b = nnf_rec(ctx, b, negate);
            if negate {
                ctx.until(a, b)
            } else {
                ctx.release(a, b)
            }
        }
    }
}

/// Pushes `X` below conjunctions and disjunctions so that next operators only wrap
/// temporal or literal payloads. `X X f` collapses into a distributed inner formula
/// with every top-level piece wrapped twice.
pub fn distribute_next(ctx: &mut Context, e: FormulaRef) -> FormulaRef {
    match *ctx.get(e) {
        Formula::Next(inner) => match *ctx.get(inner) {
            Formula::And(a, b) => {
                let na = ctx.next(a);
                let nb = ctx.next(b);
                let a = distribute_next(ctx, na);
                let b = distribute_next(ctx, nb);
                ctx.and(a, b)
            }
            Formula::Or(a, b) => {
                let na = ctx.next(a);
                let nb = ctx.next(b);
                let a = distribute_next(ctx, na);
                let b = distribute_next(ctx, nb);
                ctx.or(a, b)
            }
            Formula::Next(_) => {
                let inner = distribute_next(ctx, inner);
                apply_next(ctx, inner)
            }
            _ => {
                let inner = distribute_next(ctx, inner);
                ctx.next(inner)
            }
        },
        Formula::And(a, b) => {
            let a = distribute_next(ctx, a);
            let b = distribute_next(ctx, b);
            ctx.and(a, b)
        }
        Formula::Or(a, b) => {
            let a = distribute_next(ctx, a);
            let b = distribute_next(ctx, b);
            ctx.or(a, b)
        }
        Formula::Not(inner) => {
            let inner = distribute_next(ctx, inner);
            ctx.not(inner)
        }
        Formula::Until(a, b) => {
            let a = distribute_next(ctx, a);
            let b = distribute_next(ctx, b);
            ctx.until(a, b)
        }
        Formula::Release(a, b) => {
            let a = distribute_next(ctx, a);
            let b = distribute_next(ctx, b);
            ctx.release(a, b)
        }
        _ => e,
    }
}

/// Wraps `e` in a next operator, distributing over conjunctions and disjunctions.
pub fn apply_next(ctx: &mut Context, e: FormulaRef) -> FormulaRef {
    match *ctx.get(e) {
        Formula::And(a, b) => {
            let a = apply_next(ctx, a);
            let b = apply_next(ctx, b);
            ctx.and(a, b)
        }
        Formula::Or(a, b) => {
            let a = apply_next(ctx, a);
            let b = apply_next(ctx, b);
            ctx.or(a, b)
        }
        _ => ctx.next(e),
    }
}

/// `!X(e)` with the next operator distributed, used for avoid terms and core exclusions.
pub fn negated_next(ctx: &mut Context, e: FormulaRef) -> FormulaRef {
    let nx = apply_next(ctx, e);
    ctx.not(nx)
}

/// One-step expansion. Temporal operators unroll once:
///
///   flatten(a U b) = (flatten(b) & m) | (flatten(a) & !m & X(a U b))
///   flatten(a R b) = flatten(b) & (flatten(a) | X(a R b))
///
/// where `m` is the obligation marker of the until node. The negated marker on the
/// continuation branch ensures a true marker always signals a genuine discharge.
/// Next operators stay opaque. Results are memoized in the context.
pub fn flatten(ctx: &mut Context, e: FormulaRef) -> FormulaRef {
    if let Some(&cached) = ctx.flat_cache.get(&e) {
        return cached;
    }
    let result = match *ctx.get(e) {
        Formula::True | Formula::False | Formula::Atom(_) | Formula::Next(_) => e,
        Formula::Not(inner) => {
            let inner = flatten(ctx, inner);
            ctx.not(inner)
        }
        Formula::And(a, b) => {
            let a = flatten(ctx, a);
            let b = flatten(ctx, b);
            ctx.and(a, b)
        }
        Formula::Or(a, b) => {
            let a = flatten(ctx, a);
            let b = flatten(ctx, b);
            ctx.or(a, b)
        }
        Formula::Until(a, b) => {
            let m = ctx.marker_of(e);
            let fa = flatten(ctx, a);
            let fb = flatten(ctx, b);
            let xe = ctx.next(e);
            let not_m = ctx.not(m);
            let discharge = ctx.and(fb, m);
            let continuation = ctx.and_set([fa, not_m, xe]);
            ctx.or(discharge, continuation)
        }
        Formula::Release(a, b) => {
            let fa = flatten(ctx, a);
            let fb = flatten(ctx, b);
            let xe = ctx.next(e);
            let keep = ctx.or(fa, xe);
            ctx.and(fb, keep)
        }
    };
    ctx.flat_cache.insert(e, result);
    result
}
