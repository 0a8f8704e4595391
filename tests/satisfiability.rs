// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use sibyl::check::{check, CheckResult, CheckerOptions};
use sibyl::ltl::{Context, FormulaRef};

fn verdict(build: impl FnOnce(&mut Context) -> FormulaRef) -> CheckResult {
    let mut ctx = Context::default();
    let f = build(&mut ctx);
    check(&mut ctx, f, &CheckerOptions::default())
}

#[test]
fn propositional() {
    assert!(verdict(|ctx| ctx.ap("a")).is_sat());
    assert!(!verdict(|ctx| {
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        ctx.and(a, not_a)
    })
    .is_sat());
    assert!(verdict(|ctx| ctx.tru()).is_sat());
    assert!(!verdict(|ctx| ctx.fals()).is_sat());
}

#[test]
fn simple_until() {
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        ctx.until(a, b)
    })
    .is_sat());
}

#[test]
fn nested_until() {
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let c = ctx.ap("c");
        let inner = ctx.until(b, c);
        ctx.until(a, inner)
    })
    .is_sat());
}

#[test]
fn contradictory_globals() {
    // both G conjuncts constrain the very first step, the expansion collapses and the
    // empty core refutes the query
    assert!(!verdict(|ctx| {
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        let ga = ctx.globally(a);
        let gna = ctx.globally(not_a);
        ctx.and(ga, gna)
    })
    .is_sat());
}

#[test]
fn trapped_until() {
    assert!(!verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let not_b = ctx.not(b);
        let u = ctx.until(a, b);
        let g = ctx.globally(not_b);
        ctx.and(u, g)
    })
    .is_sat());
}

#[test]
fn trapped_eventually() {
    assert!(!verdict(|ctx| {
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        let fa = ctx.eventually(a);
        let g = ctx.globally(not_a);
        ctx.and(fa, g)
    })
    .is_sat());
}

#[test]
fn recurring_eventuality() {
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let fa = ctx.eventually(a);
        ctx.globally(fa)
    })
    .is_sat());
}

#[test]
fn recurring_until() {
    // `G (a U b)` has a lasso whose every period discharges the until
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let u = ctx.until(a, b);
        ctx.globally(u)
    })
    .is_sat());
    // with `G !b` the only candidate lasso keeps the until pending forever and must
    // not be accepted
    assert!(!verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let u = ctx.until(a, b);
        let gu = ctx.globally(u);
        let not_b = ctx.not(b);
        let gnb = ctx.globally(not_b);
        ctx.and(gu, gnb)
    })
    .is_sat());
}

#[test]
fn shared_dead_successor() {
    // both branches step into the same doomed state, rejecting it once settles the
    // whole query
    assert!(!verdict(|ctx| {
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        let p = ctx.ap("p");
        let q = ctx.ap("q");
        let u = ctx.until(p, q);
        let not_q = ctx.not(q);
        let gnq = ctx.globally(not_q);
        let doomed = ctx.and(u, gnq);
        let step = ctx.next(doomed);
        let left = ctx.and(not_a, step);
        let right = ctx.and(a, step);
        ctx.or(left, right)
    })
    .is_sat());
}

#[test]
fn alternating_protocol() {
    // G (a -> X b) & G (b -> X a) & a has the alternating trace (a b)^w
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let xb = ctx.next(b);
        let xa = ctx.next(a);
        let ab = ctx.implies(a, xb);
        let ba = ctx.implies(b, xa);
        let g1 = ctx.globally(ab);
        let g2 = ctx.globally(ba);
        let gs = ctx.and(g1, g2);
        ctx.and(gs, a)
    })
    .is_sat());
}

#[test]
fn independent_obligations() {
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let c = ctx.ap("c");
        let d = ctx.ap("d");
        let u1 = ctx.until(a, b);
        let u2 = ctx.until(c, d);
        ctx.and(u1, u2)
    })
    .is_sat());
}

#[test]
fn negated_input_is_normalized() {
    // !(F a) = G !a is satisfiable, !(G a | G !a) = F !a & F a as well
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let fa = ctx.eventually(a);
        ctx.not(fa)
    })
    .is_sat());
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        let ga = ctx.globally(a);
        let gna = ctx.globally(not_a);
        let either = ctx.or(ga, gna);
        ctx.not(either)
    })
    .is_sat());
}

#[test]
fn next_constraints() {
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let xb = ctx.next(b);
        ctx.and(a, xb)
    })
    .is_sat());
    // X a & X !a asks the successor for both polarities
    assert!(!verdict(|ctx| {
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        let xa = ctx.next(a);
        let xna = ctx.next(not_a);
        ctx.and(xa, xna)
    })
    .is_sat());
}

#[test]
fn eventuality_with_delay() {
    // b is forbidden now but forced one step later
    assert!(verdict(|ctx| {
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let not_b = ctx.not(b);
        let xb = ctx.next(b);
        let u = ctx.until(a, b);
        ctx.and_set([u, not_b, xb])
    })
    .is_sat());
}

#[test]
fn sequential_queries_are_independent() {
    let mut ctx = Context::default();
    let a = ctx.ap("a");
    let b = ctx.ap("b");
    let not_b = ctx.not(b);
    let u = ctx.until(a, b);
    let g = ctx.globally(not_b);
    let trapped = ctx.and(u, g);
    let options = CheckerOptions::default();
    assert!(!check(&mut ctx, trapped, &options).is_sat());
    // knowledge learned while refuting the first query must not leak into the second
    assert!(check(&mut ctx, u, &options).is_sat());
    assert!(!check(&mut ctx, trapped, &options).is_sat());
}
