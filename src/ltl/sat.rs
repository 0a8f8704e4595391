// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ltl::{flatten, Context, Formula, FormulaRef};
use indexmap::IndexMap;
use smallvec::SmallVec;

/// Result of evaluating a formula under a partial assignment.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Eval {
    Known(bool),
    /// carries the first undetermined variable encountered
    Unknown(FormulaRef),
}

/// A satisfying partial assignment over the variables of a flattened formula. Variables are
/// atoms (including obligation markers) and opaque `X f` nodes. Only decided variables are
/// recorded, everything else is don't care.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    values: IndexMap<FormulaRef, bool>,
}

impl Assignment {
    pub fn value(&self, var: FormulaRef) -> Option<bool> {
        self.values.get(&var).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Obligation markers decided true by this assignment.
    pub fn discharged_markers(&self, ctx: &Context) -> SmallVec<[FormulaRef; 4]> {
        self.values
            .iter()
            .filter(|(var, value)| **value && ctx.is_marker(**var))
            .map(|(var, _)| *var)
            .collect()
    }

    /// The successor state: the conjunction of the payloads of all `X f` variables decided
    /// true. `true` if no next variable was decided true.
    pub fn successor(&self, ctx: &mut Context) -> FormulaRef {
        let mut nexts = Vec::new();
        for (var, value) in self.values.iter() {
            if *value {
                if let Formula::Next(inner) = *ctx.get(*var) {
                    nexts.push(inner);
                }
            }
        }
        ctx.and_set(nexts)
    }

    /// The conjunction of all decided variables with their polarity. Used to block this
    /// assignment when enumerating alternatives.
    pub fn cube(&self, ctx: &mut Context) -> FormulaRef {
        let mut literals = Vec::with_capacity(self.values.len());
        for (var, value) in self.values.iter() {
            if *value {
                literals.push(*var);
            } else {
                literals.push(ctx.not(*var));
            }
        }
        ctx.and_set(literals)
    }

    /// The decided atoms visible to the user, i.e. markers filtered out.
    pub fn atoms<'a>(&self, ctx: &'a Context) -> Vec<(&'a str, bool)> {
        let mut out = Vec::new();
        for (var, value) in self.values.iter() {
            if let Formula::Atom(name) = *ctx.get(*var) {
                if !ctx.is_marker(*var) {
                    out.push((ctx.get_str(name), *value));
                }
            }
        }
        out
    }
}

/// Evaluates `e` under a partial assignment with short circuiting. Atoms and next operators
/// are the variables, until and release nodes must have been expanded away.
fn eval(ctx: &Context, e: FormulaRef, values: &IndexMap<FormulaRef, bool>) -> Eval {
    match *ctx.get(e) {
        Formula::True => Eval::Known(true),
        Formula::False => Eval::Known(false),
        Formula::Atom(_) | Formula::Next(_) => match values.get(&e) {
            Some(value) => Eval::Known(*value),
            None => Eval::Unknown(e),
        },
        Formula::Not(inner) => match eval(ctx, inner, values) {
            Eval::Known(value) => Eval::Known(!value),
            unknown => unknown,
        },
        Formula::And(a, b) => match eval(ctx, a, values) {
            Eval::Known(false) => Eval::Known(false),
            Eval::Known(true) => eval(ctx, b, values),
            Eval::Unknown(var) => match eval(ctx, b, values) {
                Eval::Known(false) => Eval::Known(false),
                _ => Eval::Unknown(var),
            },
        },
        Formula::Or(a, b) => match eval(ctx, a, values) {
            Eval::Known(true) => Eval::Known(true),
            Eval::Known(false) => eval(ctx, b, values),
            Eval::Unknown(var) => match eval(ctx, b, values) {
                Eval::Known(true) => Eval::Known(true),
                _ => Eval::Unknown(var),
            },
        },
        Formula::Until(_, _) | Formula::Release(_, _) => {
            unreachable!("propositional evaluation requires a flattened formula")
        }
    }
}

/// Backtracking search for a satisfying partial assignment of a propositional abstraction.
/// Decides the first undetermined variable reported by evaluation, trying `false` first so
/// that obligation markers and next variables are only set when the formula demands it.
pub fn propositional_sat(ctx: &Context, e: FormulaRef) -> Option<Assignment> {
    let mut values: IndexMap<FormulaRef, bool> = IndexMap::new();
    // trail entries record whether the decision was already flipped to its second phase
    let mut trail: Vec<(FormulaRef, bool)> = Vec::new();
    loop {
        match eval(ctx, e, &values) {
            Eval::Known(true) => return Some(Assignment { values }),
            Eval::Known(false) => loop {
                match trail.pop() {
                    None => return None,
                    Some((var, flipped)) => {
                        if flipped {
                            values.swap_remove(&var);
                        } else {
                            values.insert(var, true);
                            trail.push((var, true));
                            break;
                        }
                    }
                }
            },
            Eval::Unknown(var) => {
                values.insert(var, false);
                trail.push((var, false));
            }
        }
    }
}

/// Checks that `assignment` satisfies the one-step expansion of `state` and, if so, returns
/// the successor state it induces. Used to validate witness traces.
pub fn progress(
    ctx: &mut Context,
    state: FormulaRef,
    assignment: &Assignment,
) -> Option<FormulaRef> {
    let flat = flatten(ctx, state);
    match eval(ctx, flat, &assignment.values) {
        Eval::Known(true) => Some(assignment.successor(ctx)),
        _ => None,
    }
}
