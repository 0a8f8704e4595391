// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ltl::Assignment;

/// Verdict of a satisfiability check. A satisfiable formula comes with a lasso shaped
/// witness trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Sat(Witness),
    Unsat,
}

impl CheckResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, CheckResult::Sat(_))
    }
}

/// An infinite trace in finite form: the `prefix` steps followed by the `cycle` steps
/// repeated forever. A formula satisfied by a purely propositional model has an empty
/// cycle, the trace ends in a state with no remaining constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness {
    pub prefix: Vec<Assignment>,
    pub cycle: Vec<Assignment>,
}

impl Witness {
    pub fn len(&self) -> usize {
        self.prefix.len() + self.cycle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.cycle.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CheckerOptions {
    /// How often the search may arm the loop closing hint before giving up on steering.
    pub max_hint_attempts: u32,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            max_hint_attempts: 10,
        }
    }
}
