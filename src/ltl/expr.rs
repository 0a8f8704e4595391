// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ltl::{Context, FormulaRef, StringRef};

/// Interned LTL formula node. Binary conjunctions and disjunctions form right-leaning
/// chains sorted by node id, see [`Context::and_set`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Formula {
    True,
    False,
    Atom(StringRef),
    Not(FormulaRef),
    And(FormulaRef, FormulaRef),
    Or(FormulaRef, FormulaRef),
    Next(FormulaRef),
    Until(FormulaRef, FormulaRef),
    Release(FormulaRef, FormulaRef),
}

/// Structural queries.
impl Context {
    /// Returns the top-level conjuncts of `e` in node id order.
    pub fn conjuncts(&self, e: FormulaRef) -> Vec<FormulaRef> {
        let mut out = Vec::new();
        let mut cur = e;
        while let Formula::And(a, b) = *self.get(cur) {
            out.push(a);
            cur = b;
        }
        out.push(cur);
        out
    }

    /// Returns the top-level disjuncts of `e` in node id order.
    pub fn disjuncts(&self, e: FormulaRef) -> Vec<FormulaRef> {
        let mut out = Vec::new();
        let mut cur = e;
        while let Formula::Or(a, b) = *self.get(cur) {
            out.push(a);
            cur = b;
        }
        out.push(cur);
        out
    }

    /// An atom or a negated atom.
    pub fn is_literal(&self, e: FormulaRef) -> bool {
        match *self.get(e) {
            Formula::Atom(_) => true,
            Formula::Not(inner) => matches!(self.get(inner), Formula::Atom(_)),
            _ => false,
        }
    }

    /// A `false R f` node, i.e. `G f`.
    pub fn is_global(&self, e: FormulaRef) -> bool {
        matches!(*self.get(e), Formula::Release(l, _) if l == self.fals())
    }

    pub fn has_until(&self, e: FormulaRef) -> bool {
        let mut todo = vec![e];
        let mut seen = indexmap::IndexSet::new();
        while let Some(cur) = todo.pop() {
            if !seen.insert(cur) {
                continue;
            }
            match *self.get(cur) {
                Formula::Until(_, _) => return true,
                Formula::Not(a) | Formula::Next(a) => todo.push(a),
                Formula::And(a, b) | Formula::Or(a, b) | Formula::Release(a, b) => {
                    todo.push(a);
                    todo.push(b);
                }
                _ => {}
            }
        }
        false
    }

    /// All atoms mentioned in `e`, excluding obligation markers.
    pub fn alphabet(&self, e: FormulaRef) -> Vec<FormulaRef> {
        let mut out = Vec::new();
        let mut todo = vec![e];
        let mut seen = indexmap::IndexSet::new();
        while let Some(cur) = todo.pop() {
            if !seen.insert(cur) {
                continue;
            }
            match *self.get(cur) {
                Formula::Atom(_) => {
                    if !self.is_marker(cur) {
                        out.push(cur);
                    }
                }
                Formula::Not(a) | Formula::Next(a) => todo.push(a),
                Formula::And(a, b)
                | Formula::Or(a, b)
                | Formula::Until(a, b)
                | Formula::Release(a, b) => {
                    todo.push(b);
                    todo.push(a);
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjunct_decomposition() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let c = ctx.ap("c");
        let f = ctx.and_set([c, a, b]);
        assert_eq!(ctx.conjuncts(f), vec![a, b, c]);
        assert_eq!(ctx.conjuncts(a), vec![a]);
    }

    #[test]
    fn structural_predicates() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let not_a = ctx.not(a);
        let g_a = ctx.globally(a);
        let u = ctx.until(a, not_a);
        assert!(ctx.is_literal(a));
        assert!(ctx.is_literal(not_a));
        assert!(!ctx.is_literal(g_a));
        assert!(ctx.is_global(g_a));
        assert!(!ctx.is_global(u));
        assert!(ctx.has_until(u));
        assert!(!ctx.has_until(g_a));
    }

    #[test]
    fn alphabet_skips_markers() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let u = ctx.until(a, b);
        let m = ctx.marker_of(u);
        let f = ctx.and(u, m);
        let atoms = ctx.alphabet(f);
        assert!(atoms.contains(&a));
        assert!(atoms.contains(&b));
        assert!(!atoms.contains(&m));
    }
}
