// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::check::graph::TransitionGraph;
use crate::check::obligations;
use crate::ltl::{negated_next, Assignment, Context, FormulaRef};
use indexmap::{IndexMap, IndexSet};

/// All mutable state of one satisfiability query. The avoid formula is the only piece of
/// learned knowledge that survives an invariant episode, everything else is scoped either
/// to the episode or to the depth first search.
pub struct SearchContext {
    /// top-level `G f` conjuncts of the root, they persist in every reachable state
    pub globals: IndexSet<FormulaRef>,
    /// marker atoms of the outstanding until obligations
    pub obligations: IndexSet<FormulaRef>,
    /// the until nodes matching `obligations`
    pub obligation_untils: IndexSet<FormulaRef>,
    /// conjunction of learned avoid terms, `Some(false)` once the query is refuted
    pub avoid: Option<FormulaRef>,

    // invariant episode state
    pub potential_unsat: IndexSet<FormulaRef>,
    pub constraint_stack: Vec<FormulaRef>,
    pub graph: TransitionGraph,
    /// forward steps recovered from a successful pursuit, popped by the selector
    pub witness: Vec<(Assignment, FormulaRef)>,
    pub unsat_root: Option<FormulaRef>,

    // depth first search bookkeeping
    pub path: Vec<FormulaRef>,
    pub edges: Vec<Assignment>,
    pub on_path: IndexMap<FormulaRef, usize>,
    pub explored: IndexSet<FormulaRef>,
    pub loop_start: Option<usize>,

    // loop closing hint
    pub next_wanted: Option<FormulaRef>,
    pub satisfied_pos: usize,
    pub next_satisfied_pos: usize,
    pub hint_attempts: u32,
    pub root_has_until: bool,
}

impl SearchContext {
    pub fn new(ctx: &mut Context, root: FormulaRef) -> Self {
        let globals: IndexSet<FormulaRef> = ctx
            .conjuncts(root)
            .into_iter()
            .filter(|c| ctx.is_global(*c))
            .collect();
        let (obligations, obligation_untils) = obligations::initial(ctx, root);
        let avoid = consistency_seed(ctx, root);
        let mut on_path = IndexMap::new();
        on_path.insert(root, 0);
        Self {
            globals,
            obligations,
            obligation_untils,
            avoid,
            potential_unsat: IndexSet::new(),
            constraint_stack: Vec::new(),
            graph: TransitionGraph::default(),
            witness: Vec::new(),
            unsat_root: None,
            path: vec![root],
            edges: Vec::new(),
            on_path,
            explored: IndexSet::new(),
            loop_start: None,
            next_wanted: None,
            satisfied_pos: 0,
            next_satisfied_pos: 0,
            hint_attempts: 0,
            root_has_until: ctx.has_until(root),
        }
    }

    pub fn refuted(&self, ctx: &Context) -> bool {
        self.avoid == Some(ctx.fals())
    }

    /// Conjoins a learned term into the avoid formula. `None` refutes the query outright,
    /// `Some(core)` adds `!X(core)`.
    pub fn fold_avoid(&mut self, ctx: &mut Context, core: Option<FormulaRef>) {
        match core {
            None => self.avoid = Some(ctx.fals()),
            Some(core) => {
                let term = negated_next(ctx, core);
                self.avoid = Some(match self.avoid {
                    None => term,
                    Some(prev) => ctx.and(prev, term),
                });
            }
        }
    }

    /// `!X(c1 | c2 | ...)` over the potentially unsatisfiable cores, `None` if there are
    /// none yet.
    pub fn negated_potential(&self, ctx: &mut Context) -> Option<FormulaRef> {
        if self.potential_unsat.is_empty() {
            None
        } else {
            let ored = ctx.or_set(self.potential_unsat.iter().copied());
            Some(negated_next(ctx, ored))
        }
    }

    /// Resets all episode scoped state. The avoid formula deliberately survives.
    pub fn end_episode(&mut self) {
        self.potential_unsat.clear();
        self.constraint_stack.clear();
        self.graph.clear();
        self.unsat_root = None;
    }
}

/// Seeds the avoid formula with one consistency term per atom of the root alphabet:
/// no reachable successor may require an atom to be both true and false.
fn consistency_seed(ctx: &mut Context, root: FormulaRef) -> Option<FormulaRef> {
    let atoms = ctx.alphabet(root);
    if atoms.is_empty() {
        return None;
    }
    let mut terms = Vec::with_capacity(atoms.len());
    for atom in atoms {
        let pos = ctx.next(atom);
        let negated = ctx.not(atom);
        let neg = ctx.next(negated);
        let both = ctx.and(pos, neg);
        terms.push(ctx.not(both));
    }
    Some(ctx.and_set(terms))
}
