// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ltl::{Assignment, FormulaRef};
use indexmap::IndexMap;

/// Per node bookkeeping during an invariant episode.
#[derive(Debug, Clone, Default)]
struct Node {
    /// strongest unsatisfiable core attached to this state so far
    core: Option<FormulaRef>,
    /// first recorded way to reach this state
    incoming: Option<(Assignment, FormulaRef)>,
}

/// Transition graph built while pursuing an unsat invariant. Records for every visited
/// state its strongest core and the first edge that reached it, so that once the pursuit
/// breaks through, the path back to the episode root can be replayed.
#[derive(Debug, Clone, Default)]
pub struct TransitionGraph {
    nodes: IndexMap<FormulaRef, Node>,
}

impl TransitionGraph {
    pub fn contains(&self, state: FormulaRef) -> bool {
        self.nodes.contains_key(&state)
    }

    /// Attaches (or replaces) the core of `state`, keeping any recorded incoming edge.
    pub fn record_core(&mut self, state: FormulaRef, core: FormulaRef) {
        self.nodes.entry(state).or_default().core = Some(core);
    }

    /// Records that `assignment` leads from `from` to `to`. The first recorded edge into
    /// a state wins, later ones are ignored.
    pub fn record_transition(&mut self, from: FormulaRef, assignment: Assignment, to: FormulaRef) {
        let node = self.nodes.entry(to).or_default();
        if node.incoming.is_none() {
            node.incoming = Some((assignment, from));
        }
    }

    /// Snapshot of all states that carry a core, in insertion order.
    pub fn states_with_cores(&self) -> Vec<(FormulaRef, FormulaRef)> {
        self.nodes
            .iter()
            .filter_map(|(state, node)| node.core.map(|core| (*state, core)))
            .collect()
    }

    /// Walks incoming edges from `target` back to `root` and pushes the steps onto
    /// `witness` so that popping them yields the forward path starting at `root`.
    /// Panics if the chain of incoming edges is broken.
    pub fn replay(
        &self,
        target: FormulaRef,
        root: FormulaRef,
        witness: &mut Vec<(Assignment, FormulaRef)>,
    ) {
        let mut cur = target;
        while cur != root {
            let node = self
                .nodes
                .get(&cur)
                .expect("replayed state was never recorded");
            let (assignment, from) = node
                .incoming
                .as_ref()
                .expect("replayed state has no incoming edge");
            witness.push((assignment.clone(), cur));
            cur = *from;
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ltl::Context;

    #[test]
    fn first_incoming_edge_wins() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let c = ctx.ap("c");
        let mut graph = TransitionGraph::default();
        assert!(!graph.contains(c));
        graph.record_transition(a, Assignment::default(), c);
        graph.record_transition(b, Assignment::default(), c);
        assert!(graph.contains(c));
        let mut witness = Vec::new();
        graph.replay(c, a, &mut witness);
        assert_eq!(witness.len(), 1);
        assert_eq!(witness[0].1, c);
    }

    #[test]
    fn replay_walks_back_to_root() {
        let mut ctx = Context::default();
        let s0 = ctx.ap("s0");
        let s1 = ctx.ap("s1");
        let s2 = ctx.ap("s2");
        let mut graph = TransitionGraph::default();
        graph.record_transition(s0, Assignment::default(), s1);
        graph.record_transition(s1, Assignment::default(), s2);
        let mut witness = Vec::new();
        graph.replay(s2, s0, &mut witness);
        // popped in order this yields the forward steps s0 -> s1 -> s2
        assert_eq!(witness.pop().map(|(_, s)| s), Some(s1));
        assert_eq!(witness.pop().map(|(_, s)| s), Some(s2));
    }

    #[test]
    fn cores_can_be_strengthened() {
        let mut ctx = Context::default();
        let s = ctx.ap("s");
        let c1 = ctx.ap("c1");
        let c2 = ctx.ap("c2");
        let mut graph = TransitionGraph::default();
        graph.record_core(s, c1);
        graph.record_core(s, c2);
        assert_eq!(graph.states_with_cores(), vec![(s, c2)]);
    }

    #[test]
    #[should_panic(expected = "no incoming edge")]
    fn replay_panics_on_missing_edge() {
        let mut ctx = Context::default();
        let s0 = ctx.ap("s0");
        let s1 = ctx.ap("s1");
        let mut graph = TransitionGraph::default();
        graph.record_core(s1, s0);
        let mut witness = Vec::new();
        graph.replay(s1, s0, &mut witness);
    }
}
