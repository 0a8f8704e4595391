// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ltl::expr::Formula;
use std::fmt::{Debug, Formatter};
use std::num::{NonZeroU16, NonZeroU32};

#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct StringRef(NonZeroU16);

impl Debug for StringRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringRef({})", self.index())
    }
}

impl StringRef {
    fn from_index(index: usize) -> Self {
        Self(NonZeroU16::new((index + 1) as u16).unwrap())
    }

    fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct FormulaRef(NonZeroU32);

impl Debug for FormulaRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // we need a custom implementation in order to show the zero based index
        write!(f, "FormulaRef({})", self.index())
    }
}

impl FormulaRef {
    pub(crate) fn from_index(index: usize) -> Self {
        FormulaRef(NonZeroU32::new((index + 1) as u32).unwrap())
    }

    pub(crate) fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Context which is used to create all LTL formulas. Formulas are interned such that
/// reference equivalence implies structural equivalence.
#[derive(Clone)]
pub struct Context {
    strings: indexmap::IndexSet<String>,
    formulas: indexmap::IndexSet<Formula>,
    /// until node -> obligation marker atom
    markers: indexmap::IndexMap<FormulaRef, FormulaRef>,
    /// obligation marker atom -> until node
    marker_untils: indexmap::IndexMap<FormulaRef, FormulaRef>,
    /// memoized one-step expansions
    pub(crate) flat_cache: indexmap::IndexMap<FormulaRef, FormulaRef>,
    tru: FormulaRef,
    fals: FormulaRef,
}

impl Default for Context {
    fn default() -> Self {
        let mut formulas = indexmap::IndexSet::new();
        let (tru_index, _) = formulas.insert_full(Formula::True);
        let (fals_index, _) = formulas.insert_full(Formula::False);
        Self {
            strings: indexmap::IndexSet::new(),
            formulas,
            markers: indexmap::IndexMap::new(),
            marker_untils: indexmap::IndexMap::new(),
            flat_cache: indexmap::IndexMap::new(),
            tru: FormulaRef::from_index(tru_index),
            fals: FormulaRef::from_index(fals_index),
        }
    }
}

impl Context {
    /// ensures that the name is unique (by appending a number if necessary) and then adds it to the store
    pub(crate) fn add_unique_str(&mut self, value: &str) -> StringRef {
        let mut name: String = value.to_string();
        let mut count: usize = 0;
        while self.is_interned(&name) {
            name = format!("{value}_{count}");
            count += 1;
        }
        self.string(name.into())
    }

    fn is_interned(&self, value: &str) -> bool {
        self.strings.get(value).is_some()
    }
}

/// Adding and retrieving nodes.
impl Context {
    pub fn get(&self, reference: FormulaRef) -> &Formula {
        self.formulas
            .get_index((reference.0.get() as usize) - 1)
            .expect("Invalid FormulaRef!")
    }

    pub(crate) fn add_formula(&mut self, value: Formula) -> FormulaRef {
        let (index, _) = self.formulas.insert_full(value);
        FormulaRef::from_index(index)
    }

    pub(crate) fn get_str(&self, reference: StringRef) -> &str {
        self.strings
            .get_index((reference.0.get() as usize) - 1)
            .expect("Invalid StringRef!")
    }

    pub(crate) fn string(&mut self, value: std::borrow::Cow<str>) -> StringRef {
        if let Some(index) = self.strings.get_index_of(value.as_ref()) {
            StringRef::from_index(index)
        } else {
            let (index, _) = self.strings.insert_full(value.into_owned());
            StringRef::from_index(index)
        }
    }
}

/// Convenience methods to construct formula nodes. All constructors fold constants so that
/// e.g. `and(a, fals)` yields the interned `false` node instead of a fresh conjunction.
impl Context {
    pub fn tru(&self) -> FormulaRef {
        self.tru
    }

    pub fn fals(&self) -> FormulaRef {
        self.fals
    }

    pub fn ap(&mut self, name: &str) -> FormulaRef {
        let name_ref = self.string(name.into());
        self.add_formula(Formula::Atom(name_ref))
    }

    pub fn not(&mut self, e: FormulaRef) -> FormulaRef {
        match *self.get(e) {
            Formula::True => self.fals,
            Formula::False => self.tru,
            Formula::Not(inner) => inner,
            _ => self.add_formula(Formula::Not(e)),
        }
    }

    pub fn next(&mut self, e: FormulaRef) -> FormulaRef {
        match *self.get(e) {
            Formula::True => self.tru,
            Formula::False => self.fals,
            _ => self.add_formula(Formula::Next(e)),
        }
    }

    pub fn and(&mut self, a: FormulaRef, b: FormulaRef) -> FormulaRef {
        self.and_set([a, b])
    }

    pub fn or(&mut self, a: FormulaRef, b: FormulaRef) -> FormulaRef {
        self.or_set([a, b])
    }

    /// Builds a canonical conjunction: conjuncts are flattened, deduplicated and sorted by
    /// node id, so that set-equal conjunctions intern to the identical node.
    pub fn and_set(&mut self, items: impl IntoIterator<Item = FormulaRef>) -> FormulaRef {
        let mut todo: Vec<FormulaRef> = items.into_iter().collect();
        let mut set = indexmap::IndexSet::new();
        while let Some(e) = todo.pop() {
            match *self.get(e) {
                Formula::And(a, b) => {
                    todo.push(a);
                    todo.push(b);
                }
                Formula::True => {}
                Formula::False => return self.fals,
                _ => {
                    set.insert(e);
                }
            }
        }
        for e in set.iter() {
            if let Formula::Not(inner) = self.get(*e) {
                if set.contains(inner) {
                    return self.fals;
                }
            }
        }
        let mut elements: Vec<FormulaRef> = set.into_iter().collect();
        elements.sort_unstable();
        self.build_chain(&elements, true)
    }

    /// Dual of [`Context::and_set`].
    pub fn or_set(&mut self, items: impl IntoIterator<Item = FormulaRef>) -> FormulaRef {
        let mut todo: Vec<FormulaRef> = items.into_iter().collect();
        let mut set = indexmap::IndexSet::new();
        while let Some(e) = todo.pop() {
            match *self.get(e) {
                Formula::Or(a, b) => {
                    todo.push(a);
                    todo.push(b);
                }
                Formula::False => {}
                Formula::True => return self.tru,
                _ => {
                    set.insert(e);
                }
            }
        }
        for e in set.iter() {
            if let Formula::Not(inner) = self.get(*e) {
                if set.contains(inner) {
                    return self.tru;
                }
            }
        }
        let mut elements: Vec<FormulaRef> = set.into_iter().collect();
        elements.sort_unstable();
        self.build_chain(&elements, false)
    }

    fn build_chain(&mut self, elements: &[FormulaRef], conjunction: bool) -> FormulaRef {
        match elements {
            [] => {
                if conjunction {
                    self.tru
                } else {
                    self.fals
                }
            }
            [single] => *single,
            _ => {
                let mut acc = *elements.last().unwrap();
                for e in elements[..elements.len() - 1].iter().rev() {
                    let node = if conjunction {
                        Formula::And(*e, acc)
                    } else {
                        Formula::Or(*e, acc)
                    };
                    acc = self.add_formula(node);
                }
                acc
            }
        }
    }

    pub fn until(&mut self, a: FormulaRef, b: FormulaRef) -> FormulaRef {
        match (*self.get(a), *self.get(b)) {
            (_, Formula::True) => self.tru,
            (_, Formula::False) => self.fals,
            (Formula::False, _) => b,
            _ => {
                let u = self.add_formula(Formula::Until(a, b));
                if !self.markers.contains_key(&u) {
                    let name = format!("__u{}", u.index());
                    let name_ref = self.add_unique_str(&name);
                    let marker = self.add_formula(Formula::Atom(name_ref));
                    self.markers.insert(u, marker);
                    self.marker_untils.insert(marker, u);
                }
                u
            }
        }
    }

    pub fn release(&mut self, a: FormulaRef, b: FormulaRef) -> FormulaRef {
        match (*self.get(a), *self.get(b)) {
            (_, Formula::True) => self.tru,
            (_, Formula::False) => self.fals,
            (Formula::True, _) => b,
            _ => self.add_formula(Formula::Release(a, b)),
        }
    }

    pub fn globally(&mut self, e: FormulaRef) -> FormulaRef {
        let fals = self.fals;
        self.release(fals, e)
    }

    pub fn eventually(&mut self, e: FormulaRef) -> FormulaRef {
        let tru = self.tru;
        self.until(tru, e)
    }

    pub fn implies(&mut self, a: FormulaRef, b: FormulaRef) -> FormulaRef {
        let not_a = self.not(a);
        self.or(not_a, b)
    }
}

/// Obligation marker bookkeeping. Every interned until node owns a fresh marker atom
/// which the one-step expansion uses to make eventuality progress observable.
impl Context {
    pub fn marker_of(&self, until: FormulaRef) -> FormulaRef {
        *self
            .markers
            .get(&until)
            .expect("until nodes always carry a marker")
    }

    pub fn until_of_marker(&self, marker: FormulaRef) -> FormulaRef {
        *self
            .marker_untils
            .get(&marker)
            .expect("not a marker atom")
    }

    pub fn is_marker(&self, e: FormulaRef) -> bool {
        self.marker_untils.contains_key(&e)
    }
}
