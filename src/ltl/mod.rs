// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod context;
mod expr;
mod sat;
mod serialize;
mod transform;

pub use context::{Context, FormulaRef, StringRef};
pub use expr::Formula;
pub use sat::{progress, propositional_sat, Assignment};
pub use serialize::SerializableFormula;
pub use transform::{apply_next, distribute_next, flatten, negated_next, nnf};
