// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod driver;
mod graph;
mod invariant;
mod muc;
mod obligations;
mod search;
mod select;
mod types;

pub use driver::check;
pub use types::{CheckResult, CheckerOptions, Witness};
