// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conjunctions, DNF formulas and equivalence relations over factors.

mod display;
mod dnf;
mod equivalence;
mod parse;

pub use display::*;
pub use dnf::*;
pub use equivalence::*;
