// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-level coincidence analysis.
//!
//! Given a table of Boolean observations and a hierarchy of factors grouped into levels, this crate
//! derives minimally necessary and sufficient relations (`A*B + ~C <-> E`) and assembles them into
//! acyclic causal models. Relations among factors on the same level are causal; relations from
//! one level into the next are constitutive.
//!
//! The entry point is [`analysis::Analysis`].

pub mod analysis;
pub mod assembler;
pub mod classify;
pub mod cluster;
pub mod coextensive;
pub mod config;
pub mod cover;
pub mod cube;
pub mod errors;
pub mod factor;
pub mod formula;
pub mod hierarchy;
pub mod logic_function;
pub mod minimizer;
pub mod ordering;
#[cfg(any(test, feature = "proptest1"))]
pub mod proptest_helpers;
pub mod suspension;
pub mod table;
