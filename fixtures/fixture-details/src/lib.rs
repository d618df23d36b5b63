// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures for exercising causal analyses: known scenarios and seeded random structures.

mod all;
mod details;
mod value_generator;

pub use all::*;
pub use details::*;
pub use value_generator::*;
