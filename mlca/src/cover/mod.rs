// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod caches;
mod cover_impl;
mod display;
mod petrick;
mod primes;

pub use cover_impl::*;
pub use display::*;
