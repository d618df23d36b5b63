// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::cube::Cube;
use once_cell::sync::OnceCell;
use std::collections::BTreeSet;

/// Cache for cover data.
#[derive(Clone, Debug, Default)]
pub(super) struct CoverCache {
    mentioned_inputs: OnceCell<BTreeSet<usize>>,
}

impl CoverCache {
    pub(super) fn invalidate(&mut self) {
        self.mentioned_inputs = OnceCell::new();
    }

    pub(super) fn get_or_init_mentioned_inputs(
        &self,
        elements: &BTreeSet<Cube>,
    ) -> &BTreeSet<usize> {
        self.mentioned_inputs.get_or_init(|| {
            elements
                .iter()
                .flat_map(|cube| {
                    cube.input
                        .iter()
                        .enumerate()
                        .filter_map(|(ix, c)| c.is_some().then(|| ix))
                })
                .collect()
        })
    }
}
