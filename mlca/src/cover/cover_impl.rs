// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    cover::{CoverAlgebraicDisplay, CoverMatrixDisplay},
    cube::Cube,
    errors::InvalidCubeNumeric,
    factor::Factor,
    formula::Dnf,
};
use std::collections::BTreeSet;

use super::caches::CoverCache;

/// A set of cubes over the same variables, read as their disjunction.
#[derive(Clone, Debug, Default)]
pub struct Cover {
    elements: BTreeSet<Cube>,
    cache: CoverCache,
}

impl Cover {
    pub fn new(elements: impl IntoIterator<Item = Cube>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            cache: CoverCache::default(),
        }
    }

    pub fn from_numeric<'a>(
        numeric: impl IntoIterator<Item = &'a [u8]>,
    ) -> Result<Self, InvalidCubeNumeric> {
        let elements: BTreeSet<_> = numeric
            .into_iter()
            .map(Cube::from_numeric)
            .collect::<Result<_, _>>()?;
        Ok(Self::new(elements))
    }

    #[inline]
    pub fn cube_count(&self) -> usize {
        self.elements().len()
    }

    #[inline]
    pub fn elements(&self) -> &BTreeSet<Cube> {
        &self.elements
    }

    #[inline]
    pub fn elements_mut(&mut self) -> &mut BTreeSet<Cube> {
        self.cache.invalidate();
        &mut self.elements
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }

    /// The indexes of the variables mentioned by at least one cube.
    #[inline]
    pub fn mentioned_inputs(&self) -> &BTreeSet<usize> {
        self.cache.get_or_init_mentioned_inputs(&self.elements)
    }

    #[inline]
    pub fn matrix_display(&self) -> CoverMatrixDisplay<'_> {
        CoverMatrixDisplay::new(self)
    }

    #[inline]
    pub fn algebraic_display<'a>(&'a self, variables: &'a [Factor]) -> CoverAlgebraicDisplay<'a> {
        CoverAlgebraicDisplay::new(self, variables)
    }

    /// Returns true if some cube of this cover contains `cube`.
    pub fn covers(&self, cube: &Cube) -> bool {
        self.elements().iter().any(|elem| elem.contains(cube))
    }

    /// Returns true if some point of `cube` is one of the cubes of this cover. Used with covers of
    /// minterms.
    pub fn has_point_in(&self, cube: &Cube) -> bool {
        self.elements().iter().any(|elem| cube.contains(elem))
    }

    pub fn evaluate(&self, values: &[bool]) -> bool {
        self.elements().iter().any(|elem| elem.evaluate(values))
    }

    /// Removes cubes strictly contained in another cube of the cover.
    pub fn single_cube_containment(&self) -> Self {
        Self::new(
            self.elements()
                .iter()
                .filter(|elem| {
                    !self
                        .elements()
                        .iter()
                        .any(|other| other.strictly_contains(elem))
                })
                .cloned(),
        )
    }

    pub fn to_dnf(&self, variables: &[Factor]) -> Dnf {
        Dnf::new(
            self.elements()
                .iter()
                .map(|elem| elem.to_conjunction(variables)),
        )
    }
}

impl PartialEq for Cover {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl Eq for Cover {}

impl FromIterator<Cube> for Cover {
    fn from_iter<T: IntoIterator<Item = Cube>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cube_containment() {
        let cover = Cover::from_numeric([&[1, 2, 2][..], &[1, 1, 0], &[0, 1, 2]]).unwrap();
        let expected = Cover::from_numeric([&[1, 2, 2][..], &[0, 1, 2]]).unwrap();
        assert_eq!(cover.single_cube_containment(), expected);
    }

    #[test]
    fn test_mentioned_inputs() {
        let mut cover = Cover::from_numeric([&[1, 2, 2][..], &[2, 2, 0]]).unwrap();
        assert_eq!(
            cover.mentioned_inputs().iter().copied().collect::<Vec<_>>(),
            vec![0, 2]
        );
        cover
            .elements_mut()
            .insert(Cube::from_numeric(&[2, 1, 2]).unwrap());
        assert_eq!(cover.mentioned_inputs().len(), 3, "cache invalidated");
    }

    #[test]
    fn test_points() {
        let minterms = Cover::from_numeric([&[1, 1, 0][..], &[0, 0, 0]]).unwrap();
        assert!(minterms.has_point_in(&Cube::from_numeric(&[2, 1, 2]).unwrap()));
        assert!(!minterms.has_point_in(&Cube::from_numeric(&[1, 0, 2]).unwrap()));
        assert!(minterms.evaluate(&[false, false, false]));
    }
}
