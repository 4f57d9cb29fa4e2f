//! Regular-grid fields
//!
//! A field is an ndarray of values, one per grid point, along with the
//! physical spacing between grid points on each axis. Fields are always kept
//! in standard (row-major) layout so that grid points can be addressed by a
//! linear buffer index, which is what the diffusion stencils store.

use crate::{tensor::SymmetricTensor, Offset, Precision};
use ndarray::{Array, ArrayD, ArrayViewD, Dimension, IxDyn};
use thiserror::Error;

/// Scalar quantity that is subjected to diffusion
pub type ScalarField<const D: usize> = Field<Precision, D>;

/// Diffusion tensor field
pub type TensorField<const D: usize> = Field<SymmetricTensor<D>, D>;

/// Shape of a regular grid and mapping between coordinates and buffer indices
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Region<const D: usize> {
    /// Number of grid points along each axis
    shape: [usize; D],

    /// Distance between consecutive points of each axis in the linear buffer
    strides: [usize; D],
}
//
impl<const D: usize> Region<D> {
    /// Region covering a full grid of a certain shape
    pub fn new(shape: [usize; D]) -> Self {
        let mut strides = [1; D];
        for axis in (0..D.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Self { shape, strides }
    }

    /// Number of grid points along each axis
    pub fn shape(&self) -> [usize; D] {
        self.shape
    }

    /// Total number of grid points
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Truth that the region contains no grid point
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truth that a (possibly out-of-bounds) coordinate lies within the region
    pub fn contains(&self, x: &Offset<D>) -> bool {
        x.iter()
            .zip(&self.shape)
            .all(|(&coord, &len)| coord >= 0 && (coord as usize) < len)
    }

    /// Linear buffer index of an in-region grid point
    #[inline]
    pub fn linear_index(&self, x: &[usize; D]) -> usize {
        debug_assert!(x.iter().zip(&self.shape).all(|(coord, len)| coord < len));
        x.iter().zip(&self.strides).map(|(coord, stride)| coord * stride).sum()
    }

    /// Grid coordinates of a linear buffer index
    #[inline]
    pub fn coordinates(&self, mut index: usize) -> [usize; D] {
        debug_assert!(index < self.len());
        std::array::from_fn(|axis| {
            let coord = index / self.strides[axis];
            index %= self.strides[axis];
            coord
        })
    }

    /// Linear buffer index of `x + offset`, if that point lies in the region
    #[inline]
    pub fn displaced_index(&self, x: &[usize; D], offset: &Offset<D>) -> Option<usize> {
        let y: Offset<D> = std::array::from_fn(|axis| x[axis] as isize + offset[axis]);
        self.contains(&y)
            .then(|| self.linear_index(&y.map(|coord| coord as usize)))
    }

    /// Iterate over grid coordinates in linear buffer order
    pub fn points(&self) -> impl Iterator<Item = [usize; D]> + '_ {
        (0..self.len()).map(|index| self.coordinates(index))
    }
}

/// Values on a regular grid of dimension `D`, with a physical spacing per axis
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T, const D: usize> {
    /// Values, in standard layout
    values: ArrayD<T>,

    /// Grid geometry
    region: Region<D>,

    /// Physical distance between grid points on each axis
    spacing: [Precision; D],
}
//
impl<T, const D: usize> Field<T, D> {
    /// Wrap an array of values with the physical spacing of its grid
    ///
    /// The array must have `D` axes, and spacings must be finite and positive.
    pub fn new<Sh: Dimension>(values: Array<T, Sh>, spacing: [Precision; D]) -> Result<Self, FieldError>
    where
        T: Clone,
    {
        let values = values.into_dyn();
        if values.ndim() != D {
            return Err(FieldError::Dimensionality {
                expected: D,
                actual: values.ndim(),
            });
        }
        check_spacing(&spacing)?;
        let values = if values.is_standard_layout() {
            values
        } else {
            values.as_standard_layout().into_owned()
        };
        let region = Region::new(std::array::from_fn(|axis| values.shape()[axis]));
        Ok(Self {
            values,
            region,
            spacing,
        })
    }

    /// Field where every grid point has the same value
    pub fn from_elem(shape: [usize; D], spacing: [Precision; D], value: T) -> Result<Self, FieldError>
    where
        T: Clone,
    {
        check_spacing(&spacing)?;
        Ok(Self {
            values: ArrayD::from_elem(IxDyn(&shape), value),
            region: Region::new(shape),
            spacing,
        })
    }

    /// Field whose value at each grid point is computed from its coordinates
    pub fn from_fn(
        shape: [usize; D],
        spacing: [Precision; D],
        mut value: impl FnMut([usize; D]) -> T,
    ) -> Result<Self, FieldError> {
        check_spacing(&spacing)?;
        let region = Region::new(shape);
        let values = region.points().map(&mut value).collect::<Vec<_>>();
        Ok(Self {
            values: ArrayD::from_shape_vec(IxDyn(&shape), values)
                .expect("Number of values should match grid shape"),
            region,
            spacing,
        })
    }

    /// Apply a function to every value of the field
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Field<U, D> {
        Field {
            values: self.values.map(f),
            region: self.region,
            spacing: self.spacing,
        }
    }

    /// Grid geometry
    pub fn region(&self) -> &Region<D> {
        &self.region
    }

    /// Number of grid points along each axis
    pub fn shape(&self) -> [usize; D] {
        self.region.shape()
    }

    /// Physical distance between grid points on each axis
    pub fn spacing(&self) -> [Precision; D] {
        self.spacing
    }

    /// Truth that two fields live on the same grid
    pub fn same_grid<U>(&self, other: &Field<U, D>) -> bool {
        self.region == other.region && self.spacing == other.spacing
    }

    /// View of the values as an ndarray
    pub fn values(&self) -> ArrayViewD<'_, T> {
        self.values.view()
    }

    /// Values in linear buffer order
    pub fn as_slice(&self) -> &[T] {
        self.values
            .as_slice()
            .expect("Fields are always in standard layout")
    }

    /// Mutable values in linear buffer order
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.values
            .as_slice_mut()
            .expect("Fields are always in standard layout")
    }

    /// Value at some grid coordinates
    pub fn get(&self, x: [usize; D]) -> &T {
        &self.as_slice()[self.region.linear_index(&x)]
    }

    /// Mutable value at some grid coordinates
    pub fn get_mut(&mut self, x: [usize; D]) -> &mut T {
        let index = self.region.linear_index(&x);
        &mut self.as_mut_slice()[index]
    }
}

/// Check that grid spacings are usable
fn check_spacing<const D: usize>(spacing: &[Precision; D]) -> Result<(), FieldError> {
    for (axis, &spacing) in spacing.iter().enumerate() {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(FieldError::Spacing { axis, spacing });
        }
    }
    Ok(())
}

/// Things that can go wrong when setting up a field
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum FieldError {
    /// Array has the wrong number of axes
    #[error("expected a {expected}D array, got a {actual}D one")]
    Dimensionality { expected: usize, actual: usize },

    /// Grid spacing is not finite and positive
    #[error("grid spacing {spacing} of axis {axis} should be finite and positive")]
    Spacing { axis: usize, spacing: Precision },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, ShapeBuilder};
    use proptest::prelude::*;

    #[test]
    fn region_indexing() {
        let region = Region::new([3, 4, 5]);
        assert_eq!(region.len(), 60);
        assert_eq!(region.linear_index(&[0, 0, 1]), 1);
        assert_eq!(region.linear_index(&[0, 1, 0]), 5);
        assert_eq!(region.linear_index(&[1, 0, 0]), 20);
        for (index, x) in region.points().enumerate() {
            assert_eq!(region.linear_index(&x), index);
            assert_eq!(region.coordinates(index), x);
        }
    }

    #[test]
    fn region_displacement() {
        let region = Region::new([3, 3]);
        assert_eq!(region.displaced_index(&[1, 1], &[1, -1]), Some(6));
        assert_eq!(region.displaced_index(&[0, 1], &[-1, 0]), None);
        assert_eq!(region.displaced_index(&[2, 2], &[0, 1]), None);
        assert_eq!(region.displaced_index(&[2, 2], &[-2, -2]), Some(0));
        assert!(!Region::new([0, 3]).contains(&[0, 0]));
    }

    #[test]
    fn field_construction() {
        let values = Array2::from_shape_fn((2, 3).f(), |(i, j)| (3 * i + j) as Precision);
        let field = ScalarField::<2>::new(values, [1.0, 0.5]).unwrap();
        assert_eq!(field.shape(), [2, 3]);
        assert_eq!(field.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(*field.get([1, 2]), 5.0);

        assert_eq!(
            ScalarField::<3>::new(Array2::<Precision>::zeros((2, 2)), [1.0; 3]),
            Err(FieldError::Dimensionality {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            ScalarField::<2>::from_elem([2, 2], [1.0, 0.0], 0.0),
            Err(FieldError::Spacing {
                axis: 1,
                spacing: 0.0
            })
        );
    }

    #[test]
    fn field_geometry() {
        let field = ScalarField::<2>::from_fn([2, 2], [1.0, 2.0], |[i, j]| (i + j) as Precision)
            .unwrap();
        let tensors = field.map(|_| SymmetricTensor::<2>::identity());
        assert!(field.same_grid(&tensors));
        let other = ScalarField::<2>::from_elem([2, 2], [1.0, 1.0], 0.0).unwrap();
        assert!(!field.same_grid(&other));
    }

    proptest! {
        #[test]
        fn coordinates_roundtrip(
            (shape, index) in prop::array::uniform3(1usize..8)
                .prop_flat_map(|shape| (Just(shape), 0..shape.iter().product::<usize>())),
        ) {
            let region = Region::new(shape);
            let x = region.coordinates(index);
            prop_assert!(x.iter().zip(&shape).all(|(coord, len)| coord < len));
            prop_assert_eq!(region.linear_index(&x), index);
        }

        #[test]
        fn displacement_matches_coordinates(
            (shape, x) in prop::array::uniform2(1usize..6)
                .prop_flat_map(|shape| (Just(shape), (0..shape[0], 0..shape[1]))),
            offset in prop::array::uniform2(-6isize..=6),
        ) {
            let region = Region::new(shape);
            let x = [x.0, x.1];
            let target = [0, 1].map(|axis| x[axis] as isize + offset[axis]);
            match region.displaced_index(&x, &offset) {
                Some(index) => {
                    prop_assert!(region.contains(&target));
                    prop_assert_eq!(region.coordinates(index).map(|coord| coord as isize), target);
                }
                None => prop_assert!(!region.contains(&target)),
            }
        }
    }
}
