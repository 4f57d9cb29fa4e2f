//! Synthetic diffusion problem, used when no input data is provided
//!
//! The scalar field is a hot block, covering the central eighth of each axis,
//! in the middle of a cold domain. The tensor field makes heat flow
//! preferentially along circles around the center of the domain (in the plane
//! of the first two axes), so that the hot block gets smeared into a ring
//! instead of a blob.

use crate::{
    field::{FieldError, ScalarField, TensorField},
    tensor::SymmetricTensor,
    Precision,
};

/// Fraction of each axis covered by the hot block
const HOT_RANGE: [usize; 2] = [7, 9];

/// Denominator of `HOT_RANGE`
const FRAC: usize = 16;

/// Hot block in the middle of a cold domain
pub fn hot_block<const D: usize>(
    shape: [usize; D],
    spacing: [Precision; D],
) -> Result<ScalarField<D>, FieldError> {
    // Make sure the block covers at least one point on each axis
    let hot_range = shape.map(|len| {
        let [start, end] = HOT_RANGE.map(|bound| len * bound / FRAC);
        start..end.max(start + 1)
    });
    ScalarField::from_fn(shape, spacing, |x| {
        let inside = x.iter().zip(&hot_range).all(|(coord, range)| range.contains(coord));
        if inside {
            1.0
        } else {
            0.0
        }
    })
}

/// Diffusion tensors that favor circular motion around the domain center
///
/// Diffusivity is 1 along circles and `1 / anisotropy` across them, where
/// `anisotropy` is expected to be at least 1. Distances are measured in
/// physical units, so the circles stay round on anisotropic grids.
pub fn swirl<const D: usize>(
    shape: [usize; D],
    spacing: [Precision; D],
    anisotropy: Precision,
) -> Result<TensorField<D>, FieldError> {
    assert!(D >= 2, "Circular motion needs at least two dimensions");
    assert!(anisotropy >= 1.0, "Anisotropy ratio should be at least 1");
    let center: [Precision; D] =
        std::array::from_fn(|axis| (shape[axis] as Precision - 1.0) * spacing[axis] / 2.0);
    TensorField::from_fn(shape, spacing, |x| {
        let r: [Precision; D] =
            std::array::from_fn(|axis| x[axis] as Precision * spacing[axis] - center[axis]);
        let mut tangent = [0.0; D];
        tangent[0] = -r[1];
        tangent[1] = r[0];
        SymmetricTensor::from_principal_axis(tangent, 1.0, 1.0 / anisotropy)
    })
}
