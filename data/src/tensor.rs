//! Symmetric diffusion tensors

use crate::Precision;

/// Symmetric matrix of dimension `D`, describing the local diffusivity
///
/// Diffusion tensors are expected to be positive semi-definite. This is not
/// checked, but the stencil construction will complain loudly if it isn't so.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymmetricTensor<const D: usize>([[Precision; D]; D]);
//
impl<const D: usize> SymmetricTensor<D> {
    /// Build a tensor from its upper triangle
    ///
    /// `coefficient(i, j)` is only queried for `i <= j`, the lower triangle is
    /// deduced by symmetry.
    pub fn from_fn(mut coefficient: impl FnMut(usize, usize) -> Precision) -> Self {
        let mut matrix = [[0.0; D]; D];
        for i in 0..D {
            for j in i..D {
                let value = coefficient(i, j);
                matrix[i][j] = value;
                matrix[j][i] = value;
            }
        }
        Self(matrix)
    }

    /// Tensor with all coefficients set to zero (no diffusion at all)
    pub fn zero() -> Self {
        Self([[0.0; D]; D])
    }

    /// Unit isotropic diffusion tensor
    pub fn identity() -> Self {
        Self::diagonal([1.0; D])
    }

    /// Diagonal tensor, i.e. axis-aligned anisotropic diffusion
    pub fn diagonal(values: [Precision; D]) -> Self {
        Self::from_fn(|i, j| if i == j { values[i] } else { 0.0 })
    }

    /// Tensor with diffusivity `along` in `direction` and `across` in the
    /// orthogonal directions
    ///
    /// A null `direction` yields the isotropic tensor of diffusivity `across`.
    pub fn from_principal_axis(direction: [Precision; D], along: Precision, across: Precision) -> Self {
        let norm = direction.iter().map(|x| x * x).sum::<Precision>().sqrt();
        if norm == 0.0 {
            return Self::diagonal([across; D]);
        }
        let n = direction.map(|x| x / norm);
        Self::from_fn(|i, j| {
            let isotropic = if i == j { across } else { 0.0 };
            isotropic + (along - across) * n[i] * n[j]
        })
    }

    /// Coefficient at row `i`, column `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Precision {
        self.0[i][j]
    }

    /// Full matrix of coefficients
    pub fn as_matrix(&self) -> &[[Precision; D]; D] {
        &self.0
    }

    /// Rescale by per-axis inverse grid spacing
    ///
    /// Diffusion tensors are homogeneous to the inverse of a squared norm, so
    /// going from physical units to grid units multiplies coefficient `(i, j)`
    /// by `inv_spacing[i] * inv_spacing[j]`.
    pub fn rescaled(&self, inv_spacing: &[Precision; D]) -> Self {
        Self::from_fn(|i, j| self.0[i][j] * inv_spacing[i] * inv_spacing[j])
    }

    /// Largest absolute coefficient, a natural scale for round-off tolerances
    pub fn max_abs(&self) -> Precision {
        self.0
            .iter()
            .flatten()
            .fold(0.0, |acc: Precision, x| acc.max(x.abs()))
    }
}
//
impl<const D: usize> Default for SymmetricTensor<D> {
    fn default() -> Self {
        Self::zero()
    }
}
