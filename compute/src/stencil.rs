//! Per-point finite difference stencils
//!
//! At every grid point, the diffusion tensor is rescaled to grid units and
//! decomposed by Selling's algorithm into `K` offsets with nonnegative
//! coefficients. Each offset is then resolved, in the forward and backward
//! direction, into the linear buffer index of the neighbor it points to, or
//! into the [`OUTSIDE`] sentinel if that neighbor lies outside of the grid.
//! Dropping such neighbors amounts to Neumann boundary conditions.

use crate::selling::{self, Decomposition};
use data::{
    field::{Region, TensorField},
    tensor::SymmetricTensor,
    Offset, Precision,
};
use std::fmt::Debug;

/// Buffer index of neighbors that lie outside of the grid
pub const OUTSIDE: usize = usize::MAX;

/// Finite difference stencil of a single grid point
///
/// `targets[k]` holds the buffer indices of the forward (`x + offset`) and
/// backward (`x - offset`) neighbors associated with the `k`-th offset, both
/// of which share the coefficient `coefficients[k]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilEntry<const K: usize> {
    /// Forward and backward neighbor buffer indices, or [`OUTSIDE`]
    pub targets: [[usize; 2]; K],

    /// Nonnegative coefficient of each forward/backward neighbor pair
    pub coefficients: [Precision; K],
}

/// Read access to a grid point's stencil, whatever the grid dimension
pub trait Stencil: Copy + Debug + Send + Sync {
    /// Iterate over in-grid neighbors as (buffer index, coefficient) pairs
    fn edges(&self) -> impl Iterator<Item = (usize, Precision)> + '_;
}
//
impl<const K: usize> Stencil for StencilEntry<K> {
    #[inline]
    fn edges(&self) -> impl Iterator<Item = (usize, Precision)> + '_ {
        self.targets
            .iter()
            .zip(&self.coefficients)
            .flat_map(|(targets, &coefficient)| {
                targets
                    .iter()
                    .filter(|&&target| target != OUTSIDE)
                    .map(move |&target| (target, coefficient))
            })
    }
}

/// Grid dimension marker
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Lattice<const D: usize>;

/// Grid dimensions for which the stencil construction is implemented
pub trait Discretize<const D: usize> {
    /// Stencil of a single grid point
    type Stencil: Stencil;

    /// Decompose a grid-rescaled tensor, then resolve the offsets with
    /// `resolve`, which maps an offset to its forward/backward buffer indices
    fn stencil(
        tensor: &SymmetricTensor<D>,
        resolve: impl FnMut(&Offset<D>) -> [usize; 2],
    ) -> Self::Stencil;
}
//
impl Discretize<2> for Lattice<2> {
    type Stencil = StencilEntry<3>;

    fn stencil(
        tensor: &SymmetricTensor<2>,
        resolve: impl FnMut(&Offset<2>) -> [usize; 2],
    ) -> StencilEntry<3> {
        resolved(selling::decompose_2d(tensor), resolve)
    }
}
//
impl Discretize<3> for Lattice<3> {
    type Stencil = StencilEntry<6>;

    fn stencil(
        tensor: &SymmetricTensor<3>,
        resolve: impl FnMut(&Offset<3>) -> [usize; 2],
    ) -> StencilEntry<6> {
        resolved(selling::decompose_3d(tensor), resolve)
    }
}

/// Stencil type of a grid of dimension `D`
pub type StencilOf<const D: usize> = <Lattice<D> as Discretize<D>>::Stencil;

fn resolved<const D: usize, const K: usize>(
    Decomposition {
        offsets,
        coefficients,
    }: Decomposition<D, K>,
    mut resolve: impl FnMut(&Offset<D>) -> [usize; 2],
) -> StencilEntry<K> {
    StencilEntry {
        targets: offsets.map(|offset| resolve(&offset)),
        coefficients,
    }
}

/// Computes the stencil of grid points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilBuilder<const D: usize> {
    /// Grid geometry
    region: Region<D>,

    /// Inverse grid spacing
    inv_spacing: [Precision; D],
}
//
impl<const D: usize> StencilBuilder<D>
where
    Lattice<D>: Discretize<D>,
{
    /// Prepare to compute the stencils of a certain tensor field
    pub fn new(tensors: &TensorField<D>) -> Self {
        Self {
            region: *tensors.region(),
            inv_spacing: tensors.spacing().map(|spacing| 1.0 / spacing),
        }
    }

    /// Compute the stencil of the grid point at coordinates `x`, given its
    /// diffusion tensor in physical units
    pub fn build(&self, tensor: &SymmetricTensor<D>, x: &[usize; D]) -> StencilOf<D> {
        let rescaled = tensor.rescaled(&self.inv_spacing);
        Lattice::<D>::stencil(&rescaled, |offset| {
            let backward = offset.map(|coord| -coord);
            [offset, &backward].map(|offset| {
                self.region
                    .displaced_index(x, offset)
                    .unwrap_or(OUTSIDE)
            })
        })
    }

    /// Compute the stencils of all grid points, in linear buffer order
    pub fn build_all(&self, tensors: &TensorField<D>) -> Vec<StencilOf<D>> {
        assert_eq!(tensors.region(), &self.region, "Grid should not change");
        let tensors = tensors.as_slice();
        crate::map::collect_points(self.region.len(), |index| {
            self.build(&tensors[index], &self.region.coordinates(index))
        })
    }
}
