//! Diagonal of the discrete diffusion operator
//!
//! Every stencil edge couples two grid points, and contributes its coefficient
//! to the diagonal term of both. This cannot be parallelized naively, as the
//! edges of one point's stencil write to other points' diagonal terms.

use crate::stencil::Stencil;
use data::Precision;

/// Sum, for each grid point, the coefficients of all stencil edges that touch it
pub fn accumulate<S: Stencil>(stencils: &[S]) -> Vec<Precision> {
    let mut diagonal = vec![0.0; stencils.len()];
    for (point, stencil) in stencils.iter().enumerate() {
        for (target, coefficient) in stencil.edges() {
            diagonal[point] += coefficient;
            diagonal[target] += coefficient;
        }
    }
    diagonal
}
