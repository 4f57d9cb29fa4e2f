//! Selling's lattice basis reduction
//!
//! A superbase of a lattice of dimension `D` is a set of `D + 1` integer
//! vectors that sum to zero and span the lattice. It is obtuse with respect to
//! a positive definite tensor `M` if `⟨M·e_i, e_j⟩ <= 0` for all `i != j`.
//! Selling's algorithm turns any superbase into an obtuse one by repeatedly
//! fixing non-obtuse pairs. From an obtuse superbase, one can derive a
//! decomposition `M = Σ_k λ_k e_k e_kᵀ` with nonnegative weights `λ_k` and
//! integer offsets `e_k`, which is exactly what a monotone finite difference
//! stencil for `div(M∇u)` needs.
//!
//! Stencil coefficients below are half the weights `λ_k`, because every
//! stencil edge is visited from both of its endpoints during time stepping.

use crate::scalar_product::scalar_product;
use data::{tensor::SymmetricTensor, Offset, Precision};

/// Maximal number of reduction steps before we give up on obtuseness
pub const MAX_ITERATIONS: usize = 200;

/// Relative round-off tolerance on negative stencil coefficients
///
/// Stencil coefficients that are negative by less than this fraction of the
/// largest tensor coefficient are flushed to zero, anything more negative is
/// treated as a bug.
pub const NEGATIVE_TOLERANCE: Precision = 1e-9;

/// Outcome of Selling's algorithm
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Superbase<const D: usize, const N: usize> {
    /// Superbase vectors
    pub vectors: [Offset<D>; N],

    /// Truth that an obtuse superbase was reached
    pub converged: bool,
}

/// Offsets and coefficients of a stencil, before boundary handling
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decomposition<const D: usize, const K: usize> {
    /// Stencil offsets, to be used in both the forward and backward direction
    pub offsets: [Offset<D>; K],

    /// Nonnegative coefficient associated with each offset
    pub coefficients: [Precision; K],
}

/// Make the canonical 2D superbase obtuse
pub fn obtuse_superbase_2d(tensor: &SymmetricTensor<2>, max_iterations: usize) -> Superbase<2, 3> {
    reduce(tensor, [[1, 0], [0, 1], [-1, -1]], max_iterations, |sb, i, j| {
        let (u, v) = (sb[i], sb[j]);
        *sb = [sub(&v, &u), u, neg(&v)];
    })
}

/// Make the canonical 3D superbase obtuse
pub fn obtuse_superbase_3d(tensor: &SymmetricTensor<3>, max_iterations: usize) -> Superbase<3, 4> {
    let canonical = [[1, 0, 0], [0, 1, 0], [0, 0, 1], [-1, -1, -1]];
    reduce(tensor, canonical, max_iterations, |sb, i, j| {
        let (u, v) = (sb[i], sb[j]);
        let mut shifted = [[0; 3]; 2];
        for (slot, k) in shifted.iter_mut().zip((0..4).filter(|&k| k != i && k != j)) {
            *slot = add(&sb[k], &u);
        }
        *sb = [shifted[0], shifted[1], neg(&u), v];
    })
}

/// 2D stencil of a (grid-rescaled) diffusion tensor
pub fn decompose_2d(tensor: &SymmetricTensor<2>) -> Decomposition<2, 3> {
    let Superbase {
        vectors: sb,
        converged,
    } = checked_superbase(tensor, obtuse_superbase_2d);
    let coefficients = std::array::from_fn(|i| {
        -0.5 * scalar_product(tensor, &sb[(i + 1) % 3], &sb[(i + 2) % 3])
    });
    let offsets = sb.map(|e| [-e[1], e[0]]);
    Decomposition {
        offsets,
        coefficients: checked_coefficients(tensor, converged, coefficients),
    }
}

/// 3D stencil of a (grid-rescaled) diffusion tensor
pub fn decompose_3d(tensor: &SymmetricTensor<3>) -> Decomposition<3, 6> {
    let Superbase {
        vectors: sb,
        converged,
    } = checked_superbase(tensor, obtuse_superbase_3d);
    let weight = |i: usize, j: usize| -0.5 * scalar_product(tensor, &sb[i], &sb[j]);

    // Primary offsets are the rows of the comatrix of the first three vectors
    let primary: [Offset<3>; 3] = std::array::from_fn(|i| {
        std::array::from_fn(|j| {
            let (i1, i2, j1, j2) = ((i + 1) % 3, (i + 2) % 3, (j + 1) % 3, (j + 2) % 3);
            sb[i1][j1] * sb[i2][j2] - sb[i2][j1] * sb[i1][j2]
        })
    });
    let offsets = [
        primary[0],
        primary[1],
        primary[2],
        sub(&primary[0], &primary[1]),
        sub(&primary[0], &primary[2]),
        sub(&primary[1], &primary[2]),
    ];
    let coefficients = [
        weight(0, 3),
        weight(1, 3),
        weight(2, 3),
        weight(0, 1),
        weight(0, 2),
        weight(1, 2),
    ];
    Decomposition {
        offsets,
        coefficients: checked_coefficients(tensor, converged, coefficients),
    }
}

/// Run Selling's algorithm
///
/// `step` replaces the superbase given a non-obtuse pair of indices `(i, j)`
/// with `j < i`.
fn reduce<const D: usize, const N: usize>(
    tensor: &SymmetricTensor<D>,
    mut vectors: [Offset<D>; N],
    max_iterations: usize,
    mut step: impl FnMut(&mut [Offset<D>; N], usize, usize),
) -> Superbase<D, N> {
    for _ in 0..max_iterations {
        match non_obtuse_pair(tensor, &vectors) {
            Some((i, j)) => step(&mut vectors, i, j),
            None => {
                return Superbase {
                    vectors,
                    converged: true,
                }
            }
        }
    }
    Superbase {
        vectors,
        converged: false,
    }
}

/// Find the first pair of superbase vectors with a positive scalar product
fn non_obtuse_pair<const D: usize, const N: usize>(
    tensor: &SymmetricTensor<D>,
    vectors: &[Offset<D>; N],
) -> Option<(usize, usize)> {
    (1..N)
        .flat_map(|i| (0..i).map(move |j| (i, j)))
        .find(|&(i, j)| scalar_product(tensor, &vectors[i], &vectors[j]) > 0.0)
}

/// Run Selling's algorithm, warning if it does not stabilize
fn checked_superbase<const D: usize, const N: usize>(
    tensor: &SymmetricTensor<D>,
    reduce: impl FnOnce(&SymmetricTensor<D>, usize) -> Superbase<D, N>,
) -> Superbase<D, N> {
    let superbase = reduce(tensor, MAX_ITERATIONS);
    if !superbase.converged {
        log::warn!(
            "Selling's algorithm not stabilized after {MAX_ITERATIONS} iterations \
            for tensor {tensor:?}, using superbase {:?} anyway",
            superbase.vectors
        );
    }
    superbase
}

/// Check that stencil coefficients are nonnegative, up to round-off errors
///
/// `converged` tells whether Selling's algorithm reached an obtuse superbase.
/// If it did not, negative coefficients are expected even for valid tensors.
fn checked_coefficients<const D: usize, const K: usize>(
    tensor: &SymmetricTensor<D>,
    converged: bool,
    coefficients: [Precision; K],
) -> [Precision; K] {
    let tolerance = NEGATIVE_TOLERANCE * tensor.max_abs();
    coefficients.map(|coefficient| {
        if converged {
            assert!(
                coefficient >= -tolerance,
                "Negative stencil coefficient {coefficient} for tensor {tensor:?}, \
                is this tensor positive semi-definite?"
            );
        } else {
            assert!(
                coefficient >= -tolerance,
                "Negative stencil coefficient {coefficient} for tensor {tensor:?}, \
                Selling's algorithm did not converge within {MAX_ITERATIONS} iterations"
            );
        }
        coefficient.max(0.0)
    })
}

fn add<const D: usize>(u: &Offset<D>, v: &Offset<D>) -> Offset<D> {
    std::array::from_fn(|i| u[i] + v[i])
}

fn sub<const D: usize>(u: &Offset<D>, v: &Offset<D>) -> Offset<D> {
    std::array::from_fn(|i| u[i] - v[i])
}

fn neg<const D: usize>(u: &Offset<D>) -> Offset<D> {
    u.map(|x| -x)
}
