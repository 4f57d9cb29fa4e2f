//! Bilinear form associated with a diffusion tensor

use data::{tensor::SymmetricTensor, Offset, Precision};

/// Compute `⟨m·u, v⟩` for a symmetric tensor `m` and integer vectors `u`, `v`
///
/// Only the upper triangle of `m` is read.
#[inline]
pub fn scalar_product<const D: usize>(
    m: &SymmetricTensor<D>,
    u: &Offset<D>,
    v: &Offset<D>,
) -> Precision {
    let mut result = 0.0;
    for i in 0..D {
        result += m.get(i, i) * (u[i] * v[i]) as Precision;
    }
    for i in 0..D {
        for j in i + 1..D {
            result += m.get(i, j) * (u[i] * v[j] + u[j] * v[i]) as Precision;
        }
    }
    result
}
