//! Explicit Euler time stepping
//!
//! One time step computes `next = prev - time_step * A * prev`, where `A` is
//! the discrete diffusion operator. It is split into two passes:
//!
//! - The off-diagonal pass scatters each stencil edge's contribution to both
//!   of its endpoints. Each edge writes to another point's storage, so this
//!   pass is sequential.
//! - The diagonal pass blends the previous value of each point with what the
//!   off-diagonal pass gathered. This pass is point-independent.

use crate::stencil::Stencil;
use data::{field::ScalarField, Precision};

/// Pair of fields where one acts as an input and the other as an output
#[derive(Clone, Debug, PartialEq)]
pub struct Evolving<const D: usize>([ScalarField<D>; 2]);
//
impl<const D: usize> Evolving<D> {
    /// Start from some initial field
    pub fn new(initial: ScalarField<D>) -> Self {
        Self([initial.clone(), initial])
    }

    /// Access the input field
    pub fn input(&self) -> &ScalarField<D> {
        &self.0[0]
    }

    /// Access the input and output field
    pub fn inout(&mut self) -> (&ScalarField<D>, &mut ScalarField<D>) {
        let [input, output] = &mut self.0;
        (input, output)
    }

    /// Make the output field become the input one
    pub fn flip(&mut self) {
        let [input, output] = &mut self.0;
        std::mem::swap(input, output);
    }

    /// Extract the input field
    pub fn into_input(self) -> ScalarField<D> {
        let [input, _output] = self.0;
        input
    }
}

/// Scatter the off-diagonal part of the operator into `scratch`
///
/// Afterwards, `scratch[x]` holds the sum, over all stencil edges touching `x`,
/// of the edge coefficient times the previous value at the other endpoint.
pub fn apply_off_diagonal<S: Stencil>(stencils: &[S], prev: &[Precision], scratch: &mut [Precision]) {
    debug_assert_eq!(stencils.len(), prev.len());
    debug_assert_eq!(scratch.len(), prev.len());
    scratch.fill(0.0);
    for (x, stencil) in stencils.iter().enumerate() {
        for (y, coefficient) in stencil.edges() {
            scratch[y] += coefficient * prev[x];
            scratch[x] += coefficient * prev[y];
        }
    }
}

/// Turn the off-diagonal contributions from `apply_off_diagonal` into the
/// values at the next time step
pub fn blend_diagonal(
    diagonal: &[Precision],
    time_step: Precision,
    prev: &[Precision],
    next: &mut [Precision],
) {
    debug_assert_eq!(diagonal.len(), prev.len());
    debug_assert_eq!(next.len(), prev.len());
    crate::map::update_points(next, |x, next| {
        *next = *next * time_step + prev[x] * (1.0 - time_step * diagonal[x]);
    });
}

/// Perform one time step, reading `prev` and writing `next`
pub fn step<S: Stencil>(
    stencils: &[S],
    diagonal: &[Precision],
    time_step: Precision,
    prev: &[Precision],
    next: &mut [Precision],
) {
    apply_off_diagonal(stencils, prev, next);
    blend_diagonal(diagonal, time_step, prev, next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagonal,
        schedule,
        stencil::{StencilBuilder, StencilOf},
    };
    use data::{field::TensorField, tensor::SymmetricTensor};
    use proptest::prelude::*;

    fn operator(tensors: &TensorField<2>) -> (Vec<StencilOf<2>>, Vec<Precision>) {
        let stencils = StencilBuilder::new(tensors).build_all(tensors);
        let diagonal = diagonal::accumulate(&stencils);
        (stencils, diagonal)
    }

    fn hot_point(time_step: Precision) -> ScalarField<2> {
        let shape = [5, 5];
        let tensors = TensorField::from_elem(shape, [1.0; 2], SymmetricTensor::identity()).unwrap();
        let (stencils, diagonal) = operator(&tensors);
        let mut initial = ScalarField::from_elem(shape, [1.0; 2], 0.0).unwrap();
        *initial.get_mut([2, 2]) = 1.0;
        let mut evolving = Evolving::new(initial);
        let (input, output) = evolving.inout();
        step(
            &stencils,
            &diagonal,
            time_step,
            input.as_slice(),
            output.as_mut_slice(),
        );
        evolving.flip();
        evolving.into_input()
    }

    #[test]
    fn hot_point_spreads() {
        let next = hot_point(0.25);
        assert_eq!(*next.get([2, 2]), 0.0);
        for neighbor in [[1, 2], [3, 2], [2, 1], [2, 3]] {
            assert_eq!(*next.get(neighbor), 0.25);
        }
        assert_eq!(*next.get([1, 1]), 0.0);
        assert_eq!(next.as_slice().iter().sum::<Precision>(), 1.0);
    }

    #[test]
    fn unstable_step_overshoots() {
        let next = hot_point(1.1 * 0.25);
        assert!((*next.get([2, 2]) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn flip_swaps_roles() {
        let a = ScalarField::from_elem([2, 3], [1.0; 2], 1.0).unwrap();
        let mut evolving = Evolving::new(a.clone());
        let (input, output) = evolving.inout();
        assert_eq!(input, &a);
        output.as_mut_slice().fill(2.0);
        evolving.flip();
        assert!(evolving.input().as_slice().iter().all(|&value| value == 2.0));
    }

    fn anisotropic_problem() -> impl Strategy<Value = (TensorField<2>, Vec<Precision>)> {
        (2usize..8, 2usize..8).prop_flat_map(|(rows, cols)| {
            let len = rows * cols;
            (
                prop::collection::vec(
                    (-1.0..1.0, -1.0..1.0, 0.1..10.0, 0.1..10.0),
                    len,
                ),
                prop::collection::vec(0.0..1.0, len),
            )
                .prop_map(move |(tensors, values)| {
                    let mut tensors = tensors.into_iter();
                    let tensors = TensorField::from_fn([rows, cols], [1.0, 0.5], |_| {
                        let (x, y, along, across) = tensors.next().unwrap();
                        SymmetricTensor::from_principal_axis([x, y], along, across)
                    })
                    .unwrap();
                    (tensors, values)
                })
        })
    }

    proptest! {
        #[test]
        fn mass_is_conserved(
            (tensors, prev) in anisotropic_problem(),
            time_step in 0.0..10.0,
        ) {
            let (stencils, diagonal) = operator(&tensors);
            let mut next = vec![0.0; prev.len()];
            step(&stencils, &diagonal, time_step, &prev, &mut next);
            let before: Precision = prev.iter().sum();
            let after: Precision = next.iter().sum();
            let scale = next.iter().map(|value| value.abs()).sum::<Precision>().max(1.0);
            prop_assert!((after - before).abs() <= 1e-9 * scale);
        }

        #[test]
        fn maximum_principle(
            (tensors, prev) in anisotropic_problem(),
            ratio in 0.01..=1.0,
        ) {
            let (stencils, diagonal) = operator(&tensors);
            let time_step = ratio * schedule::max_stable_time_step(&diagonal);
            let mut next = vec![0.0; prev.len()];
            step(&stencils, &diagonal, time_step, &prev, &mut next);
            let min = prev.iter().copied().fold(Precision::INFINITY, Precision::min);
            let max = prev.iter().copied().fold(Precision::NEG_INFINITY, Precision::max);
            for value in next {
                prop_assert!(value >= min - 1e-12 && value <= max + 1e-12);
            }
        }
    }
}
