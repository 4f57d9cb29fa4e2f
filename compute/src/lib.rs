//! Anisotropic diffusion through lattice basis reduction
//!
//! The diffusion equation `∂u/∂t = div(D ∇u)` is discretized on a regular grid
//! by decomposing the diffusion tensor `D` of every grid point with Selling's
//! algorithm. This yields finite difference stencils with nonnegative
//! coefficients, and thus a monotone operator that explicit Euler time
//! stepping can apply without breaking the maximum principle, as long as the
//! time step stays below a bound that is derived from the operator's diagonal.
//!
//! The discrete operator only depends on the tensor field, so it is built once
//! as an [`Operator`] and can then diffuse any number of scalar fields. The
//! [`diffuse()`] function wraps the whole process for one-shot use.

mod map;
pub mod diagonal;
pub mod scalar_product;
pub mod schedule;
pub mod selling;
pub mod stencil;
pub mod update;

use crate::{
    schedule::Schedule,
    stencil::{Discretize, Lattice, StencilBuilder, StencilOf},
    update::Evolving,
};
use data::{
    field::{Region, ScalarField, TensorField},
    parameters::Parameters,
    Precision,
};
use thiserror::Error;

/// Discrete diffusion operator of a tensor field
#[derive(Clone, Debug)]
pub struct Operator<const D: usize>
where
    Lattice<D>: Discretize<D>,
{
    /// Grid geometry
    region: Region<D>,

    /// Physical distance between grid points on each axis
    spacing: [Precision; D],

    /// Stencil of each grid point, in linear buffer order
    stencils: Vec<StencilOf<D>>,

    /// Diagonal coefficient of each grid point, in linear buffer order
    diagonal: Vec<Precision>,

    /// Largest stable explicit time step
    max_stable_time_step: Precision,
}
//
impl<const D: usize> Operator<D>
where
    Lattice<D>: Discretize<D>,
{
    /// Discretize the diffusion operator of a tensor field
    pub fn new(tensors: &TensorField<D>) -> Self {
        let stencils = StencilBuilder::new(tensors).build_all(tensors);
        let diagonal = diagonal::accumulate(&stencils);
        let max_stable_time_step = schedule::max_stable_time_step(&diagonal);
        log::debug!(
            "Built {D}D diffusion operator on a {:?} grid with spacing {:?}, \
            max stable time step is {max_stable_time_step}",
            tensors.shape(),
            tensors.spacing()
        );
        Self {
            region: *tensors.region(),
            spacing: tensors.spacing(),
            stencils,
            diagonal,
            max_stable_time_step,
        }
    }

    /// Grid geometry
    pub fn region(&self) -> &Region<D> {
        &self.region
    }

    /// Physical distance between grid points on each axis
    pub fn spacing(&self) -> [Precision; D] {
        self.spacing
    }

    /// Stencil of each grid point, in linear buffer order
    pub fn stencils(&self) -> &[StencilOf<D>] {
        &self.stencils
    }

    /// Diagonal coefficient of each grid point, in linear buffer order
    pub fn diagonal(&self) -> &[Precision] {
        &self.diagonal
    }

    /// Largest time step for which explicit time stepping is stable
    ///
    /// Infinite if the operator is identically zero.
    pub fn max_stable_time_step(&self) -> Precision {
        self.max_stable_time_step
    }

    /// Plan a diffusion run
    pub fn schedule(&self, params: &Parameters) -> Schedule {
        Schedule::new(self.max_stable_time_step, params)
    }

    /// Perform one time step, from the input to the output field of `fields`
    ///
    /// As with any explicit scheme, `time_step` should not exceed
    /// [`max_stable_time_step()`](Self::max_stable_time_step), or else the
    /// result may be unstable.
    pub fn step(&self, time_step: Precision, fields: &mut Evolving<D>) {
        let (input, output) = fields.inout();
        assert!(
            input.region() == &self.region && output.region() == &self.region,
            "Fields should live on the operator's grid"
        );
        update::step(
            &self.stencils,
            &self.diagonal,
            time_step,
            input.as_slice(),
            output.as_mut_slice(),
        );
    }

    /// Diffuse a scalar field for the diffusion time specified by `params`
    pub fn run(&self, field: ScalarField<D>, params: &Parameters) -> Result<Diffused<D>, Error> {
        self.run_with_progress(field, params, || {})
    }

    /// Like [`run()`](Self::run), but calls `on_step` after every time step
    pub fn run_with_progress(
        &self,
        field: ScalarField<D>,
        params: &Parameters,
        mut on_step: impl FnMut(),
    ) -> Result<Diffused<D>, Error> {
        self.check_grid(&field)?;
        let schedule = self.schedule(params);
        let mut fields = Evolving::new(field);
        for step in 0..schedule.num_steps {
            log::trace!("Performing time step {}/{}", step + 1, schedule.num_steps);
            self.step(schedule.time_step, &mut fields);
            fields.flip();
            on_step();
        }
        Ok(Diffused {
            field: fields.into_input(),
            effective_diffusion_time: schedule.effective_diffusion_time,
            effective_number_of_time_steps: schedule.num_steps,
        })
    }

    /// Check that a scalar field lives on the same grid as this operator
    fn check_grid(&self, field: &ScalarField<D>) -> Result<(), Error> {
        if field.region() == &self.region && field.spacing() == self.spacing {
            Ok(())
        } else {
            Err(Error::GridMismatch {
                field_shape: field.shape().to_vec(),
                field_spacing: field.spacing().to_vec(),
                operator_shape: self.region.shape().to_vec(),
                operator_spacing: self.spacing.to_vec(),
            })
        }
    }
}

/// Result of a diffusion run
#[derive(Clone, Debug, PartialEq)]
pub struct Diffused<const D: usize> {
    /// Scalar field after diffusion
    pub field: ScalarField<D>,

    /// Diffusion time that was actually simulated
    ///
    /// This is less than the requested diffusion time if the maximal number of
    /// time steps was reached.
    pub effective_diffusion_time: Precision,

    /// Number of time steps that were performed
    pub effective_number_of_time_steps: usize,
}

/// Diffuse a scalar field according to a tensor field
///
/// Both fields must live on the same grid.
pub fn diffuse<const D: usize>(
    field: ScalarField<D>,
    tensors: &TensorField<D>,
    params: &Parameters,
) -> Result<Diffused<D>, Error>
where
    Lattice<D>: Discretize<D>,
{
    if !field.same_grid(tensors) {
        return Err(Error::GridMismatch {
            field_shape: field.shape().to_vec(),
            field_spacing: field.spacing().to_vec(),
            operator_shape: tensors.shape().to_vec(),
            operator_spacing: tensors.spacing().to_vec(),
        });
    }
    let diffused = Operator::new(tensors).run(field, params)?;
    log::debug!(
        "Diffused for {} time units in {} steps",
        diffused.effective_diffusion_time,
        diffused.effective_number_of_time_steps
    );
    Ok(diffused)
}

/// Things that can go wrong while diffusing
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Scalar field and diffusion tensors do not live on the same grid
    #[error(
        "scalar field grid (shape {field_shape:?}, spacing {field_spacing:?}) does not match \
        diffusion tensor grid (shape {operator_shape:?}, spacing {operator_spacing:?})"
    )]
    GridMismatch {
        field_shape: Vec<usize>,
        field_spacing: Vec<Precision>,
        operator_shape: Vec<usize>,
        operator_spacing: Vec<Precision>,
    },
}
