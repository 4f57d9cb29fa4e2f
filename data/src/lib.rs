//! Data model of the lattice-basis-reduction anisotropic diffusion scheme
//!
//! This crate provides the regular-grid containers that the diffusion scheme
//! operates on (scalar fields and diffusion tensor fields, each axis carrying
//! a physical spacing), the numerical parameters of a diffusion run, a
//! synthetic demo problem and, optionally, HDF5 storage.

pub mod field;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod parameters;
pub mod pattern;
pub mod tensor;

/// Computation precision
pub type Precision = f64;

/// Integer displacement on a grid of dimension `D`
pub type Offset<const D: usize> = [isize; D];
