//! Moving field data to and from HDF5 files
//!
//! Fields are stored as one dataset each, with the grid spacing stored in a
//! `spacing` attribute. Tensor fields are stored as full `D x D` matrices, so
//! their dataset has two more axes than the grid.

use crate::{
    field::{FieldError, ScalarField, TensorField},
    tensor::SymmetricTensor,
    Precision,
};
use hdf5::{Dataset, File, Group};
use ndarray::{ArrayD, IxDyn};
use std::path::Path;
use thiserror::Error;

/// Name of the grid spacing attribute
pub const SPACING_ATTRIBUTE: &str = "spacing";

/// Name of the attribute recording the diffusion time of a snapshot
pub const TIME_ATTRIBUTE: &str = "time";

/// Default name of the input scalar field dataset
pub const SCALAR_DATASET: &str = "scalar";

/// Default name of the input tensor field dataset
pub const TENSOR_DATASET: &str = "tensor";

/// Common configuration for reading and writing to HDF5 files
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Config<'dsname, FileName: AsRef<Path>> {
    /// Name of the HDF5 file to be accessed
    pub file_name: FileName,

    /// Prefix of snapshot dataset names within the file
    pub dataset_name: Option<&'dsname str>,
}
//
impl<'dsname, FileName: AsRef<Path>> Config<'dsname, FileName> {
    fn dataset_name(&self) -> &'dsname str {
        self.dataset_name.unwrap_or("snapshot")
    }
}

/// Name of the dataset holding the snapshot number `idx`
fn snapshot_name(prefix: &str, idx: usize) -> String {
    format!("{prefix}{idx:05}")
}

/// Input data of a diffusion run: a scalar field and a tensor field
pub struct Input(File);
//
impl Input {
    /// Open an existing input file
    pub fn open(file_name: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(File::open(file_name)?))
    }

    /// Create or truncate an input file, and store some fields in it
    pub fn create<const D: usize>(
        file_name: impl AsRef<Path>,
        scalar: &ScalarField<D>,
        tensors: &TensorField<D>,
    ) -> Result<()> {
        let file = File::create(file_name)?;
        write_field(&file, SCALAR_DATASET, scalar.values().to_owned(), scalar.spacing())?;
        let mut matrix_shape = tensors.shape().to_vec();
        matrix_shape.extend([D, D]);
        let matrices = ArrayD::from_shape_vec(
            IxDyn(&matrix_shape),
            tensors
                .as_slice()
                .iter()
                .flat_map(|tensor| tensor.as_matrix().iter().flatten().copied())
                .collect(),
        )
        .expect("Should have one matrix per grid point");
        write_field(&file, TENSOR_DATASET, matrices, tensors.spacing())?;
        file.close()?;
        Ok(())
    }

    /// Number of dimensions of the grid
    pub fn ndim(&self) -> Result<usize> {
        Ok(self.0.dataset(SCALAR_DATASET)?.ndim())
    }

    /// Load the scalar field
    pub fn scalar_field<const D: usize>(&self) -> Result<ScalarField<D>> {
        let (values, spacing) = read_field::<D>(&self.0.dataset(SCALAR_DATASET)?)?;
        Ok(ScalarField::new(values, spacing)?)
    }

    /// Load the tensor field
    pub fn tensor_field<const D: usize>(&self) -> Result<TensorField<D>> {
        let dataset = self.0.dataset(TENSOR_DATASET)?;
        let (matrices, spacing) = read_field::<D>(&dataset)?;
        let shape = matrices.shape();
        if shape.len() != D + 2 || shape[D..] != [D, D] {
            return Err(Error::Shape {
                dataset: TENSOR_DATASET,
                shape: shape.to_vec(),
            });
        }
        let grid_shape: [usize; D] = std::array::from_fn(|axis| shape[axis]);
        let matrices = matrices.as_standard_layout();
        let coefficients = matrices.as_slice().expect("Standard layout was requested");
        let tensors = coefficients
            .chunks_exact(D * D)
            .map(|matrix| SymmetricTensor::from_fn(|i, j| matrix[i * D + j]))
            .collect::<Vec<_>>();
        let tensors = ArrayD::from_shape_vec(IxDyn(&grid_shape), tensors)
            .expect("Should have one tensor per grid point");
        Ok(TensorField::new(tensors, spacing)?)
    }
}

/// Mechanism to write diffusion snapshots into an HDF5 file
pub struct Writer(State);
//
impl Writer {
    /// Create or truncate a file
    pub fn create(config: Config<'_, impl AsRef<Path>>) -> Result<Self> {
        let prefix = config.dataset_name().to_owned();
        let file = File::create(config.file_name)?;
        Ok(Self(State {
            file,
            prefix,
            position: 0,
        }))
    }

    /// Write a new snapshot to the file, along with its diffusion time
    pub fn write<const D: usize>(&mut self, field: &ScalarField<D>, time: Precision) -> Result<()> {
        let name = snapshot_name(&self.0.prefix, self.0.position);
        let dataset = write_field(&self.0.file, &name, field.values().to_owned(), field.spacing())?;
        dataset
            .new_attr::<Precision>()
            .create(TIME_ATTRIBUTE)?
            .write_scalar(&time)?;
        self.0.position += 1;
        Ok(())
    }

    /// Flush the file to the underlying storage medium and close it
    ///
    /// This should automatically happen on Drop, but doing it manually allows
    /// you to catch and handle errors, instead of letting them lead to panics.
    pub fn close(self) -> Result<()> {
        Ok(self.0.file.close()?)
    }
}

/// Mechanism to read snapshots back from an HDF5 file
pub struct Reader {
    /// Common HDF5 I/O state
    state: State,

    /// Number of snapshots to be read
    num_images: usize,
}
//
impl Reader {
    /// Open an existing file
    pub fn open(config: Config<'_, impl AsRef<Path>>) -> Result<Self> {
        let prefix = config.dataset_name().to_owned();
        let file = File::open(config.file_name)?;
        let num_images = (0..)
            .take_while(|&idx| file.link_exists(&snapshot_name(&prefix, idx)))
            .count();
        Ok(Self {
            state: State {
                file,
                prefix,
                position: 0,
            },
            num_images,
        })
    }

    /// Shape of snapshots that will be read out
    pub fn image_shape(&self) -> Result<Vec<usize>> {
        let name = snapshot_name(&self.state.prefix, 0);
        Ok(self.state.file.dataset(&name)?.shape())
    }

    /// Number of snapshots to be read out
    pub fn num_images(&self) -> usize {
        self.num_images
    }

    /// Read the next snapshot and its diffusion time, if any
    ///
    /// You can equivalently treat this reader as an iterator of snapshots.
    pub fn read(&mut self) -> Option<Result<(ArrayD<Precision>, Precision)>> {
        (self.state.position < self.num_images).then(|| {
            let name = snapshot_name(&self.state.prefix, self.state.position);
            let dataset = self.state.file.dataset(&name)?;
            let values = dataset.read_dyn::<Precision>()?;
            let time = dataset.attr(TIME_ATTRIBUTE)?.read_scalar::<Precision>()?;
            self.state.position += 1;
            Ok((values, time))
        })
    }
}
//
impl Iterator for Reader {
    type Item = Result<(ArrayD<Precision>, Precision)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read()
    }
}

/// HDF5 file handle and snapshot naming
struct State {
    /// File handle
    file: File,

    /// Prefix of snapshot dataset names
    prefix: String,

    /// Number of snapshots that were read or written so far
    position: usize,
}

/// Store an array along with its grid spacing
fn write_field<const D: usize>(
    group: &Group,
    name: &str,
    values: ArrayD<Precision>,
    spacing: [Precision; D],
) -> Result<Dataset> {
    let dataset = group
        .new_dataset_builder()
        .with_data(&values)
        .create(name)?;
    dataset
        .new_attr::<Precision>()
        .shape(D)
        .create(SPACING_ATTRIBUTE)?
        .write(&spacing[..])?;
    Ok(dataset)
}

/// Load an array along with its grid spacing
fn read_field<const D: usize>(dataset: &Dataset) -> Result<(ArrayD<Precision>, [Precision; D])> {
    let values = dataset.read_dyn::<Precision>()?;
    let spacing = dataset.attr(SPACING_ATTRIBUTE)?.read_raw::<Precision>()?;
    let spacing = <[Precision; D]>::try_from(spacing.as_slice()).map_err(|_| Error::Spacing {
        expected: D,
        actual: spacing.len(),
    })?;
    Ok((values, spacing))
}

/// Things that can go wrong during HDF5 I/O
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the HDF5 library
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),

    /// Stored data does not make a valid field
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Dataset has an unexpected shape
    #[error("dataset {dataset} has unexpected shape {shape:?}")]
    Shape {
        dataset: &'static str,
        shape: Vec<usize>,
    },

    /// Spacing attribute does not match the grid dimensionality
    #[error("expected {expected} grid spacings, found {actual}")]
    Spacing { expected: usize, actual: usize },
}

/// Result type of HDF5 I/O
pub type Result<T> = std::result::Result<T, Error>;
