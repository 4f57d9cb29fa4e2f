use clap::Parser;
use data::{
    hdf5::{Config, Reader},
    Precision,
};
use eyre::{bail, Result};
use image::RgbImage;
use ndarray::{ArrayD, ArrayView2, Axis, Ix2};
use rayon::prelude::*;
use std::path::PathBuf;

/// Convert diffusion output to images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input HDF5 file
    #[arg(short, long)]
    input: PathBuf,

    /// Directory where output images will be saved
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();
    let output_dir = args.output_dir.unwrap_or_else(|| "./".into());

    // Open the HDF5 dataset
    let reader = Reader::open(Config {
        file_name: args.input,
        ..Default::default()
    })?;

    // Setup image rendering
    let [rows, cols] = match reader.image_shape()?[..] {
        [rows, cols] | [rows, cols, _] => [rows, cols],
        ref shape => bail!("only 2D and 3D snapshots can be rendered, got shape {shape:?}"),
    };
    let mut image = RgbImage::new(cols as u32, rows as u32);
    let mut scale = None;

    // Start the main loop
    let progress = ui::init_progress_reporting("Rendering snapshot", reader.num_images());
    for (idx, snapshot) in reader.enumerate() {
        // Load the scalar field
        let (values, _time) = snapshot?;
        let values = image_slice(&values)?;

        // Generate image, with a color scale set by the first snapshot
        let scale = *scale.get_or_insert_with(|| {
            ui::amplitude_scale(values.iter().copied().fold(0.0, Precision::max))
        });
        render(values, scale, &mut image);

        // Save image
        image.save(output_dir.join(format!("{idx}.png")))?;

        // Report progress
        progress.inc(1);
    }
    progress.finish();
    Ok(())
}

/// Pick the 2D slice of a snapshot that will be rendered
///
/// 3D snapshots are cut through the middle of their last axis.
fn image_slice(values: &ArrayD<Precision>) -> Result<ArrayView2<'_, Precision>> {
    let slice = match values.ndim() {
        2 => values.view(),
        3 => values.index_axis(Axis(2), values.shape()[2] / 2),
        ndim => bail!("only 2D and 3D snapshots can be rendered, got a {ndim}D one"),
    };
    Ok(slice.into_dimensionality::<Ix2>()?)
}

/// Map values to colors
fn render(values: ArrayView2<Precision>, scale: Precision, image: &mut RgbImage) {
    let values = values.as_standard_layout();
    let values = values.as_slice().expect("Standard layout was requested");
    image
        .par_chunks_exact_mut(3)
        .zip(values.par_iter())
        .for_each(|(pixel, &value)| {
            let color = ui::GRADIENT.eval_continuous((scale * value).clamp(0.0, 1.0));
            pixel.copy_from_slice(&[color.r, color.g, color.b]);
        });
}
