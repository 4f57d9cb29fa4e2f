use clap::Parser;
use compute::{
    stencil::{Discretize, Lattice},
    Operator,
};
use data::{
    field::{ScalarField, TensorField},
    hdf5::{self, Input, Writer},
    parameters::Parameters,
    pattern, Precision,
};
use eyre::{bail, ensure, eyre, Result};
use rayon::ThreadPoolBuilder;
use std::{num::NonZeroUsize, path::PathBuf};
use ui::ParameterArgs;

/// Perform anisotropic diffusion of a scalar field
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Diffusion parameters
    #[command(flatten)]
    params: ParameterArgs,

    /// Number of snapshots to be created
    #[arg(short, long, default_value_t = 10)]
    nbimage: usize,

    /// Path to an HDF5 file holding the "scalar" and "tensor" input datasets
    ///
    /// If unspecified, a synthetic problem is generated instead.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Grid shape of the synthetic problem, e.g. 256,512 or 64,64,128
    #[arg(long, value_delimiter = ',', default_values_t = [256, 512])]
    shape: Vec<usize>,

    /// Grid spacing of the synthetic problem (defaults to 1 on each axis)
    #[arg(long, value_delimiter = ',')]
    spacing: Option<Vec<Precision>>,

    /// Ratio of the tangential to radial diffusivity of the synthetic problem
    #[arg(short, long, default_value_t = 10.0)]
    anisotropy: Precision,

    /// Path to the results output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of threads used for the computation (defaults to all CPUs)
    #[arg(short = 'j', long, env = "DIFFUSE_NUM_THREADS")]
    num_threads: Option<NonZeroUsize>,
}

fn main() -> Result<()> {
    // Enable logging to syslog
    ui::init_syslog();

    // Parse CLI arguments and set up the thread pool
    let args = Args::parse();
    let params = args.params.parameters()?;
    if let Some(num_threads) = args.num_threads {
        ThreadPoolBuilder::new()
            .num_threads(num_threads.into())
            .build_global()?;
    }

    // Dispatch to the implementation for the grid's dimensionality
    let ndim = match &args.input {
        Some(path) => Input::open(path)?.ndim()?,
        None => args.shape.len(),
    };
    match ndim {
        2 => run::<2>(&args, &params),
        3 => run::<3>(&args, &params),
        _ => bail!("only 2D and 3D grids are supported, got a {ndim}D grid"),
    }
}

/// Load the input fields, or generate synthetic ones
fn load<const D: usize>(args: &Args) -> Result<(ScalarField<D>, TensorField<D>)> {
    if let Some(path) = &args.input {
        let input = Input::open(path)?;
        return Ok((input.scalar_field()?, input.tensor_field()?));
    }
    let shape = <[usize; D]>::try_from(args.shape.as_slice())
        .map_err(|_| eyre!("expected {D} grid dimensions"))?;
    let spacing = match &args.spacing {
        Some(spacing) => <[Precision; D]>::try_from(spacing.as_slice())
            .map_err(|_| eyre!("expected {D} grid spacings"))?,
        None => [1.0; D],
    };
    ensure!(
        args.anisotropy >= 1.0,
        "anisotropy ratio should be at least 1, got {}",
        args.anisotropy
    );
    Ok((
        pattern::hot_block(shape, spacing)?,
        pattern::swirl(shape, spacing, args.anisotropy)?,
    ))
}

/// Run the diffusion and save snapshots
fn run<const D: usize>(args: &Args, params: &Parameters) -> Result<()>
where
    Lattice<D>: Discretize<D>,
{
    // Set up the diffusion operator
    let (mut field, tensors) = load::<D>(args)?;
    let operator = Operator::new(&tensors);
    let schedule = operator.schedule(params);
    log::info!(
        "Diffusing a {:?} grid, {} time steps of {} per snapshot",
        field.shape(),
        schedule.num_steps,
        schedule.time_step
    );

    // Set up the output file
    let file_name = ui::simulation_output_path(args.output.clone());
    let mut writer = Writer::create(hdf5::Config {
        file_name,
        ..Default::default()
    })?;

    // Set up progress reporting
    let progress = ui::init_progress_reporting(
        "Running time step",
        args.nbimage.saturating_mul(schedule.num_steps),
    );

    // Run the diffusion, writing a snapshot every diffusion_time
    let mut time = 0.0;
    let mut num_steps = 0;
    for _ in 0..args.nbimage {
        let diffused = operator.run_with_progress(field, params, || progress.inc(1))?;
        time += diffused.effective_diffusion_time;
        num_steps += diffused.effective_number_of_time_steps;
        writer.write(&diffused.field, time)?;
        field = diffused.field;
    }
    progress.finish();

    // Make sure output data is written correctly
    writer.close()?;
    log::info!("Diffused for {time} time units in {num_steps} time steps");
    println!("Effective diffusion time: {time}");
    println!("Effective number of time steps: {num_steps}");
    Ok(())
}
