//! This crate collects elements that are shared between the two CLI programs
//! diffuse and data-to-pics.

#[cfg(feature = "simulation")]
use clap::Args;
#[cfg(feature = "visualization")]
use colorous::Gradient;
#[cfg(feature = "simulation")]
use data::parameters::{ParameterError, Parameters};
#[cfg(feature = "tui")]
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
#[cfg(feature = "simulation")]
use std::path::PathBuf;
#[cfg(feature = "tui")]
use std::time::Duration;

/// Diffusion parameters that can be tuned from the command line
#[cfg(feature = "simulation")]
#[derive(Args, Clone, Debug, Default, PartialEq)]
pub struct ParameterArgs {
    /// Diffusion time between two consecutive output snapshots
    #[arg(short = 't', long)]
    pub time: Option<data::Precision>,

    /// Time step, as a fraction of the maximal stable time step (within ]0, 1])
    #[arg(short = 'r', long)]
    pub ratio: Option<data::Precision>,

    /// Maximal number of time steps between two snapshots
    ///
    /// If reaching the requested diffusion time would take more time steps,
    /// diffusion stops early.
    #[arg(short = 'm', long)]
    pub max_steps: Option<usize>,
}
//
#[cfg(feature = "simulation")]
impl ParameterArgs {
    /// Apply the user's choices on top of the default parameters
    pub fn parameters(&self) -> Result<Parameters, ParameterError> {
        let mut params = Parameters::default();
        if let Some(time) = self.time {
            params.set_diffusion_time(time)?;
        }
        if let Some(ratio) = self.ratio {
            params.set_ratio_to_max_stable_time_step(ratio)?;
        }
        if let Some(max_steps) = self.max_steps {
            params.set_max_number_of_time_steps(max_steps)?;
        }
        Ok(params)
    }
}

/// Path of the diffusion output file, given an optional user choice
#[cfg(feature = "simulation")]
pub fn simulation_output_path(output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| "output.h5".into())
}

/// Enable logging to syslog
///
/// Debug builds log at the Debug level, release builds at the Info level.
#[cfg(feature = "tui")]
pub fn init_syslog() {
    syslog::init(
        syslog::Facility::default(),
        if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
        None,
    )
    .expect("Failed to initialize syslog");
}

/// Set up a progress bar that counts up to `len`
#[cfg(feature = "tui")]
pub fn init_progress_reporting(message: impl Into<String>, len: usize) -> ProgressBar {
    let progress = ProgressBar::new(len as u64)
        .with_message(message.into())
        .with_style(
            ProgressStyle::with_template("{msg} {pos}/{len} {wide_bar} {elapsed}/~{duration}")
                .expect("Failed to parse style"),
        )
        .with_finish(ProgressFinish::AndClear);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Color gradient of the output visualizations
#[cfg(feature = "visualization")]
pub const GRADIENT: Gradient = colorous::INFERNO;

/// Scale factor that maps snapshot values into the [0, 1] gradient range
///
/// Diffusion never raises the maximum of a field, so normalizing by the
/// maximum of the first snapshot keeps colors comparable across snapshots.
#[cfg(feature = "visualization")]
pub fn amplitude_scale(max_amplitude: data::Precision) -> data::Precision {
    if max_amplitude > 0.0 {
        1.0 / max_amplitude
    } else {
        1.0
    }
}

#[cfg(all(test, feature = "simulation"))]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        params: ParameterArgs,
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["test"]);
        assert_eq!(cli.params.parameters(), Ok(Parameters::default()));
    }

    #[test]
    fn overrides() {
        let cli = Cli::parse_from(["test", "-t", "2.5", "--ratio", "0.5", "-m", "10"]);
        assert_eq!(
            cli.params.parameters(),
            Parameters::new(2.5, 0.5, 10)
        );
    }

    #[test]
    fn invalid() {
        let cli = Cli::parse_from(["test", "--time", "0"]);
        assert_eq!(
            cli.params.parameters(),
            Err(ParameterError::DiffusionTime(0.0))
        );
        let cli = Cli::parse_from(["test", "--ratio", "1.5"]);
        assert_eq!(
            cli.params.parameters(),
            Err(ParameterError::RatioToMaxStableTimeStep(1.5))
        );
    }

    #[test]
    fn output_path() {
        assert_eq!(simulation_output_path(None), PathBuf::from("output.h5"));
        assert_eq!(
            simulation_output_path(Some("out.h5".into())),
            PathBuf::from("out.h5")
        );
    }
}
