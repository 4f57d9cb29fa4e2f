//! Choice of the explicit time step

use data::{parameters::Parameters, Precision};

/// Largest time step for which explicit Euler integration is stable
///
/// This is the inverse of the largest diagonal coefficient of the operator. At
/// or below this time step, each update is a convex combination of the
/// previous values, so the maximum principle holds.
///
/// Infinite if the operator is identically zero.
pub fn max_stable_time_step(diagonal: &[Precision]) -> Precision {
    1.0 / diagonal.iter().copied().fold(0.0, Precision::max)
}

/// Time stepping plan of a diffusion run
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Schedule {
    /// Duration of each time step
    pub time_step: Precision,

    /// Number of time steps
    pub num_steps: usize,

    /// Diffusion time that will actually be simulated
    ///
    /// This is less than the requested diffusion time if the maximal number
    /// of time steps was reached.
    pub effective_diffusion_time: Precision,
}
//
impl Schedule {
    /// Plan a diffusion run
    pub fn new(max_stable_time_step: Precision, params: &Parameters) -> Self {
        let diffusion_time = params.diffusion_time();
        let target_step = params.ratio_to_max_stable_time_step() * max_stable_time_step;

        // A null operator leaves every field unchanged
        if !target_step.is_finite() {
            log::debug!("Diffusion operator is zero, no time step needed");
            return Self {
                time_step: 0.0,
                num_steps: 0,
                effective_diffusion_time: diffusion_time,
            };
        }

        let max_steps = params.max_number_of_time_steps();
        let num_steps = (diffusion_time / target_step).ceil().max(1.0);
        let schedule = if num_steps > max_steps as Precision {
            let schedule = Self {
                time_step: target_step,
                num_steps: max_steps,
                effective_diffusion_time: max_steps as Precision * target_step,
            };
            log::info!(
                "Reaching diffusion time {diffusion_time} would take {num_steps} time steps, \
                stopping at {max_steps} steps i.e. diffusion time {}",
                schedule.effective_diffusion_time
            );
            schedule
        } else {
            let num_steps = num_steps as usize;
            Self {
                time_step: diffusion_time / num_steps as Precision,
                num_steps,
                effective_diffusion_time: diffusion_time,
            }
        };
        log::debug!("Planned diffusion: {schedule:?}");
        schedule
    }
}
