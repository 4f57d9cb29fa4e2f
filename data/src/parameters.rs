//! Computation parameters

use crate::Precision;
use thiserror::Error;

/// Parameters of a diffusion run
///
/// All parameters are validated when set, so a `Parameters` value is always
/// usable as is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Requested amount of diffusion time
    diffusion_time: Precision,

    /// Time step to be used, as a fraction of the maximal stable time step
    ratio_to_max_stable_time_step: Precision,

    /// Maximal number of time steps that may be performed
    max_number_of_time_steps: usize,
}
//
impl Parameters {
    /// Set up parameters, checking that they are valid
    pub fn new(
        diffusion_time: Precision,
        ratio_to_max_stable_time_step: Precision,
        max_number_of_time_steps: usize,
    ) -> Result<Self, ParameterError> {
        let mut result = Self::default();
        result.set_diffusion_time(diffusion_time)?;
        result.set_ratio_to_max_stable_time_step(ratio_to_max_stable_time_step)?;
        result.set_max_number_of_time_steps(max_number_of_time_steps)?;
        Ok(result)
    }

    /// Requested amount of diffusion time
    pub fn diffusion_time(&self) -> Precision {
        self.diffusion_time
    }

    /// Change the requested amount of diffusion time
    ///
    /// Must be finite and strictly positive.
    pub fn set_diffusion_time(&mut self, time: Precision) -> Result<(), ParameterError> {
        if !(time.is_finite() && time > 0.0) {
            return Err(ParameterError::DiffusionTime(time));
        }
        self.diffusion_time = time;
        Ok(())
    }

    /// Time step to be used, as a fraction of the maximal stable time step
    pub fn ratio_to_max_stable_time_step(&self) -> Precision {
        self.ratio_to_max_stable_time_step
    }

    /// Change the time step, as a fraction of the maximal stable time step
    ///
    /// Must lie within ]0, 1]. Smaller ratios mean more accurate results, at
    /// the expense of more time steps.
    pub fn set_ratio_to_max_stable_time_step(&mut self, ratio: Precision) -> Result<(), ParameterError> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ParameterError::RatioToMaxStableTimeStep(ratio));
        }
        self.ratio_to_max_stable_time_step = ratio;
        Ok(())
    }

    /// Maximal number of time steps that may be performed
    pub fn max_number_of_time_steps(&self) -> usize {
        self.max_number_of_time_steps
    }

    /// Change the maximal number of time steps
    ///
    /// If reaching the requested diffusion time would take more time steps
    /// than this, the diffusion is cut short.
    pub fn set_max_number_of_time_steps(&mut self, steps: usize) -> Result<(), ParameterError> {
        if steps == 0 {
            return Err(ParameterError::MaxNumberOfTimeSteps);
        }
        self.max_number_of_time_steps = steps;
        Ok(())
    }
}
//
impl Default for Parameters {
    fn default() -> Self {
        Self {
            diffusion_time: 1.0,
            ratio_to_max_stable_time_step: 0.7,
            max_number_of_time_steps: usize::MAX,
        }
    }
}

/// Invalid parameter values
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ParameterError {
    /// Diffusion time is not finite and positive
    #[error("diffusion time must be finite and positive, got {0}")]
    DiffusionTime(Precision),

    /// Time step ratio is out of range
    #[error("ratio to max stable time step should be within ]0, 1], got {0}")]
    RatioToMaxStableTimeStep(Precision),

    /// No time step allowed
    #[error("max number of time steps must be positive")]
    MaxNumberOfTimeSteps,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = Parameters::default();
        assert_eq!(
            Parameters::new(
                params.diffusion_time(),
                params.ratio_to_max_stable_time_step(),
                params.max_number_of_time_steps()
            ),
            Ok(params)
        );
    }

    #[test]
    fn diffusion_time() {
        let mut params = Parameters::default();
        assert_eq!(params.set_diffusion_time(2.5), Ok(()));
        assert_eq!(params.diffusion_time(), 2.5);
        for bad in [0.0, -1.0, Precision::INFINITY] {
            assert_eq!(
                params.set_diffusion_time(bad),
                Err(ParameterError::DiffusionTime(bad))
            );
        }
        assert!(params.set_diffusion_time(Precision::NAN).is_err());
        assert_eq!(params.diffusion_time(), 2.5);
    }

    #[test]
    fn ratio() {
        let mut params = Parameters::default();
        assert_eq!(params.set_ratio_to_max_stable_time_step(1.0), Ok(()));
        assert_eq!(params.set_ratio_to_max_stable_time_step(1e-3), Ok(()));
        for bad in [0.0, -0.5, 1.0 + 1e-9] {
            assert_eq!(
                params.set_ratio_to_max_stable_time_step(bad),
                Err(ParameterError::RatioToMaxStableTimeStep(bad))
            );
        }
        assert!(params.set_ratio_to_max_stable_time_step(Precision::NAN).is_err());
        assert_eq!(params.ratio_to_max_stable_time_step(), 1e-3);
    }

    #[test]
    fn max_steps() {
        let mut params = Parameters::default();
        assert_eq!(
            params.set_max_number_of_time_steps(0),
            Err(ParameterError::MaxNumberOfTimeSteps)
        );
        assert_eq!(params.set_max_number_of_time_steps(10), Ok(()));
        assert_eq!(params.max_number_of_time_steps(), 10);
    }
}
