//! Point-independent computations over the whole grid
//!
//! These helpers run a stateless computation on every grid point, in parallel
//! if the `parallel` feature is enabled. Results do not depend on execution
//! order, so both flavors produce the same output.

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        use rayon::prelude::*;

        /// Compute one value per grid point, in linear buffer order
        pub(crate) fn collect_points<T: Send>(
            len: usize,
            value: impl Fn(usize) -> T + Send + Sync,
        ) -> Vec<T> {
            (0..len).into_par_iter().map(value).collect()
        }

        /// Update the value of each grid point, given its buffer index
        pub(crate) fn update_points<T: Send>(
            values: &mut [T],
            update: impl Fn(usize, &mut T) + Send + Sync,
        ) {
            values
                .par_iter_mut()
                .enumerate()
                .for_each(|(index, value)| update(index, value));
        }
    } else {
        /// Compute one value per grid point, in linear buffer order
        pub(crate) fn collect_points<T: Send>(
            len: usize,
            value: impl Fn(usize) -> T + Send + Sync,
        ) -> Vec<T> {
            (0..len).map(value).collect()
        }

        /// Update the value of each grid point, given its buffer index
        pub(crate) fn update_points<T: Send>(
            values: &mut [T],
            update: impl Fn(usize, &mut T) + Send + Sync,
        ) {
            for (index, value) in values.iter_mut().enumerate() {
                update(index, value);
            }
        }
    }
}
