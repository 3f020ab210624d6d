//! Exposes a [`DispersionProblem`] to `argmin` root finders and Newton drivers.
//!
//! The score is the function whose root is sought, so `CostFunction::cost`
//! returns `S(r)` unchanged and `Gradient::gradient` returns `S'(r)`. Both
//! work on the scalar parameter `r: f64`. Kernel failures are returned as
//! `argmin::core::Error` wrapping the original [`DispersionError`], which the
//! caller can recover with `downcast_ref`.
//!
//! [`DispersionError`]: crate::dispersion::errors::DispersionError
use crate::dispersion::problem::DispersionProblem;
use argmin::core::{CostFunction, Error, Gradient};

impl CostFunction for DispersionProblem<'_> {
    type Param = f64;
    type Output = f64;

    /// Evaluate the score `S(r)`.
    fn cost(&self, r: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.score(*r)?)
    }
}

impl Gradient for DispersionProblem<'_> {
    type Param = f64;
    type Gradient = f64;

    /// Evaluate the score derivative `S'(r)`.
    fn gradient(&self, r: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.score_derivative(*r)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispersion::{errors::DispersionError, lookup::build_cumulative_count_table};
    use ndarray::Array2;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the value pass-through of both trait impls and the
    // error path (downcast back to `DispersionError`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `cost` and `gradient` return exactly the kernel values.
    //
    // Given
    // -----
    // - A small Cox–Reid problem at r = 1.3.
    //
    // Expect
    // ------
    // - cost == score, gradient == score_derivative (bitwise).
    fn trait_impls_forward_kernel_values() {
        let y = [1_i64, 4, 0, 2];
        let mu = [1.5, 3.0, 0.9, 2.2];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = Array2::<f64>::ones((4, 1));
        let problem = DispersionProblem::new(&y, &table, &mu, x.view(), true).unwrap();

        let cost = problem.cost(&1.3).unwrap();
        let grad = problem.gradient(&1.3).unwrap();

        assert_eq!(cost.to_bits(), problem.score(1.3).unwrap().to_bits());
        assert_eq!(grad.to_bits(), problem.score_derivative(1.3).unwrap().to_bits());
    }

    #[test]
    // Purpose
    // -------
    // Kernel errors survive the trip through `argmin::core::Error`.
    //
    // Given
    // -----
    // - A valid problem evaluated at r = −1.
    //
    // Expect
    // ------
    // - The returned error downcasts to InvalidDispersion { value: −1 }.
    fn kernel_errors_downcast_from_argmin_error() {
        let y = [2_i64, 0];
        let mu = [1.0, 1.0];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = Array2::<f64>::ones((2, 1));
        let problem = DispersionProblem::new(&y, &table, &mu, x.view(), false).unwrap();

        let err = problem.cost(&-1.0).unwrap_err();

        assert_eq!(
            err.downcast_ref::<DispersionError>(),
            Some(&DispersionError::InvalidDispersion { value: -1.0 })
        );
    }
}
