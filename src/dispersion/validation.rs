//! dispersion::validation — precondition checks for the dispersion kernels.
//!
//! Purpose
//! -------
//! Centralize the input guards shared by the score and score-derivative
//! evaluators so that invalid inputs surface as [`DispersionError`] values
//! instead of non-finite scalars. Each helper checks one input and reports
//! the first offending entry.
//!
//! Conventions
//! -----------
//! - Helpers are side-effect free apart from a `log::debug!` line in
//!   [`ensure_finite`] when a numerical breakdown is detected.
//! - Design-matrix checks are only run when the Cox–Reid adjustment is
//!   requested; otherwise the matrix is never read.

use crate::dispersion::{
    errors::{DispersionError, DispersionResult},
    lookup::CumulativeCountTable,
};
use ndarray::ArrayView2;

/// Check that `y` is non-empty, non-negative, and consistent with `table`.
///
/// Errors
/// ------
/// - `EmptyCounts` when `y` is empty.
/// - `NegativeCount { index, value }` for the first negative entry.
/// - `TableMismatch { .. }` when `table.len() != max(y)` or the table was
///   built from a vector of a different length.
pub fn validate_counts(y: &[i64], table: &CumulativeCountTable) -> DispersionResult<()> {
    if y.is_empty() {
        return Err(DispersionError::EmptyCounts);
    }
    let mut max_y: i64 = 0;
    for (index, &value) in y.iter().enumerate() {
        if value < 0 {
            return Err(DispersionError::NegativeCount { index, value });
        }
        max_y = max_y.max(value);
    }
    let expected_len = usize::try_from(max_y).unwrap_or(usize::MAX);
    if table.len() != expected_len || table.n_obs() != y.len() {
        return Err(DispersionError::TableMismatch {
            expected_len,
            found_len: table.len(),
            expected_obs: y.len(),
            found_obs: table.n_obs(),
        });
    }
    Ok(())
}

/// Check that `mu` has length `n` and every entry is positive and finite.
pub fn validate_means(mu: &[f64], n: usize) -> DispersionResult<()> {
    if mu.len() != n {
        return Err(DispersionError::LengthMismatch { what: "mu", expected: n, found: mu.len() });
    }
    for (index, &value) in mu.iter().enumerate() {
        if !(value.is_finite() && value > 0.0) {
            return Err(DispersionError::InvalidMean { index, value });
        }
    }
    Ok(())
}

/// Check that the dispersion `r` is positive and finite.
pub fn validate_dispersion(r: f64) -> DispersionResult<()> {
    if r.is_finite() && r > 0.0 {
        Ok(())
    } else {
        Err(DispersionError::InvalidDispersion { value: r })
    }
}

/// Check that the design matrix has `n` rows and only finite entries.
pub fn validate_design(design: ArrayView2<'_, f64>, n: usize) -> DispersionResult<()> {
    if design.nrows() != n {
        return Err(DispersionError::LengthMismatch {
            what: "design matrix rows",
            expected: n,
            found: design.nrows(),
        });
    }
    for ((row, col), &value) in design.indexed_iter() {
        if !value.is_finite() {
            return Err(DispersionError::NonFiniteDesign { row, col, value });
        }
    }
    Ok(())
}

/// Pass `value` through if finite, otherwise report it as a numerical error.
pub fn ensure_finite(quantity: &'static str, value: f64) -> DispersionResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        log::debug!("non-finite {quantity} detected: {value}");
        Err(DispersionError::NonFiniteValue { quantity, value })
    }
}
