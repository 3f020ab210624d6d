//! dispersion::cox_reid — Cox–Reid adjustment terms for the dispersion score.
//!
//! Purpose
//! -------
//! Compute the first and second derivatives w.r.t. `r` of
//! `½ log det B(r)`, where `B = Xᵗ W X` is the GLM information matrix of the
//! regression coefficients with working weights
//! `wᵢ = 1 / (1/μᵢ + 1/r)`. These terms correct the profile log-likelihood
//! for the degrees of freedom spent estimating the coefficients.
//!
//! Key behaviors
//! -------------
//! - [`cox_reid_adjustment`] returns `CR(r) = ½ tr(B⁻¹ dB)` (Jacobi's
//!   formula), which the score adds.
//! - [`cox_reid_curvature`] returns
//!   `CR'(r) = ½ (ddet/det B)² − ½ d2det/det B`, which the score derivative
//!   subtracts. Algebraically this equals `−d/dr CR(r)`.
//! - Dense products are formed in `ndarray`; the `p × p` matrices are copied
//!   into `nalgebra::DMatrix` for the LU-based inverse and determinant.
//!
//! Invariants & assumptions
//! ------------------------
//! - Callers have already validated `r > 0`, `μᵢ > 0`, design shape and
//!   finiteness; these helpers only guard against what validation cannot
//!   see (singular `B`, overflow in the products).
//! - A design with zero columns has `log det B = 0`, so both terms are `0`.
//!
//! Conventions
//! -----------
//! - Weight derivatives: `dwᵢ = (μᵢ/(μᵢ+r))²`,
//!   `d2wᵢ = −2 μᵢ² / (μᵢ+r)³`.
//! - `ddet/det B = tr(B⁻¹dB)` and
//!   `d2det/det B = tr(B⁻¹dB)² − tr(B⁻¹dB·B⁻¹dB) + tr(B⁻¹d2B)` are evaluated
//!   as ratios, so `det B` itself never enters the returned value and cannot
//!   over- or underflow it. Singularity is still judged on the LU pivots.
//!
//! Testing notes
//! -------------
//! - Closed form for an intercept-only design, invariance under column
//!   rescaling, a central finite difference of `CR` against `−CR'`, and
//!   detection of collinear columns.

use crate::dispersion::{
    errors::{DispersionError, DispersionResult},
    validation::ensure_finite,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Relative pivot threshold (scaled by `p`) below which `B` is treated as
/// singular.
pub const PIVOT_RTOL: f64 = f64::EPSILON;

/// Working weights and their first two derivatives w.r.t. `r`.
struct WorkingWeights {
    weight: Array1<f64>,
    dweight: Array1<f64>,
    d2weight: Array1<f64>,
}

impl WorkingWeights {
    fn new(mu: &[f64], r: f64) -> Self {
        let weight = mu.iter().map(|&m| 1.0 / (1.0 / m + 1.0 / r)).collect();
        let dweight = mu.iter().map(|&m| (m / (m + r)).powi(2)).collect();
        let d2weight = mu.iter().map(|&m| -2.0 * m * m / (m + r).powi(3)).collect();
        WorkingWeights { weight, dweight, d2weight }
    }
}

/// cox_reid_adjustment — `CR(r) = ½ tr(B⁻¹ dB)`.
///
/// Parameters
/// ----------
/// - `mu`: `&[f64]`
///   Fitted means, positive and aligned with the design rows.
/// - `r`: `f64`
///   Dispersion, positive and finite.
/// - `design`: `ArrayView2<f64>`
///   `n × p` design matrix.
///
/// Returns
/// -------
/// `DispersionResult<f64>`
///   Half the derivative of `log det B` w.r.t. `r`.
///
/// Errors
/// ------
/// - `DispersionError::SingularMatrix` when `B` has a (relatively) zero
///   pivot or its inverse is not finite.
/// - `DispersionError::NonFiniteValue` when `B`, `dB`, or the result
///   overflow.
pub fn cox_reid_adjustment(
    mu: &[f64], r: f64, design: ArrayView2<'_, f64>,
) -> DispersionResult<f64> {
    if design.ncols() == 0 {
        return Ok(0.0);
    }
    let weights = WorkingWeights::new(mu, r);
    let b = information_matrix(design, &weights.weight, "information matrix B")?;
    let db = information_matrix(design, &weights.dweight, "information derivative dB")?;
    let b_inv = invert_information(b)?;

    ensure_finite("Cox-Reid adjustment", 0.5 * (&b_inv * &db).trace())
}

/// cox_reid_curvature — `CR'(r) = ½ (ddet/det B)² − ½ d2det/det B`.
///
/// Same inputs and errors as [`cox_reid_adjustment`]. The returned value is
/// the quantity the score derivative subtracts, i.e. `−d/dr CR(r)`.
pub fn cox_reid_curvature(mu: &[f64], r: f64, design: ArrayView2<'_, f64>) -> DispersionResult<f64> {
    if design.ncols() == 0 {
        return Ok(0.0);
    }
    let weights = WorkingWeights::new(mu, r);
    let b = information_matrix(design, &weights.weight, "information matrix B")?;
    let db = information_matrix(design, &weights.dweight, "information derivative dB")?;
    let d2b = information_matrix(design, &weights.d2weight, "information derivative d2B")?;
    let b_inv = invert_information(b)?;

    let b_inv_db = &b_inv * &db;
    let t1 = b_inv_db.trace();
    let t2 = (&b_inv_db * &b_inv_db).trace();
    let t3 = (&b_inv * &d2b).trace();

    let ddet_over_det = t1;
    let d2det_over_det = t1 * t1 - t2 + t3;
    ensure_finite("Cox-Reid curvature", 0.5 * ddet_over_det.powi(2) - 0.5 * d2det_over_det)
}

// ---- Helper methods ----

/// Form `Xᵗ diag(weights) X` and copy it into a `DMatrix`.
fn information_matrix(
    design: ArrayView2<'_, f64>, weights: &Array1<f64>, quantity: &'static str,
) -> DispersionResult<DMatrix<f64>> {
    let weighted = &design * &weights.view().insert_axis(Axis(1));
    let cross = design.t().dot(&weighted);
    if let Some(&bad) = cross.iter().find(|v| !v.is_finite()) {
        ensure_finite(quantity, bad)?;
    }
    let mut out = DMatrix::<f64>::zeros(cross.nrows(), cross.ncols());
    fill_dmatrix(&cross, &mut out);
    Ok(out)
}

/// Copy a square `ndarray` matrix into a preallocated `DMatrix`.
///
/// Walks column by column to follow `DMatrix`'s column-major storage. Shapes
/// must agree; a mismatch is a programming error and panics on indexing.
fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    for j in 0..src.ncols() {
        for i in 0..src.nrows() {
            dst[(i, j)] = src[[i, j]];
        }
    }
}

/// Invert `B` via LU, rejecting zero or negligible pivots.
fn invert_information(b: DMatrix<f64>) -> DispersionResult<DMatrix<f64>> {
    let p = b.nrows();
    let lu = b.lu();
    let determinant = lu.determinant();

    let pivots = lu.u().diagonal().map(f64::abs);
    let max_pivot = pivots.max();
    let min_pivot = pivots.min();
    if !lu.is_invertible() || max_pivot == 0.0 || min_pivot <= PIVOT_RTOL * p as f64 * max_pivot
    {
        log::debug!(
            "singular Cox-Reid information matrix: det = {determinant}, pivots in [{min_pivot}, {max_pivot}]"
        );
        return Err(DispersionError::SingularMatrix { determinant });
    }

    match lu.try_inverse() {
        Some(inv) if inv.iter().all(|v| v.is_finite()) => Ok(inv),
        _ => {
            log::debug!("Cox-Reid information matrix inverse is not finite: det = {determinant}");
            Err(DispersionError::SingularMatrix { determinant })
        }
    }
}
