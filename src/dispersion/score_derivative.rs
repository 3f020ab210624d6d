//! dispersion::score_derivative — derivative of the dispersion score.
//!
//! Purpose
//! -------
//! Evaluate `S'(r)`, the derivative of [`evaluate_score`](crate::dispersion::evaluate_score)
//! w.r.t. the dispersion, for Newton-type root finders:
//!
//! ```text
//! S'(r) = − Σ_v table[v]/(r+v)² + Σᵢ [ μᵢ/(μᵢ r + r²) + (yᵢ − μᵢ)/(μᵢ + r)² ] − CR'(r),
//! ```
//!
//! where `CR'(r)` is the second-order log-determinant term from
//! [`cox_reid_curvature`] (zero without the adjustment).
//!
//! Testing notes
//! -------------
//! - Hand-computed scenario, intercept-only closed form of `CR'`, and
//!   central finite differences of `S` against `S'` with and without
//!   Cox–Reid.

use crate::dispersion::{
    cox_reid::cox_reid_curvature,
    errors::DispersionResult,
    lookup::CumulativeCountTable,
    problem::DispersionProblem,
    validation::ensure_finite,
};
use ndarray::ArrayView2;

/// evaluate_score_derivative — `S'(r)` for one feature.
///
/// Takes the same arguments, and fails under the same conditions, as
/// [`evaluate_score`](crate::dispersion::evaluate_score). With `cox_reid`
/// set, a singular `B` (`det B = 0`) is reported as `SingularMatrix`.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::Array2;
/// # use rust_overdispersion::dispersion::{build_cumulative_count_table, evaluate_score_derivative};
/// let y = [0, 1, 2];
/// let mu = [1.0, 1.0, 1.0];
/// let table = build_cumulative_count_table(&y).unwrap();
/// let x = Array2::<f64>::ones((3, 1));
/// let ds = evaluate_score_derivative(&y, &table, &mu, 1.0, x.view(), false).unwrap();
/// assert!((ds + 0.75).abs() < 1e-12);
/// ```
pub fn evaluate_score_derivative<'a>(
    y: &'a [i64], table: &'a CumulativeCountTable, mu: &'a [f64], r: f64,
    design: ArrayView2<'a, f64>, cox_reid: bool,
) -> DispersionResult<f64> {
    DispersionProblem::new(y, table, mu, design, cox_reid)?.score_derivative(r)
}

/// Evaluate `S'(r)` on an already validated problem with a validated `r`.
pub(crate) fn score_derivative_at(
    problem: &DispersionProblem<'_>, r: f64,
) -> DispersionResult<f64> {
    let trigamma_term = ensure_finite("trigamma term", problem.table().trigamma_sum(r))?;

    let mut likelihood_term = 0.0;
    for (&yi, &mi) in problem.counts().iter().zip(problem.mu()) {
        let shifted = mi + r;
        likelihood_term += mi / (mi * r + r * r) + (yi as f64 - mi) / (shifted * shifted);
    }
    let likelihood_term = ensure_finite("likelihood derivative term", likelihood_term)?;

    let cr_term = if problem.cox_reid() {
        cox_reid_curvature(problem.mu(), r, problem.design())?
    } else {
        0.0
    };

    ensure_finite("score derivative", -trigamma_term + likelihood_term - cr_term)
}
