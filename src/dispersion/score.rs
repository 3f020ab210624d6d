//! dispersion::score — score of the (Cox–Reid adjusted) profile likelihood.
//!
//! Purpose
//! -------
//! Evaluate the derivative w.r.t. the dispersion `r` of the negative-binomial
//! profile log-likelihood,
//!
//! ```text
//! S(r) = Σ_v table[v]/(r+v) − Σᵢ [ ln(1 + μᵢ/r) + (yᵢ − μᵢ)/(μᵢ + r) ] + CR(r),
//! ```
//!
//! whose root is the (adjusted) maximum-likelihood dispersion. The first
//! sum is the cumulative-table form of `Σᵢ [ψ(yᵢ+r) − ψ(r)]`; `CR(r)` is
//! `½ tr(B⁻¹ dB)` when the Cox–Reid adjustment is requested and `0`
//! otherwise.
//!
//! Invariants & assumptions
//! ------------------------
//! - Pure: inputs are borrowed read-only and no state survives the call.
//! - The table term and the likelihood term are checked for finiteness
//!   before the Cox–Reid term is formed, so a dispersion driven towards `0`
//!   reports a numerical error rather than a singular-matrix error.
//!
//! Testing notes
//! -------------
//! - Hand-computed scenario, Cox–Reid gating, the intercept-only closed
//!   form, the all-zero boundary and the `r → 0+` boundary.

use crate::dispersion::{
    cox_reid::cox_reid_adjustment,
    errors::DispersionResult,
    lookup::CumulativeCountTable,
    problem::DispersionProblem,
    validation::ensure_finite,
};
use ndarray::ArrayView2;

/// evaluate_score — `S(r)` for one feature.
///
/// Parameters
/// ----------
/// - `y`: `&[i64]`
///   Observed counts (non-negative, at least one).
/// - `table`: `&CumulativeCountTable`
///   Table built from `y` by
///   [`build_cumulative_count_table`](crate::dispersion::build_cumulative_count_table).
/// - `mu`: `&[f64]`
///   Fitted means, positive and finite, aligned with `y`.
/// - `r`: `f64`
///   Candidate dispersion, positive and finite.
/// - `design`: `ArrayView2<f64>`
///   `n × p` design matrix; only read when `cox_reid` is true.
/// - `cox_reid`: `bool`
///   Apply the Cox–Reid adjustment.
///
/// Returns
/// -------
/// `DispersionResult<f64>`
///   The score value; a complete finite scalar or an error, never both.
///
/// Errors
/// ------
/// - Input errors from [`DispersionProblem::new`] and `InvalidDispersion`.
/// - `SingularMatrix` when `B = Xᵗ W X` cannot be inverted.
/// - `NonFiniteValue` when any term or the result is not finite.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::Array2;
/// # use rust_overdispersion::dispersion::{build_cumulative_count_table, evaluate_score};
/// let y = [0, 1, 2];
/// let mu = [1.0, 1.0, 1.0];
/// let table = build_cumulative_count_table(&y).unwrap();
/// let x = Array2::<f64>::ones((3, 1));
/// let s = evaluate_score(&y, &table, &mu, 1.0, x.view(), false).unwrap();
/// assert!((s - (2.5 - 3.0 * 2f64.ln())).abs() < 1e-12);
/// ```
pub fn evaluate_score<'a>(
    y: &'a [i64], table: &'a CumulativeCountTable, mu: &'a [f64], r: f64,
    design: ArrayView2<'a, f64>, cox_reid: bool,
) -> DispersionResult<f64> {
    DispersionProblem::new(y, table, mu, design, cox_reid)?.score(r)
}

/// Evaluate `S(r)` on an already validated problem with a validated `r`.
pub(crate) fn score_at(problem: &DispersionProblem<'_>, r: f64) -> DispersionResult<f64> {
    let digamma_term = ensure_finite("digamma term", problem.table().digamma_sum(r))?;

    let mut likelihood_term = 0.0;
    for (&yi, &mi) in problem.counts().iter().zip(problem.mu()) {
        likelihood_term += (mi / r).ln_1p() + (yi as f64 - mi) / (mi + r);
    }
    let likelihood_term = ensure_finite("likelihood term", likelihood_term)?;

    let cr_term = if problem.cox_reid() {
        cox_reid_adjustment(problem.mu(), r, problem.design())?
    } else {
        0.0
    };

    ensure_finite("score", digamma_term - likelihood_term + cr_term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispersion::{
        errors::{DispersionError, ErrorKind},
        lookup::build_cumulative_count_table,
    };
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The literal y = [0, 1, 2], μ ≡ 1, r = 1 scenario.
    // - Cox–Reid off ⇒ no dependence on the design contents.
    // - Cox–Reid on, intercept-only ⇒ adjustment equals ½ dB/B.
    // - All-zero counts and r → 0+ boundaries, plus input errors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Regression value for the smallest hand-computable case.
    //
    // Given
    // -----
    // - y = [0, 1, 2], μ = [1, 1, 1], r = 1, no Cox–Reid.
    //
    // Expect
    // ------
    // - S = (2/1 + 1/2) − [3 ln 2 + (−1/2 + 0 + 1/2)] = 2.5 − 3 ln 2.
    fn literal_scenario_matches_hand_computation() {
        // Arrange
        let y = [0_i64, 1, 2];
        let mu = [1.0, 1.0, 1.0];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = Array2::<f64>::ones((3, 1));
        let expected = (2.0 / 1.0 + 1.0 / 2.0)
            - (2f64.ln() + (0.0 - 1.0) / 2.0 + 2f64.ln() + (1.0 - 1.0) / 2.0
                + 2f64.ln()
                + (2.0 - 1.0) / 2.0);

        // Act
        let s = evaluate_score(&y, &table, &mu, 1.0, x.view(), false).unwrap();

        // Assert
        assert_eq!(table.as_slice(), &[2, 1]);
        assert!((s - expected).abs() < 1e-12, "S = {s}, expected {expected}");
    }

    #[test]
    // Purpose
    // -------
    // With Cox–Reid disabled the result does not depend on the design.
    //
    // Given
    // -----
    // - The same counts/means evaluated with a sensible design, a NaN-filled
    //   design and an empty 0×0 view.
    //
    // Expect
    // ------
    // - Bitwise identical scores.
    fn cox_reid_off_ignores_design_contents() {
        let y = [4_i64, 0, 7, 2];
        let mu = [3.0, 1.2, 5.5, 2.0];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let nan = Array2::from_elem((4, 2), f64::NAN);
        let empty = Array2::<f64>::zeros((0, 0));

        let a = evaluate_score(&y, &table, &mu, 0.9, x.view(), false).unwrap();
        let b = evaluate_score(&y, &table, &mu, 0.9, nan.view(), false).unwrap();
        let c = evaluate_score(&y, &table, &mu, 0.9, empty.view(), false).unwrap();

        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq!(a.to_bits(), c.to_bits());
    }

    #[test]
    // Purpose
    // -------
    // Intercept-only design with constant μ: the adjustment is the scalar
    // ratio ½ dB/B.
    //
    // Given
    // -----
    // - n = 5, μ ≡ 2.5, r = 0.8, X = ones(5, 1).
    //
    // Expect
    // ------
    // - S_cr − S_plain = ½ · n(μ/(μ+r))² / (n μ r/(μ+r)).
    fn intercept_only_adjustment_matches_closed_form() {
        let y = [1_i64, 0, 6, 3, 2];
        let (m, r): (f64, f64) = (2.5, 0.8);
        let mu = [m; 5];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = Array2::<f64>::ones((5, 1));
        let b = 5.0 * m * r / (m + r);
        let db = 5.0 * (m / (m + r)).powi(2);

        let plain = evaluate_score(&y, &table, &mu, r, x.view(), false).unwrap();
        let adjusted = evaluate_score(&y, &table, &mu, r, x.view(), true).unwrap();

        assert!(((adjusted - plain) - 0.5 * db / b).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // All-zero counts: empty table, only the likelihood term remains.
    //
    // Given
    // -----
    // - y = [0, 0], μ = [0.5, 1.5], r = 2.
    //
    // Expect
    // ------
    // - S = −Σ [ln(1 + μ/r) − μ/(μ + r)].
    fn all_zero_counts_leave_only_likelihood_term() {
        let y = [0_i64, 0];
        let mu: [f64; 2] = [0.5, 1.5];
        let r: f64 = 2.0;
        let table = build_cumulative_count_table(&y).unwrap();
        let x = Array2::<f64>::ones((2, 1));
        let expected: f64 = -mu.iter().map(|&m| (1.0 + m / r).ln() - m / (m + r)).sum::<f64>();

        let s = evaluate_score(&y, &table, &mu, r, x.view(), false).unwrap();

        assert!(table.is_empty());
        assert!((s - expected).abs() < 1e-14);
    }

    #[test]
    // Purpose
    // -------
    // As r → 0+ the score diverges; it must be flagged, with or without
    // Cox–Reid.
    //
    // Given
    // -----
    // - r = 1e-310 (positive, subnormal).
    //
    // Expect
    // ------
    // - Errors of kind NumericalError.
    fn vanishing_dispersion_is_a_numerical_error() {
        let y = [0_i64, 1, 2];
        let mu = [1.0, 1.0, 1.0];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = Array2::<f64>::ones((3, 1));
        for cox_reid in [false, true] {
            let err = evaluate_score(&y, &table, &mu, 1e-310, x.view(), cox_reid).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NumericalError, "{err:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Misaligned inputs are rejected before any arithmetic.
    //
    // Given
    // -----
    // - Three counts with two means; and a design with too few rows under
    //   Cox–Reid.
    //
    // Expect
    // ------
    // - LengthMismatch errors.
    fn misaligned_inputs_are_rejected() {
        let y = [0_i64, 1, 2];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = Array2::<f64>::ones((2, 1));

        let err = evaluate_score(&y, &table, &[1.0, 1.0], 1.0, x.view(), false).unwrap_err();
        assert!(matches!(err, DispersionError::LengthMismatch { what: "mu", .. }));

        let err = evaluate_score(&y, &table, &[1.0; 3], 1.0, x.view(), true).unwrap_err();
        assert!(matches!(err, DispersionError::LengthMismatch { expected: 3, found: 2, .. }));
    }

    #[test]
    // Purpose
    // -------
    // A rank-deficient design under Cox–Reid fails as SingularMatrix, while
    // the same inputs without the adjustment still evaluate.
    //
    // Given
    // -----
    // - X with columns c and 3c, valid counts and means, r = 1.2.
    //
    // Expect
    // ------
    // - Err of kind SingularMatrix with cox_reid = true; Ok otherwise.
    fn collinear_design_is_singular_under_cox_reid() {
        let y = [0_i64, 2, 5, 1];
        let mu = [1.0, 2.0, 4.0, 1.5];
        let table = build_cumulative_count_table(&y).unwrap();
        let x = array![[1.0, 3.0], [2.0, 6.0], [0.5, 1.5], [1.0, 3.0]];

        let err = evaluate_score(&y, &table, &mu, 1.2, x.view(), true).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SingularMatrix, "{err:?}");
        assert!(matches!(err, DispersionError::SingularMatrix { .. }));
        assert!(evaluate_score(&y, &table, &mu, 1.2, x.view(), false).is_ok());
    }
}
