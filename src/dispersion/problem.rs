//! dispersion::problem — validated per-feature inputs for repeated evaluation.
//!
//! Purpose
//! -------
//! Bundle the borrowed inputs of one feature (counts, cumulative table,
//! fitted means, design matrix, Cox–Reid flag) after validating them once,
//! so that a root finder can evaluate the score and its derivative at many
//! dispersion values while only `r` is re-checked per call.
//!
//! Key behaviors
//! -------------
//! - [`DispersionProblem::new`] runs every shape and domain check from
//!   `dispersion::validation`.
//! - [`DispersionProblem::score`] and [`DispersionProblem::score_derivative`]
//!   check `r` and evaluate.
//! - The free functions `evaluate_score` / `evaluate_score_derivative` are
//!   thin wrappers over a freshly built problem.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed problem never changes: all fields are shared borrows, the
//!   type is `Copy`, `Send` and `Sync`, and evaluation has no side effects.
//! - When `cox_reid` is false the design matrix is neither validated nor
//!   read; any view (even an empty one) may be passed.

use crate::dispersion::{
    errors::DispersionResult,
    lookup::CumulativeCountTable,
    score, score_derivative,
    validation::{validate_counts, validate_design, validate_dispersion, validate_means},
};
use ndarray::ArrayView2;

/// DispersionProblem — one feature's inputs to the dispersion score.
///
/// Fields
/// ------
/// - `y`: `&[i64]`
///   Non-negative counts, length `n ≥ 1`.
/// - `table`: `&CumulativeCountTable`
///   Table built from exactly these counts.
/// - `mu`: `&[f64]`
///   Positive finite fitted means, length `n`.
/// - `design`: `ArrayView2<f64>`
///   `n × p` design matrix with finite entries (checked only when
///   `cox_reid` is set).
/// - `cox_reid`: `bool`
///   Whether the Cox–Reid adjustment is applied.
#[derive(Debug, Clone, Copy)]
pub struct DispersionProblem<'a> {
    y: &'a [i64],
    table: &'a CumulativeCountTable,
    mu: &'a [f64],
    design: ArrayView2<'a, f64>,
    cox_reid: bool,
}

impl<'a> DispersionProblem<'a> {
    /// Validate and bundle one feature's inputs.
    ///
    /// Errors
    /// ------
    /// - `EmptyCounts`, `NegativeCount`, `TableMismatch` from the counts.
    /// - `LengthMismatch`, `InvalidMean` from `mu`.
    /// - `LengthMismatch`, `NonFiniteDesign` from `design` when `cox_reid`.
    pub fn new(
        y: &'a [i64], table: &'a CumulativeCountTable, mu: &'a [f64],
        design: ArrayView2<'a, f64>, cox_reid: bool,
    ) -> DispersionResult<Self> {
        validate_counts(y, table)?;
        validate_means(mu, y.len())?;
        if cox_reid {
            validate_design(design, y.len())?;
        }
        Ok(DispersionProblem { y, table, mu, design, cox_reid })
    }

    /// Score `S(r)`; see [`evaluate_score`](crate::dispersion::evaluate_score).
    pub fn score(&self, r: f64) -> DispersionResult<f64> {
        validate_dispersion(r)?;
        score::score_at(self, r)
    }

    /// Score derivative `S'(r)`; see
    /// [`evaluate_score_derivative`](crate::dispersion::evaluate_score_derivative).
    pub fn score_derivative(&self, r: f64) -> DispersionResult<f64> {
        validate_dispersion(r)?;
        score_derivative::score_derivative_at(self, r)
    }

    pub fn counts(&self) -> &'a [i64] {
        self.y
    }

    pub fn table(&self) -> &'a CumulativeCountTable {
        self.table
    }

    pub fn mu(&self) -> &'a [f64] {
        self.mu
    }

    pub fn design(&self) -> ArrayView2<'a, f64> {
        self.design
    }

    pub fn cox_reid(&self) -> bool {
        self.cox_reid
    }
}
