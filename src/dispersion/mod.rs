//! dispersion — score kernels for negative-binomial dispersion estimation.
//!
//! Purpose
//! -------
//! Provide the inner-loop evaluations an external root finder needs to
//! estimate the dispersion `r` of a negative-binomial GLM by maximum
//! likelihood, optionally with the Cox–Reid adjustment for the regression
//! coefficients: the score `S(r)` and its derivative `S'(r)`, plus the
//! cumulative count table that makes both O(max y + n) per call.
//!
//! Key behaviors
//! -------------
//! - [`build_cumulative_count_table`] turns a count vector into a
//!   [`CumulativeCountTable`] once per feature.
//! - [`evaluate_score`] and [`evaluate_score_derivative`] are pure functions
//!   of `(y, table, μ, r, X, cox_reid)`.
//! - [`DispersionProblem`] validates one feature's inputs once for repeated
//!   evaluation and implements `argmin`'s `CostFunction` / `Gradient` with
//!   `Param = f64`.
//! - [`DispersionError`] / [`DispersionResult`] report invalid inputs,
//!   singular information matrices and numerical breakdowns; see
//!   [`ErrorKind`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `len(y) == len(μ) == rows(X)`, `r > 0`, `μᵢ > 0`, `yᵢ ≥ 0`; all are
//!   checked and reported, never silently turned into NaN.
//! - Nothing is cached between calls; concurrent evaluation of independent
//!   features needs no locking.
//!
//! Downstream usage
//! ----------------
//! ```rust
//! use ndarray::Array2;
//! use rust_overdispersion::dispersion::prelude::*;
//!
//! let y = [0, 3, 1, 8, 2];
//! let mu = [1.2, 2.5, 1.0, 5.1, 2.2];
//! let x = Array2::<f64>::ones((5, 1));
//! let table = build_cumulative_count_table(&y)?;
//! let problem = DispersionProblem::new(&y, &table, &mu, x.view(), true)?;
//!
//! // One Newton step from r = 1.
//! let r = 1.0;
//! let r_next = r - problem.score(r)? / problem.score_derivative(r)?;
//! assert!(r_next.is_finite());
//! # Ok::<(), DispersionError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its own formulas and error
//!   branches; `tests/integration_dispersion_pipeline.rs` drives the
//!   kernels with an `argmin` Brent root finder and a hand-written Newton
//!   loop.

pub mod adapter;
pub mod cox_reid;
pub mod errors;
pub mod lookup;
pub mod problem;
pub mod score;
pub mod score_derivative;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{DispersionError, DispersionResult, ErrorKind};
pub use self::lookup::{CumulativeCountTable, build_cumulative_count_table};
pub use self::problem::DispersionProblem;
pub use self::score::evaluate_score;
pub use self::score_derivative::evaluate_score_derivative;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_overdispersion::dispersion::prelude::*;
//
// to import the main dispersion surface in a single line.

pub mod prelude {
    pub use super::errors::{DispersionError, DispersionResult, ErrorKind};
    pub use super::lookup::{CumulativeCountTable, build_cumulative_count_table};
    pub use super::problem::DispersionProblem;
    pub use super::score::evaluate_score;
    pub use super::score_derivative::evaluate_score_derivative;
}
