//! rust_overdispersion — negative-binomial dispersion score kernels with
//! optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the dispersion kernels to Python via the `_rust_overdispersion`
//! extension module. The kernels evaluate the score of the (optionally
//! Cox–Reid adjusted) negative-binomial profile likelihood in the dispersion
//! `r` and its derivative, for use inside an external root finder.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust module (`dispersion`) as the public crate
//!   surface.
//! - When the `python-bindings` feature is enabled, define the
//!   `CumulativeLookup` class, the `make_cumsum_lookup_vector`,
//!   `score_function` and `score_deriv_function` functions, and register
//!   them under `rust_overdispersion.dispersion`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in [`dispersion`]; this file performs only FFI
//!   glue, input conversion, and error mapping.
//! - Errors from the core are converted to Python `ValueError` at the PyO3
//!   boundary; conversion failures raise `TypeError`.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code depends on [`dispersion`] directly and can ignore the
//!   items guarded by the `python-bindings` feature.
//! - The root finder (Newton, secant, Brent, …) is owned by the caller; from
//!   Rust, `argmin` solvers can consume
//!   [`DispersionProblem`](dispersion::DispersionProblem) directly.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules
//!   and by `tests/integration_dispersion_pipeline.rs`.
//! - The PyO3 layer is exercised by Python-level tests.

pub mod dispersion;

#[cfg(feature = "python-bindings")]
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    dispersion::{
        CumulativeCountTable, DispersionProblem, build_cumulative_count_table,
    },
    utils::{extract_counts, extract_design_matrix, extract_f64_array},
};

/// CumulativeLookup — Python-facing wrapper for [`CumulativeCountTable`].
///
/// Purpose
/// -------
/// Let Python callers build the cumulative count table once per feature and
/// hand it back to the evaluators on every root-finder step without
/// re-validation of its construction.
///
/// Fields
/// ------
/// - `inner`: [`CumulativeCountTable`]
///   The validated Rust table.
///
/// Notes
/// -----
/// - Constructed only by `make_cumsum_lookup_vector`; Rust callers use
///   [`build_cumulative_count_table`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_overdispersion.dispersion", frozen)]
pub struct CumulativeLookup {
    inner: CumulativeCountTable,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl CumulativeLookup {
    /// Table entries: number of observations with count greater than v.
    #[getter]
    pub fn values(&self) -> Vec<u64> {
        self.inner.as_slice().to_vec()
    }

    /// Number of observations the table was built from.
    #[getter]
    pub fn n_obs(&self) -> usize {
        self.inner.n_obs()
    }

    pub fn __len__(&self) -> usize {
        self.inner.len()
    }
}

/// Build the cumulative count table for one count vector.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (y), text_signature = "(y, /)")]
pub fn make_cumsum_lookup_vector<'py>(y: &Bound<'py, PyAny>) -> PyResult<CumulativeLookup> {
    let counts = extract_counts(y)?;
    let inner = build_cumulative_count_table(&counts)?;
    Ok(CumulativeLookup { inner })
}

/// Score of the (Cox–Reid adjusted) profile likelihood at dispersion `r`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (y, lookup, mu, r, model_matrix = None, do_cr_adj = false),
    text_signature = "(y, lookup, mu, r, /, model_matrix=None, do_cr_adj=False)"
)]
pub fn score_function<'py>(
    py: Python<'py>, y: &Bound<'py, PyAny>, lookup: PyRef<'py, CumulativeLookup>,
    mu: &Bound<'py, PyAny>, r: f64, model_matrix: Option<&Bound<'py, PyAny>>, do_cr_adj: bool,
) -> PyResult<f64> {
    let counts = extract_counts(y)?;
    let mu_arr = extract_f64_array(py, mu)?;
    let mu_slice = mu_arr.as_slice().map_err(|_| {
        PyValueError::new_err("mu must be a 1-D contiguous float64 array or sequence")
    })?;
    let design = extract_optional_design(model_matrix, do_cr_adj)?;
    let problem =
        DispersionProblem::new(&counts, &lookup.inner, mu_slice, design.view(), do_cr_adj)?;
    Ok(problem.score(r)?)
}

/// Derivative of `score_function` w.r.t. `r`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (y, lookup, mu, r, model_matrix = None, do_cr_adj = false),
    text_signature = "(y, lookup, mu, r, /, model_matrix=None, do_cr_adj=False)"
)]
pub fn score_deriv_function<'py>(
    py: Python<'py>, y: &Bound<'py, PyAny>, lookup: PyRef<'py, CumulativeLookup>,
    mu: &Bound<'py, PyAny>, r: f64, model_matrix: Option<&Bound<'py, PyAny>>, do_cr_adj: bool,
) -> PyResult<f64> {
    let counts = extract_counts(y)?;
    let mu_arr = extract_f64_array(py, mu)?;
    let mu_slice = mu_arr.as_slice().map_err(|_| {
        PyValueError::new_err("mu must be a 1-D contiguous float64 array or sequence")
    })?;
    let design = extract_optional_design(model_matrix, do_cr_adj)?;
    let problem =
        DispersionProblem::new(&counts, &lookup.inner, mu_slice, design.view(), do_cr_adj)?;
    Ok(problem.score_derivative(r)?)
}

#[cfg(feature = "python-bindings")]
fn extract_optional_design(
    model_matrix: Option<&Bound<'_, PyAny>>, do_cr_adj: bool,
) -> PyResult<Array2<f64>> {
    match model_matrix {
        Some(raw) if do_cr_adj => extract_design_matrix(raw),
        // The design is never read without the adjustment.
        Some(_) => Ok(Array2::zeros((0, 0))),
        None if do_cr_adj => {
            Err(PyValueError::new_err("model_matrix must be provided when do_cr_adj=True"))
        }
        None => Ok(Array2::zeros((0, 0))),
    }
}

/// _rust_overdispersion — PyO3 module initializer for the Python extension.
///
/// Creates the `dispersion` submodule, attaches it to the parent module, and
/// registers it in `sys.modules` so `rust_overdispersion.dispersion` imports
/// work with dot notation.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_overdispersion<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let dispersion_mod = PyModule::new(_py, "dispersion")?;
    dispersion(_py, m, &dispersion_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_overdispersion.dispersion", dispersion_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn dispersion<'py>(
    _py: Python, rust_overdispersion: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<CumulativeLookup>()?;
    m.add_function(wrap_pyfunction!(make_cumsum_lookup_vector, m)?)?;
    m.add_function(wrap_pyfunction!(score_function, m)?)?;
    m.add_function(wrap_pyfunction!(score_deriv_function, m)?)?;
    rust_overdispersion.add_submodule(m)?;
    Ok(())
}
