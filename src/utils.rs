//! utils — Python → Rust conversion helpers for the PyO3 bindings.
//!
//! Each helper accepts a NumPy array first, then anything exposing
//! `to_numpy()` (pandas objects), and finally a plain Python sequence, and
//! raises `TypeError` / `ValueError` for anything else.
use ndarray::Array2;
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1, PyReadonlyArray2,
};
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Extract a count vector as `Vec<i64>` from an int64/int32 array or a
/// sequence of Python ints. Sign checks happen in the Rust core.
pub fn extract_counts(raw_data: &Bound<'_, PyAny>) -> PyResult<Vec<i64>> {
    if let Ok(arr) = raw_data.extract::<PyReadonlyArray1<i64>>() {
        return Ok(arr.as_array().to_vec());
    }
    if let Ok(arr) = raw_data.extract::<PyReadonlyArray1<i32>>() {
        return Ok(arr.as_array().iter().map(|&v| i64::from(v)).collect());
    }
    if let Ok(obj) = raw_data.call_method0("to_numpy") {
        if let Ok(arr) = obj.extract::<PyReadonlyArray1<i64>>() {
            return Ok(arr.as_array().to_vec());
        }
    }
    raw_data.extract::<Vec<i64>>().map_err(|_| {
        PyTypeError::new_err("expected a 1-D integer numpy.ndarray, pandas.Series, or sequence of int")
    })
}

/// Extract an `n × p` float64 design matrix from a 2-D array, a pandas
/// DataFrame, or a sequence of equally long rows.
pub fn extract_design_matrix(raw_data: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(obj) = raw_data.call_method0("to_numpy") {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr.as_array().to_owned());
        }
    }
    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D float64 numpy.ndarray, DataFrame, or list of rows")
    })?;
    let n = rows.len();
    let p = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != p) {
        return Err(PyValueError::new_err("model_matrix rows must all have the same length"));
    }
    Array2::from_shape_vec((n, p), rows.into_iter().flatten().collect())
        .map_err(|e| PyValueError::new_err(format!("invalid model_matrix shape: {e}")))
}
