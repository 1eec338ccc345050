//! Type conversion utilities for the FFI boundary
//!
//! Converts decoded JSON values and binding errors to their Python
//! counterparts.

use pyo3::exceptions::{PyException, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyString};
use serde_json::Value;

use crate::error::{Error, ErrorKind};

pyo3::create_exception!(
    yamlscript_binding,
    YamlscriptError,
    PyException,
    "Raised when libyamlscript fails to compile or evaluate a document."
);

/// Convert a JSON value to the equivalent Python object
///
/// Integers stay `int` and floats stay `float`; nothing is coerced.
pub fn json_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    let object = match value {
        Value::Null => py.None().into_bound(py),
        Value::Bool(b) => PyBool::new(py, *b).to_owned().into_any(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_pyobject(py)?.into_any()
            } else if let Some(u) = n.as_u64() {
                u.into_pyobject(py)?.into_any()
            } else {
                PyFloat::new(py, n.as_f64().unwrap_or(f64::NAN)).into_any()
            }
        }
        Value::String(s) => PyString::new(py, s).into_any(),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into_any()
        }
        Value::Object(map) => {
            let dict = PyDict::new(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into_any()
        }
    };
    Ok(object)
}

/// Map a binding error to a Python exception
///
/// - evaluation failures → `YamlscriptError` carrying the native cause
/// - use after close → `ValueError`
/// - everything else → `RuntimeError`
pub fn to_py_err(err: Error) -> PyErr {
    match err.kind() {
        ErrorKind::Evaluation => YamlscriptError::new_err(err.to_string()),
        ErrorKind::Closed => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}
