//! PyO3 wrapper for Evaluator
//!
//! This module provides the Python interface to the Rust evaluator.

use std::path::PathBuf;

use pyo3::prelude::*;

use super::types::{json_to_py, to_py_err};
use crate::evaluator::Evaluator;
use crate::library::LibraryConfig;

/// Python wrapper for the Rust Evaluator
///
/// # Example (from Python)
///
/// ```python
/// from yamlscript_binding import YAMLScript
///
/// with YAMLScript() as ys:
///     data = ys.load("!yamlscript/v0/data\ntest:: inc(41)")
///     assert data == {"test": 42}
/// ```
#[pyclass(name = "YAMLScript")]
pub struct PyEvaluator {
    inner: Evaluator,
}

#[pymethods]
impl PyEvaluator {
    /// Create a new evaluator
    ///
    /// # Arguments
    ///
    /// * `library` - Explicit path to the libyamlscript file. When omitted
    ///   the library is searched via `YAMLSCRIPT_LIBRARY`, `LD_LIBRARY_PATH`
    ///   and the default install locations.
    ///
    /// # Errors
    ///
    /// Raises RuntimeError if the library cannot be loaded or the isolate
    /// cannot be created
    #[new]
    #[pyo3(signature = (library=None))]
    fn new(library: Option<PathBuf>) -> PyResult<Self> {
        let mut config = LibraryConfig::from_env();
        if library.is_some() {
            config.path = library;
        }
        let inner = Evaluator::new(&config).map_err(to_py_err)?;
        Ok(PyEvaluator { inner })
    }

    /// Compile and evaluate a YAMLScript string and return the result
    ///
    /// # Errors
    ///
    /// Raises YamlscriptError with the library's message if evaluation fails,
    /// ValueError if the evaluator was closed
    fn load(&self, py: Python<'_>, input: &str) -> PyResult<PyObject> {
        let value = py
            .allow_threads(|| self.inner.load(input))
            .map_err(to_py_err)?;
        Ok(json_to_py(py, &value)?.unbind())
    }

    /// Compile a YAMLScript string to Clojure source
    fn compile(&self, py: Python<'_>, input: &str) -> PyResult<String> {
        py.allow_threads(|| self.inner.compile(input))
            .map_err(to_py_err)
    }

    /// Release the native isolate; further calls raise ValueError
    fn close(&self) {
        self.inner.close();
    }

    #[getter]
    fn closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __exit__(
        &self,
        _exc_type: PyObject,
        _exc_value: PyObject,
        _traceback: PyObject,
    ) -> bool {
        self.inner.close();
        false
    }
}
