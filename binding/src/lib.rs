//! YAMLScript Binding - Rust interface to libyamlscript
//!
//! libyamlscript is a precompiled GraalVM native image that parses, compiles
//! and evaluates YAMLScript. This crate only carries text across the foreign
//! boundary and turns the JSON answer back into Rust values.
//!
//! # Architecture
//!
//! - **library**: locating and opening `libyamlscript.<ext>.<version>`
//! - **native**: typed entry points and raw calls
//! - **response**: decoding the `{"data": ..}` / `{"error": ..}` envelope
//! - **evaluator**: the handle owning one isolate (`load`, `compile`, `close`)
//! - **global**: process-wide default instance
//!
//! # Critical Invariants
//!
//! 1. An isolate is torn down exactly once; no call reaches it afterwards
//! 2. Calls on one handle are serialized
//! 3. Native error messages reach the caller unchanged
//!
//! # Example
//! ```no_run
//! let data = yamlscript_binding::load("!yamlscript/v0/data\ntest:: inc(41)")?;
//! assert_eq!(data["test"].as_f64(), Some(42.0));
//! # Ok::<(), yamlscript_binding::Error>(())
//! ```

// Module declarations
pub mod error;
pub mod evaluator;
pub mod global;
pub mod library;
pub mod native;
pub mod response;

// Re-exports for convenience
pub use error::{Error, ErrorKind, EvaluationError, Result};
pub use evaluator::Evaluator;
pub use global::{compile, install, load, load_as, shutdown};
pub use library::{LibraryConfig, LIBRARY_ENV, LIBYAMLSCRIPT_VERSION};
pub use native::NativeApi;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn yamlscript_binding(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::evaluator::PyEvaluator>()?;
    m.add(
        "YamlscriptError",
        m.py().get_type::<ffi::types::YamlscriptError>(),
    )?;
    Ok(())
}
