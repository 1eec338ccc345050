//! FFI (Foreign Function Interface) module
//!
//! PyO3 bindings exposing the evaluator to Python.
//!
//! # Design Principles
//!
//! 1. **Minimal boundary**: one class, `load`, `compile`, `close`
//! 2. **Plain values**: results become dicts, lists, str, int, float, bool, None
//! 3. **GIL released** while the native evaluator runs
//! 4. **Safe errors**: every Rust error becomes a Python exception

pub mod evaluator;
pub mod types;
