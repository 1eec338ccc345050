//! The evaluator handle
//!
//! An [`Evaluator`] owns one GraalVM isolate for its whole life:
//!
//! ```text
//! new / with_api ──► Ready ──close()/drop──► Closed
//! ```
//!
//! All native calls on a handle go through one lock. Calls are serialized,
//! and teardown never overlaps an in-flight call.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{fatal, Error, Result};
use crate::library::LibraryConfig;
use crate::native::{EntryPoint, IsolateThread, NativeApi};
use crate::response;

#[derive(Debug)]
enum State {
    Ready(IsolateThread),
    Closed,
}

/// A handle on one libyamlscript isolate
///
/// The type is `Send + Sync` and calls from several threads are serialized,
/// but a GraalVM isolate thread belongs to the OS thread that created it.
/// Tear the isolate down on that thread: call [`Evaluator::close`] (or drop
/// the last reference) on the creating thread. Tearing down from another
/// thread can make the native side fail, which aborts the process.
///
/// # Example
/// ```no_run
/// use yamlscript_binding::{Evaluator, LibraryConfig};
///
/// let ys = Evaluator::new(&LibraryConfig::from_env())?;
/// let data = ys.load("!yamlscript/v0/data\ntest:: inc(41)")?;
/// assert_eq!(data["test"].as_f64(), Some(42.0));
/// ys.close();
/// # Ok::<(), yamlscript_binding::Error>(())
/// ```
#[derive(Debug)]
pub struct Evaluator {
    state: Mutex<State>,
    api: NativeApi,
}

impl Evaluator {
    /// Open the library described by `config` and create an isolate
    pub fn new(config: &LibraryConfig) -> Result<Self> {
        let api = config.open()?;
        Self::with_api(api)
    }

    /// Create an isolate using an already resolved API table
    pub fn with_api(api: NativeApi) -> Result<Self> {
        let thread = api.create_isolate()?;
        tracing::debug!("created isolate");

        Ok(Self {
            state: Mutex::new(State::Ready(thread)),
            api,
        })
    }

    /// Evaluate a YAMLScript document and return the resulting data
    ///
    /// Numbers keep the form the library wrote them in: `42` stays an
    /// integer [`serde_json::Number`], `42.0` a float. Both read back as
    /// `as_f64() == Some(42.0)`; no value is narrowed or widened.
    ///
    /// # Errors
    ///
    /// - [`Error::Evaluation`] when libyamlscript rejects the document; the
    ///   message is the native `cause`
    /// - [`Error::Decode`] / [`Error::UnexpectedResponse`] when the response
    ///   breaks the envelope contract
    /// - [`Error::InteriorNul`] when `input` contains a NUL byte
    /// - [`Error::Closed`] after [`Evaluator::close`]
    pub fn load(&self, input: &str) -> Result<Value> {
        let json = self.call(EntryPoint::LoadToJson, input)?;
        response::decode(&json)
    }

    /// Like [`Evaluator::load`], deserializing the data into `T`
    pub fn load_as<T>(&self, input: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let json = self.call(EntryPoint::LoadToJson, input)?;
        response::decode_as(&json)
    }

    /// Compile a YAMLScript document to Clojure source without evaluating it
    pub fn compile(&self, input: &str) -> Result<String> {
        let json = self.call(EntryPoint::CompileToClj, input)?;
        response::decode_clojure(&json)
    }

    /// Tear the isolate down.
    ///
    /// Only the first call does anything. A teardown failure leaves native
    /// state that cannot be recovered and aborts the process.
    pub fn close(&self) {
        let mut state = self.lock();
        let previous = std::mem::replace(&mut *state, State::Closed);

        if let State::Ready(thread) = previous {
            let status = unsafe { self.api.tear_down_isolate(thread) };
            if status != 0 {
                fatal(&format!("Failed to tear down isolate (status {})", status));
            }
            tracing::debug!("tore down isolate");
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.lock(), State::Closed)
    }

    pub fn supports_compile(&self) -> bool {
        self.api.supports_compile()
    }

    fn call(&self, entry: EntryPoint, input: &str) -> Result<String> {
        let state = self.lock();
        let thread = match &*state {
            State::Ready(thread) => thread,
            State::Closed => return Err(Error::Closed),
        };

        let started = Instant::now();
        let json = unsafe { self.api.call(entry, thread, input) }?;
        tracing::debug!(
            entry_point = entry.symbol(),
            input_len = input.len(),
            response_len = json.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "native call finished"
        );

        Ok(json)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State changes are a single assignment, so a poisoned lock still
        // guards a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Evaluator {
    fn drop(&mut self) {
        if !self.is_closed() {
            tracing::debug!("evaluator dropped without close");
        }
        self.close();
    }
}
