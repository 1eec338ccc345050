//! Process-wide default evaluator
//!
//! A thin convenience layer over [`Evaluator`]. The instance is created on
//! first use from [`LibraryConfig::from_env`] unless one was provided with
//! [`install`]. Failing to create it is fatal: nothing can be evaluated
//! without it.
//!
//! Once [`shutdown`] has run, no instance is installed or created again.
//! An instance that races with `shutdown` is torn down before use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::library::LibraryConfig;

static DEFAULT: OnceLock<Evaluator> = OnceLock::new();
static SHUT_DOWN: AtomicBool = AtomicBool::new(false);

fn is_shut_down() -> bool {
    SHUT_DOWN.load(Ordering::SeqCst)
}

fn default_evaluator() -> Result<&'static Evaluator> {
    if is_shut_down() {
        return Err(Error::Closed);
    }
    let evaluator = DEFAULT.get_or_init(|| match Evaluator::new(&LibraryConfig::from_env()) {
        Ok(evaluator) => evaluator,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize default evaluator");
            panic!("Failed to initialize libyamlscript: {}", e)
        }
    });
    // `shutdown` may have run while the instance was being created.
    if is_shut_down() {
        evaluator.close();
        return Err(Error::Closed);
    }
    Ok(evaluator)
}

/// Use `evaluator` as the default instance.
///
/// Returns it back if a default instance already exists or [`shutdown`]
/// has run.
pub fn install(evaluator: Evaluator) -> std::result::Result<(), Evaluator> {
    if is_shut_down() {
        return Err(evaluator);
    }
    DEFAULT.set(evaluator)?;
    if is_shut_down() {
        if let Some(evaluator) = DEFAULT.get() {
            evaluator.close();
        }
    }
    Ok(())
}

/// Evaluate `input` with the default instance
pub fn load(input: &str) -> Result<Value> {
    default_evaluator()?.load(input)
}

/// Evaluate `input` with the default instance, deserializing into `T`
pub fn load_as<T>(input: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    default_evaluator()?.load_as(input)
}

/// Compile `input` to Clojure with the default instance
pub fn compile(input: &str) -> Result<String> {
    default_evaluator()?.compile(input)
}

/// Tear down the default instance, if it was ever created.
///
/// Later calls to the functions of this module fail with [`Error::Closed`].
pub fn shutdown() {
    SHUT_DOWN.store(true, Ordering::SeqCst);
    if let Some(evaluator) = DEFAULT.get() {
        evaluator.close();
    }
}
