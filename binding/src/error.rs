//! Error types for the binding
//!
//! Failures fall into a few broad groups (see [`ErrorKind`]):
//! - **Library / Initialization**: the shared library could not be found,
//!   opened or initialized. Nothing else can work after these.
//! - **Input**: the caller's text cannot cross the foreign boundary.
//! - **Evaluation**: libyamlscript rejected the document. The message is the
//!   native `cause`, unchanged.
//! - **Protocol**: the library answered with something that does not follow
//!   the response contract.
//! - **Closed**: the handle was already torn down.
//!
//! Teardown failures are not represented here; they abort the process.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the binding
#[derive(Debug, Error)]
pub enum Error {
    #[error("Shared library file '{file_name}' not found (searched: {})", display_paths(.searched))]
    LibraryNotFound {
        file_name: String,
        searched: Vec<PathBuf>,
    },

    #[error("Failed to open shared library '{}': {source}", .path.display())]
    LibraryOpen {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Failed to resolve symbol '{name}': {source}")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("Failed to read library config '{}': {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse library config: {0}")]
    ConfigParse(#[source] serde_json::Error),

    #[error("Invalid library config: {0}")]
    InvalidConfig(String),

    #[error("Failed to create isolate (status {status})")]
    Init { status: i32 },

    #[error("Failed to create isolate: library returned a null isolate thread")]
    NullIsolate,

    #[error("Input contains a NUL byte at position {position}")]
    InteriorNul { position: usize },

    #[error("{0}")]
    Evaluation(EvaluationError),

    #[error("Failed to decode response from 'libyamlscript': {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to deserialize 'data' into the requested type: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("Unexpected response from 'libyamlscript'")]
    UnexpectedResponse,

    #[error("'{entry_point}' returned a null pointer")]
    NullResponse { entry_point: &'static str },

    #[error("Response from 'libyamlscript' is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    #[error("'{entry_point}' is not exported by the loaded library")]
    Unsupported { entry_point: &'static str },

    #[error("YAMLScript evaluator is closed")]
    Closed,
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The library could not be found, opened or its symbols resolved
    Library,
    /// The native runtime could not be created
    Initialization,
    /// The input cannot be passed across the boundary
    Input,
    /// The document failed to compile or evaluate
    Evaluation,
    /// The library broke the response contract
    Protocol,
    /// The evaluator was used after `close`
    Closed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::LibraryNotFound { .. }
            | Error::LibraryOpen { .. }
            | Error::Symbol { .. }
            | Error::ConfigRead { .. }
            | Error::ConfigParse(_)
            | Error::InvalidConfig(_)
            | Error::Unsupported { .. } => ErrorKind::Library,
            Error::Init { .. } | Error::NullIsolate => ErrorKind::Initialization,
            Error::InteriorNul { .. } | Error::Deserialize(_) => ErrorKind::Input,
            Error::Evaluation(_) => ErrorKind::Evaluation,
            Error::Decode(_)
            | Error::UnexpectedResponse
            | Error::NullResponse { .. }
            | Error::InvalidUtf8(_) => ErrorKind::Protocol,
            Error::Closed => ErrorKind::Closed,
        }
    }

    /// The native error object, if this is an evaluation failure
    pub fn evaluation(&self) -> Option<&EvaluationError> {
        match self {
            Error::Evaluation(err) => Some(err),
            _ => None,
        }
    }
}

/// An error reported by libyamlscript in the `error` member of a response
///
/// `cause` is the human readable message. The full error object is kept in
/// `details` as-is; its other fields are not part of a stable contract.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationError {
    cause: String,
    details: Value,
}

impl EvaluationError {
    /// Build from the raw `error` value of a response
    ///
    /// A missing or non-string `cause` falls back to the JSON text of the
    /// whole error value so the message is never empty.
    pub fn from_value(details: Value) -> Self {
        let cause = match details.get("cause") {
            Some(Value::String(cause)) => cause.clone(),
            _ => details.to_string(),
        };
        Self { cause, details }
    }

    /// The native `cause` message, verbatim
    pub fn cause(&self) -> &str {
        &self.cause
    }

    /// The complete native error object
    pub fn details(&self) -> &Value {
        &self.details
    }

    pub fn into_details(self) -> Value {
        self.details
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cause)
    }
}

impl std::error::Error for EvaluationError {}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<none>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":")
}

/// Abort the process after logging `message`.
///
/// Used when the native runtime is left in a state that cannot be cleaned up.
pub(crate) fn fatal(message: &str) -> ! {
    tracing::error!("{}", message);
    eprintln!("yamlscript: fatal: {}", message);
    std::process::abort()
}
