//! Response envelope decoding
//!
//! Every entry point answers with a JSON object holding exactly one of:
//!
//! ```json
//! { "data": <any JSON value> }
//! { "error": { "cause": "<message>", ... } }
//! ```
//!
//! `error` is checked first, so an envelope carrying both is a failure.
//! An `error` member that is `null` counts as absent.
//!
//! `compile_ys_to_clj` answers with the code under `clojure` instead:
//!
//! ```json
//! { "clojure": "<clojure source>" }
//! ```

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, EvaluationError, Result};

const DATA_KEY: &str = "data";
const ERROR_KEY: &str = "error";
const CLOJURE_KEY: &str = "clojure";

/// Parse the envelope and turn a non-null `error` member into an error
fn open_envelope(json: &str) -> Result<Map<String, Value>> {
    let mut envelope: Map<String, Value> = serde_json::from_str(json).map_err(Error::Decode)?;

    match envelope.remove(ERROR_KEY) {
        Some(Value::Null) | None => Ok(envelope),
        Some(error) => Err(Error::Evaluation(EvaluationError::from_value(error))),
    }
}

/// Decode a raw response into the `data` value
pub fn decode(json: &str) -> Result<Value> {
    open_envelope(json)?
        .remove(DATA_KEY)
        .ok_or(Error::UnexpectedResponse)
}

/// Decode a `compile_ys_to_clj` response into the Clojure source
pub fn decode_clojure(json: &str) -> Result<String> {
    match open_envelope(json)?.remove(CLOJURE_KEY) {
        Some(Value::String(code)) => Ok(code),
        _ => Err(Error::UnexpectedResponse),
    }
}

/// Decode a raw response and deserialize `data` into `T`
pub fn decode_as<T>(json: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let data = decode(json)?;
    serde_json::from_value(data).map_err(Error::Deserialize)
}
