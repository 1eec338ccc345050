//! In-process stand-in for libyamlscript
//!
//! Exposes `extern "C"` functions with the exact native prototypes so tests
//! drive the real marshaling path. The evaluator understands a tiny subset:
//!
//! ```text
//! !yamlscript/v0/data      header, required for expressions
//! key: value               plain string / number
//! key:: inc(N) | dec(N)    arithmetic
//! key:: range(A B)         list A..B
//! ```
//!
//! Special inputs:
//! - `!isolate`          → `{"data": <isolate id>}`
//! - `!raw\n<text>`      → `<text>` returned verbatim as the response
//! - `!null`             → null pointer
//!
//! `compile_ys_to_clj` answers `{"clojure": "<code>"}`; `!number` and `!data`
//! produce malformed compile responses.
//!
//! Isolates are tracked in a live set; tearing down an unknown isolate
//! returns a non-zero status.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Map, Value};
use yamlscript_binding::NativeApi;

pub const DATA_HEADER: &str = "!yamlscript/v0/data";

static NEXT_ISOLATE: AtomicUsize = AtomicUsize::new(1);
static LIVE: Mutex<Option<HashSet<usize>>> = Mutex::new(None);

thread_local! {
    // Native-owned response buffer, valid until the next call on this thread.
    static RESPONSE: RefCell<CString> = RefCell::new(CString::default());
}

/// API table for the fake library
pub fn fake_api() -> NativeApi {
    unsafe { NativeApi::from_raw(fake_create_isolate, fake_tear_down_isolate, fake_load_to_json) }
        .with_compile(fake_compile_to_clj)
}

/// API table without `compile_ys_to_clj`
pub fn fake_api_without_compile() -> NativeApi {
    unsafe { NativeApi::from_raw(fake_create_isolate, fake_tear_down_isolate, fake_load_to_json) }
}

/// API table whose isolate creation always fails with status 7
pub fn failing_create_api() -> NativeApi {
    unsafe { NativeApi::from_raw(failing_create_isolate, fake_tear_down_isolate, fake_load_to_json) }
}

/// API table whose isolate teardown always fails
pub fn failing_tear_down_api() -> NativeApi {
    unsafe { NativeApi::from_raw(fake_create_isolate, failing_tear_down_isolate, fake_load_to_json) }
}

/// API table whose isolate creation succeeds without producing a thread
pub fn null_isolate_api() -> NativeApi {
    unsafe { NativeApi::from_raw(null_create_isolate, fake_tear_down_isolate, fake_load_to_json) }
}

pub fn is_live(isolate: usize) -> bool {
    LIVE.lock()
        .unwrap()
        .as_ref()
        .map_or(false, |live| live.contains(&isolate))
}

/// Build a document with the data header
pub fn data_doc(body: &str) -> String {
    format!("{}\n{}", DATA_HEADER, body)
}

// ============================================================================
// Native entry points
// ============================================================================

unsafe extern "C" fn fake_create_isolate(
    _params: *mut c_void,
    _isolate: *mut *mut c_void,
    thread: *mut *mut c_void,
) -> c_int {
    let id = NEXT_ISOLATE.fetch_add(1, Ordering::SeqCst);
    LIVE.lock()
        .unwrap()
        .get_or_insert_with(HashSet::new)
        .insert(id);
    *thread = id as *mut c_void;
    0
}

unsafe extern "C" fn failing_create_isolate(
    _params: *mut c_void,
    _isolate: *mut *mut c_void,
    _thread: *mut *mut c_void,
) -> c_int {
    7
}

unsafe extern "C" fn null_create_isolate(
    _params: *mut c_void,
    _isolate: *mut *mut c_void,
    thread: *mut *mut c_void,
) -> c_int {
    *thread = ptr::null_mut();
    0
}

unsafe extern "C" fn fake_tear_down_isolate(thread: *mut c_void) -> c_int {
    let removed = LIVE
        .lock()
        .unwrap()
        .as_mut()
        .map_or(false, |live| live.remove(&(thread as usize)));
    if removed {
        0
    } else {
        1
    }
}

unsafe extern "C" fn failing_tear_down_isolate(_thread: *mut c_void) -> c_int {
    1
}

unsafe extern "C" fn fake_load_to_json(thread: *mut c_void, input: *const c_char) -> *mut c_char {
    let input = CStr::from_ptr(input).to_string_lossy().into_owned();
    let isolate = thread as usize;

    if !is_live(isolate) {
        return respond(error_response("isolate is not live").to_string());
    }
    if input == "!null" {
        return ptr::null_mut();
    }
    if input == "!isolate" {
        return respond(json!({ "data": isolate }).to_string());
    }
    if let Some(raw) = input.strip_prefix("!raw\n") {
        return respond(raw.to_string());
    }

    let response = match evaluate(&input) {
        Ok(data) => json!({ "data": data }),
        Err(cause) => error_response(&cause),
    };
    respond(response.to_string())
}

unsafe extern "C" fn fake_compile_to_clj(thread: *mut c_void, input: *const c_char) -> *mut c_char {
    let input = CStr::from_ptr(input).to_string_lossy().into_owned();

    if !is_live(thread as usize) {
        return respond(error_response("isolate is not live").to_string());
    }
    if input == "!number" {
        return respond(json!({ "clojure": 1 }).to_string());
    }
    if input == "!data" {
        return respond(json!({ "data": "(inc 41)" }).to_string());
    }

    let response = match compile(&input) {
        Ok(code) => json!({ "clojure": code }),
        Err(cause) => error_response(&cause),
    };
    respond(response.to_string())
}

fn respond(json: String) -> *mut c_char {
    RESPONSE.with(|cell| {
        let mut buffer = cell.borrow_mut();
        *buffer = CString::new(json).unwrap();
        buffer.as_ptr() as *mut c_char
    })
}

fn error_response(cause: &str) -> Value {
    json!({
        "error": {
            "cause": cause,
            "type": "clojure.lang.ExceptionInfo",
            "trace": [["yamlscript.compiler$compile", "invokeStatic", "compiler.clj", 12]],
        }
    })
}

// ============================================================================
// Toy evaluator
// ============================================================================

fn evaluate(input: &str) -> Result<Value, String> {
    let (code_mode, body) = match input.strip_prefix(DATA_HEADER) {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    if !code_mode && !body.contains(':') {
        // A lone scalar document.
        return Ok(scalar(body.trim()));
    }

    let mut map = Map::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (key, value) = parse_pair(line, code_mode)?;
        map.insert(key, value);
    }
    Ok(Value::Object(map))
}

fn parse_pair(line: &str, code_mode: bool) -> Result<(String, Value), String> {
    if line.starts_with(':') {
        return Err(format!("Unexpected ':' in '{}'", line));
    }

    if let Some((key, expr)) = line.split_once(":: ") {
        if !code_mode {
            return Err(format!("Expression '{}' requires {}", expr, DATA_HEADER));
        }
        return Ok((key.to_string(), eval_expr(expr.trim())?));
    }

    match line.split_once(": ") {
        Some((key, value)) => Ok((key.to_string(), scalar(value.trim()))),
        None => Err(format!("Don't know how to parse '{}'", line)),
    }
}

fn eval_expr(expr: &str) -> Result<Value, String> {
    let (name, args) = expr
        .strip_suffix(')')
        .and_then(|e| e.split_once('('))
        .ok_or_else(|| format!("Invalid expression '{}'", expr))?;

    let args = args
        .split_whitespace()
        .map(|a| a.parse::<i64>().map_err(|_| format!("Not a number: '{}'", a)))
        .collect::<Result<Vec<_>, _>>()?;

    match (name, args.as_slice()) {
        ("inc", [n]) => Ok(json!(n + 1)),
        ("dec", [n]) => Ok(json!(n - 1)),
        ("range", [from, to]) => Ok(json!((*from..*to).collect::<Vec<_>>())),
        _ => Err(format!("Could not resolve symbol: {}", name)),
    }
}

fn scalar(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return json!(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return json!(f);
    }
    match text {
        "true" => json!(true),
        "false" => json!(false),
        "null" | "~" | "" => Value::Null,
        _ => json!(text.trim_matches('"')),
    }
}

fn compile(input: &str) -> Result<String, String> {
    let body = input.strip_prefix(DATA_HEADER).unwrap_or(input);
    let mut forms = Vec::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with(':') {
            return Err(format!("Unexpected ':' in '{}'", line));
        }
        match line.split_once(":: ") {
            Some((key, expr)) => forms.push(format!("{:?} {}", key, to_clojure(expr.trim()))),
            None => match line.split_once(": ") {
                Some((key, value)) => forms.push(format!("{:?} {:?}", key, value.trim())),
                None => return Err(format!("Don't know how to parse '{}'", line)),
            },
        }
    }
    Ok(format!("{{{}}}", forms.join(" ")))
}

fn to_clojure(expr: &str) -> String {
    match expr.strip_suffix(')').and_then(|e| e.split_once('(')) {
        Some((name, args)) => format!("({} {})", name, args.trim()),
        None => expr.to_string(),
    }
}
