//! Native API table
//!
//! libyamlscript is a GraalVM native image. It exports the GraalVM isolate
//! lifecycle functions plus the YAMLScript entry points. Only primitive
//! pointers cross the boundary:
//!
//! ```text
//! int   graal_create_isolate(void *params, void **isolate, void **thread)
//! int   graal_tear_down_isolate(void *thread)
//! char *load_ys_to_json(void *thread, const char *input)
//! char *compile_ys_to_clj(void *thread, const char *input)
//! ```
//!
//! Strings returned by the entry points are owned by the native side; they
//! are copied and never freed here.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use libloading::Library;

use crate::error::{Error, Result};

/// Prototype of `graal_create_isolate`
pub type CreateIsolateFn =
    unsafe extern "C" fn(*mut c_void, *mut *mut c_void, *mut *mut c_void) -> c_int;
/// Prototype of `graal_tear_down_isolate`
pub type TearDownIsolateFn = unsafe extern "C" fn(*mut c_void) -> c_int;
/// Prototype of `load_ys_to_json`
pub type LoadToJsonFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_char;
/// Prototype of `compile_ys_to_clj`
pub type CompileToCljFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_char;

pub const CREATE_ISOLATE_SYMBOL: &str = "graal_create_isolate";
pub const TEAR_DOWN_ISOLATE_SYMBOL: &str = "graal_tear_down_isolate";
pub const LOAD_TO_JSON_SYMBOL: &str = "load_ys_to_json";
pub const COMPILE_TO_CLJ_SYMBOL: &str = "compile_ys_to_clj";

/// Resolved entry points of a libyamlscript instance
///
/// When built with [`NativeApi::from_library`] the table keeps the library
/// mapped for as long as any clone of it exists.
#[derive(Clone)]
pub struct NativeApi {
    create_isolate: CreateIsolateFn,
    tear_down_isolate: TearDownIsolateFn,
    load_to_json: LoadToJsonFn,
    compile_to_clj: Option<CompileToCljFn>,
    library: Option<Arc<Library>>,
}

impl NativeApi {
    /// Build a table from function pointers obtained elsewhere
    /// (static linking, a custom loader, an in-process substitute).
    ///
    /// # Safety
    ///
    /// The pointers must follow the native protocol described in the module
    /// docs and stay valid for the lifetime of the returned value.
    pub unsafe fn from_raw(
        create_isolate: CreateIsolateFn,
        tear_down_isolate: TearDownIsolateFn,
        load_to_json: LoadToJsonFn,
    ) -> Self {
        Self {
            create_isolate,
            tear_down_isolate,
            load_to_json,
            compile_to_clj: None,
            library: None,
        }
    }

    /// Add the optional `compile_ys_to_clj` entry point
    pub fn with_compile(mut self, compile_to_clj: CompileToCljFn) -> Self {
        self.compile_to_clj = Some(compile_to_clj);
        self
    }

    /// Resolve all symbols from an opened library.
    ///
    /// # Safety
    ///
    /// `library` must be a libyamlscript build whose exports have the
    /// prototypes declared in this module.
    pub unsafe fn from_library(library: Library) -> Result<Self> {
        let create_isolate = *resolve::<CreateIsolateFn>(&library, CREATE_ISOLATE_SYMBOL)?;
        let tear_down_isolate =
            *resolve::<TearDownIsolateFn>(&library, TEAR_DOWN_ISOLATE_SYMBOL)?;
        let load_to_json = *resolve::<LoadToJsonFn>(&library, LOAD_TO_JSON_SYMBOL)?;
        // Older releases only export the load entry point.
        let compile_to_clj = resolve::<CompileToCljFn>(&library, COMPILE_TO_CLJ_SYMBOL)
            .ok()
            .map(|symbol| *symbol);

        Ok(Self {
            create_isolate,
            tear_down_isolate,
            load_to_json,
            compile_to_clj,
            library: Some(Arc::new(library)),
        })
    }

    pub fn supports_compile(&self) -> bool {
        self.compile_to_clj.is_some()
    }

    /// Create a fresh isolate and return its thread
    pub(crate) fn create_isolate(&self) -> Result<IsolateThread> {
        let mut thread: *mut c_void = ptr::null_mut();
        let status = unsafe { (self.create_isolate)(ptr::null_mut(), ptr::null_mut(), &mut thread) };
        if status != 0 {
            return Err(Error::Init { status });
        }
        NonNull::new(thread)
            .map(IsolateThread)
            .ok_or(Error::NullIsolate)
    }

    /// Tear an isolate down, returning the native status code.
    ///
    /// # Safety
    ///
    /// `thread` must come from [`NativeApi::create_isolate`] on this table and
    /// must not be used afterwards.
    pub(crate) unsafe fn tear_down_isolate(&self, thread: IsolateThread) -> c_int {
        (self.tear_down_isolate)(thread.as_ptr())
    }

    pub(crate) fn entry_point(&self, entry: EntryPoint) -> Result<LoadToJsonFn> {
        match entry {
            EntryPoint::LoadToJson => Ok(self.load_to_json),
            EntryPoint::CompileToClj => self.compile_to_clj.ok_or(Error::Unsupported {
                entry_point: COMPILE_TO_CLJ_SYMBOL,
            }),
        }
    }

    /// Pass `input` to an entry point and copy the native response.
    ///
    /// # Safety
    ///
    /// `thread` must be live and not used concurrently by another call.
    pub(crate) unsafe fn call(
        &self,
        entry: EntryPoint,
        thread: &IsolateThread,
        input: &str,
    ) -> Result<String> {
        let function = self.entry_point(entry)?;
        let input = CString::new(input).map_err(|e| Error::InteriorNul {
            position: e.nul_position(),
        })?;

        let raw = function(thread.as_ptr(), input.as_ptr());
        // The call is synchronous and does not keep the pointer.
        drop(input);

        if raw.is_null() {
            return Err(Error::NullResponse {
                entry_point: entry.symbol(),
            });
        }
        CStr::from_ptr(raw)
            .to_str()
            .map(str::to_owned)
            .map_err(Error::InvalidUtf8)
    }
}

impl fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeApi")
            .field("supports_compile", &self.supports_compile())
            .field("dynamically_loaded", &self.library.is_some())
            .finish()
    }
}

unsafe fn resolve<'lib, T>(
    library: &'lib Library,
    name: &'static str,
) -> Result<libloading::Symbol<'lib, T>> {
    library
        .get::<T>(name.as_bytes())
        .map_err(|source| Error::Symbol { name, source })
}

/// Entry points that take an input document and return a JSON response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryPoint {
    LoadToJson,
    CompileToClj,
}

impl EntryPoint {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            EntryPoint::LoadToJson => LOAD_TO_JSON_SYMBOL,
            EntryPoint::CompileToClj => COMPILE_TO_CLJ_SYMBOL,
        }
    }
}

/// A live GraalVM isolate thread (the runtime handle)
#[derive(Debug)]
pub(crate) struct IsolateThread(NonNull<c_void>);

// The pointer is an opaque token; all uses are serialized by the owning
// evaluator's lock. GraalVM still expects teardown on the creating OS thread.
unsafe impl Send for IsolateThread {}

impl IsolateThread {
    fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}
