//! Locating and opening libyamlscript
//!
//! The binding is tied to an exact library version, so the file looked for is
//! `libyamlscript.<ext>.<version>` (e.g. `libyamlscript.so.0.1.69`).
//! Search order:
//! 1. `path`, if set (no searching)
//! 2. each directory of `search_paths`
//! 3. `/usr/local/lib`, then `$HOME/.local/lib` (when `default_paths`)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use libloading::Library;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::native::NativeApi;

/// libyamlscript release this binding speaks to
pub const LIBYAMLSCRIPT_VERSION: &str = "0.1.69";

/// Environment variable naming the library file directly
pub const LIBRARY_ENV: &str = "YAMLSCRIPT_LIBRARY";

const LD_LIBRARY_PATH_ENV: &str = "LD_LIBRARY_PATH";
const SYSTEM_LIB_DIR: &str = "/usr/local/lib";

/// Where and which libyamlscript to load
///
/// # Example
/// ```
/// use yamlscript_binding::LibraryConfig;
///
/// let config = LibraryConfig {
///     search_paths: vec!["/opt/ys/lib".into()],
///     default_paths: false,
///     ..LibraryConfig::default()
/// };
/// assert_eq!(config.candidates().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Exact library version to bind to
    pub version: String,

    /// Explicit library file; disables searching
    pub path: Option<PathBuf>,

    /// Directories searched in order
    pub search_paths: Vec<PathBuf>,

    /// Also search `/usr/local/lib` and `$HOME/.local/lib`
    pub default_paths: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            version: LIBYAMLSCRIPT_VERSION.to_string(),
            path: None,
            search_paths: Vec::new(),
            default_paths: true,
        }
    }
}

impl LibraryConfig {
    /// Defaults plus `YAMLSCRIPT_LIBRARY` and `LD_LIBRARY_PATH`
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os(LIBRARY_ENV).map(PathBuf::from),
            env::var(LD_LIBRARY_PATH_ENV).ok().as_deref(),
        )
    }

    fn from_vars(path: Option<PathBuf>, ld_library_path: Option<&str>) -> Self {
        let search_paths = ld_library_path
            .map(|paths| {
                paths
                    .split(':')
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            path: path.filter(|p| !p.as_os_str().is_empty()),
            search_paths,
            ..Self::default()
        }
    }

    /// Read a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(Error::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.path.is_none() && self.version.trim().is_empty() {
            return Err(Error::InvalidConfig("version must not be empty".to_string()));
        }
        Ok(())
    }

    /// File name of the library for this platform and version
    pub fn file_name(&self) -> String {
        format!("libyamlscript.{}.{}", env::consts::DLL_EXTENSION, self.version)
    }

    /// Candidate files, in search order
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.path {
            return vec![path.clone()];
        }

        let file_name = self.file_name();
        let mut dirs = self.search_paths.clone();
        if self.default_paths {
            dirs.push(PathBuf::from(SYSTEM_LIB_DIR));
            if let Some(home) = env::var_os("HOME") {
                dirs.push(Path::new(&home).join(".local").join("lib"));
            }
        }

        dirs.into_iter().map(|dir| dir.join(&file_name)).collect()
    }

    /// First candidate that exists on disk
    pub fn locate(&self) -> Result<PathBuf> {
        let candidates = self.candidates();
        match candidates.iter().find(|p| p.is_file()) {
            Some(found) => Ok(found.clone()),
            None => Err(Error::LibraryNotFound {
                file_name: self
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.file_name()),
                searched: candidates,
            }),
        }
    }

    /// Locate, open and resolve the library
    pub fn open(&self) -> Result<NativeApi> {
        let path = self.locate()?;
        tracing::debug!(path = %path.display(), "opening libyamlscript");

        let library = unsafe { Library::new(&path) }
            .map_err(|source| Error::LibraryOpen { path: path.clone(), source })?;

        // The file name pins the version whose exports match our prototypes.
        unsafe { NativeApi::from_library(library) }
    }
}
