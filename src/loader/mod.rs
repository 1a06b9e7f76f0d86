//! Opening shared libraries against a declared table of exports.
//!
//! A [`LibrarySpec`] plays the role of a header file: it lists the symbols
//! a library must export and knows the C signature of each one.
//! [`SpecLibrary::open`] checks every declared export up front so a
//! mismatched library fails at load time, not at the first call.

pub mod spec;

pub use crate::domain::ports::RustSleep;
pub use spec::{AsyncPythonFfi, RustSleepFn};

use std::ffi::OsString;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::utils::error::{FfiError, Result};

/// Stem of the shared library this crate builds.
pub const LIBRARY_STEM: &str = "async_python_ffi";

/// Platform file name of this crate's shared library, e.g. `libasync_python_ffi.so`.
pub fn default_library_filename() -> OsString {
    libloading::library_filename(LIBRARY_STEM)
}

pub trait LibrarySpec: Sized + Send + Sync + 'static {
    /// Name used in logs and errors.
    const NAME: &'static str;

    /// Every symbol the library must export.
    const EXPORTS: &'static [&'static str];

    /// Resolve the typed function pointers.
    ///
    /// # Safety
    ///
    /// Each symbol must really have the signature it is cast to, and the
    /// returned value must not outlive `library`.
    unsafe fn bind(library: &Library) -> Result<Self>;
}

/// Look up `name` and copy it out as `T`, typically an `extern "C" fn` pointer.
///
/// # Safety
///
/// `T` must match the type of the exported symbol.
pub unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> Result<T> {
    let sym = library
        .get::<T>(name.as_bytes())
        .map_err(|source| FfiError::MissingSymbolError {
            name: name.to_string(),
            source,
        })?;
    Ok(*sym)
}

/// A loaded library together with its bound exports.
pub struct SpecLibrary<S> {
    // Declared before `library` so the pointers are dropped first.
    spec: S,
    path: PathBuf,
    library: Library,
}

impl<S: LibrarySpec> SpecLibrary<S> {
    /// Load the library at `path` and bind `S` against it.
    ///
    /// # Safety
    ///
    /// Loading runs the library's initialisers, and the exports are trusted
    /// to have the signatures `S` declares. Only open libraries built for `S`.
    pub unsafe fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if S::EXPORTS.is_empty() {
            return Err(FfiError::EmptySpecError { spec: S::NAME });
        }

        tracing::debug!("Loading {} from {}", S::NAME, path.display());
        let library =
            Library::new(path.as_os_str()).map_err(|source| FfiError::LibraryLoadError {
                path: path.display().to_string(),
                source,
            })?;

        for name in S::EXPORTS {
            symbol::<*const ()>(&library, name)?;
        }

        let spec = S::bind(&library)?;
        tracing::info!(
            "Loaded {} ({} exports) from {}",
            S::NAME,
            S::EXPORTS.len(),
            path.display()
        );

        Ok(Self {
            spec,
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn raw(&self) -> &Library {
        &self.library
    }
}

impl<S> Deref for SpecLibrary<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.spec
    }
}

impl<S> fmt::Debug for SpecLibrary<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<S: RustSleep + LibrarySpec> RustSleep for SpecLibrary<S> {
    fn rust_sleep(&self, delay_ms: std::os::raw::c_int) -> std::os::raw::c_int {
        self.spec.rust_sleep(delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoExports;

    impl LibrarySpec for NoExports {
        const NAME: &'static str = "NoExports";
        const EXPORTS: &'static [&'static str] = &[];

        unsafe fn bind(_library: &Library) -> Result<Self> {
            Ok(NoExports)
        }
    }

    #[test]
    fn test_empty_spec_is_rejected_before_loading() {
        let err = unsafe { SpecLibrary::<NoExports>::open("/does/not/matter.so") }.unwrap_err();
        assert!(matches!(err, FfiError::EmptySpecError { spec: "NoExports" }));
    }

    #[test]
    fn test_missing_library_is_reported_with_path() {
        let err = unsafe { SpecLibrary::<AsyncPythonFfi>::open("/nonexistent/libnothing.so") }
            .unwrap_err();
        match err {
            FfiError::LibraryLoadError { path, .. } => {
                assert_eq!(path, "/nonexistent/libnothing.so")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_library_filename() {
        let name = default_library_filename();
        assert!(name.to_string_lossy().contains(LIBRARY_STEM));
        #[cfg(target_os = "linux")]
        assert_eq!(name, "libasync_python_ffi.so");
    }
}
