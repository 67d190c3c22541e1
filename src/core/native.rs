//! Purpose: Platform loader backed by `libloading` (dlopen/dlsym/dlclose, LoadLibrary on Windows).
//! Exports: `NativeLoader`, `NativeLibrary`, `NativeEntry`.
//! Role: The production `Loader` used by the ABI export and the CLI.
//! Invariants: Loader diagnostics are carried verbatim in the error message.
//! Invariants: A symbol that resolves to a null address is reported as not found.
//! Notes: Resolution trusts the export to match `PlayFn`; a mismatched signature is
//! undefined behavior at call time and is not detected here.
use std::ffi::CStr;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::core::error::{Error, ErrorKind};
use crate::core::loader::{EntryPoint, LoadMode, LoadedLibrary, Loader, PlayFn};

#[derive(Clone, Copy, Debug, Default)]
pub struct NativeLoader;

#[derive(Debug)]
pub struct NativeLibrary {
    path: PathBuf,
    library: Library,
}

pub struct NativeEntry<'lib> {
    function: Symbol<'lib, PlayFn>,
}

impl Loader for NativeLoader {
    type Library = NativeLibrary;

    fn open(&self, path: &Path, mode: LoadMode) -> Result<NativeLibrary, Error> {
        // SAFETY: opening a library runs its initializers; the configured library is trusted.
        let library = unsafe { open_library(path, mode) }.map_err(|err| {
            let message = err.to_string();
            Error::new(ErrorKind::LibraryLoadFailed)
                .with_message(message)
                .with_path(path)
                .with_source(err)
        })?;
        Ok(NativeLibrary {
            path: path.to_path_buf(),
            library,
        })
    }
}

impl LoadedLibrary for NativeLibrary {
    type Entry<'lib> = NativeEntry<'lib>;

    fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, symbol: &str) -> Result<NativeEntry<'_>, Error> {
        // SAFETY: the export is trusted to have the `PlayFn` signature. `Option<PlayFn>`
        // shares the pointer layout and lets a null address surface as `None`.
        let resolved = unsafe { self.library.get::<Option<PlayFn>>(symbol.as_bytes()) }
            .map_err(|err| {
                let message = err.to_string();
                Error::new(ErrorKind::SymbolNotFound)
                    .with_message(message)
                    .with_path(&self.path)
                    .with_symbol(symbol)
                    .with_source(err)
            })?;
        let function = resolved.lift_option().ok_or_else(|| {
            Error::new(ErrorKind::SymbolNotFound)
                .with_message(format!("{symbol} resolved to a null address"))
                .with_path(&self.path)
                .with_symbol(symbol)
        })?;
        Ok(NativeEntry { function })
    }

    fn release(self) -> Result<(), Error> {
        let NativeLibrary { path, library } = self;
        library.close().map_err(|err| {
            let message = err.to_string();
            Error::new(ErrorKind::Internal)
                .with_message(message)
                .with_path(path)
                .with_source(err)
        })
    }
}

impl EntryPoint for NativeEntry<'_> {
    fn invoke(&self, argument: &CStr) {
        // SAFETY: `argument` is NUL-terminated and outlives the call; the callee is
        // trusted to match `PlayFn`.
        unsafe { (*self.function)(argument.as_ptr()) }
    }
}

#[cfg(unix)]
unsafe fn open_library(path: &Path, mode: LoadMode) -> Result<Library, libloading::Error> {
    use libloading::os::unix::Library as UnixLibrary;

    let binding = match mode {
        LoadMode::Now => libc::RTLD_NOW,
        LoadMode::Lazy => libc::RTLD_LAZY,
    };
    let library = unsafe { UnixLibrary::open(Some(path), binding | libc::RTLD_LOCAL) }?;
    Ok(library.into())
}

#[cfg(not(unix))]
unsafe fn open_library(path: &Path, _mode: LoadMode) -> Result<Library, libloading::Error> {
    unsafe { Library::new(path) }
}
