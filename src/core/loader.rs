//! Purpose: Capability-binding seam between the invoker and a dynamic loader.
//! Exports: `Loader`, `LoadedLibrary`, `EntryPoint`, `LoadMode`, `PlayFn`.
//! Role: Lets the invoker run against the platform loader or a test double.
//! Invariants: An entry point borrows the library that resolved it and cannot outlive it.
//! Invariants: Releasing a library consumes it, so it is released at most once.
use std::ffi::{CStr, c_char};
use std::fmt;
use std::path::Path;

use crate::core::error::Error;

/// ABI of a playback entry point: `void fn(const char *)`.
pub type PlayFn = unsafe extern "C" fn(*const c_char);

/// Binding mode requested when opening a library.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Resolve every relocation at open time so missing dependencies fail the open.
    #[default]
    Now,
    /// Defer binding until first use.
    Lazy,
}

impl LoadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadMode::Now => "now",
            LoadMode::Lazy => "lazy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "now" => Some(LoadMode::Now),
            "lazy" => Some(LoadMode::Lazy),
            _ => None,
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved function that can be called with one C string.
pub trait EntryPoint {
    fn invoke(&self, argument: &CStr);
}

/// An open library handle.
///
/// Dropping the value releases the handle; `release` does the same but
/// reports a failed close.
pub trait LoadedLibrary {
    type Entry<'lib>: EntryPoint
    where
        Self: 'lib;

    fn path(&self) -> &Path;

    fn resolve(&self, symbol: &str) -> Result<Self::Entry<'_>, Error>;

    fn release(self) -> Result<(), Error>
    where
        Self: Sized,
    {
        drop(self);
        Ok(())
    }
}

pub trait Loader {
    type Library: LoadedLibrary;

    fn open(&self, path: &Path, mode: LoadMode) -> Result<Self::Library, Error>;
}
