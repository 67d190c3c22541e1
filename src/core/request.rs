//! Purpose: Per-call description of what to load, resolve, and check.
//! Exports: `InvocationRequest`, `DEFAULT_SYMBOL`, `path_argument`.
//! Invariants: Requests are built right before a call and never retained.
use std::ffi::CString;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};
use crate::core::loader::LoadMode;

/// Entry point exported by the playback library.
pub const DEFAULT_SYMBOL: &str = "av_playAudio";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvocationRequest {
    pub target: PathBuf,
    pub library: PathBuf,
    pub symbol: String,
    pub mode: LoadMode,
}

impl InvocationRequest {
    pub fn new(
        target: impl Into<PathBuf>,
        library: impl Into<PathBuf>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            library: library.into(),
            symbol: symbol.into(),
            mode: LoadMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }

    /// The target path as the C string forwarded to the entry point.
    pub fn target_argument(&self) -> Result<CString, Error> {
        path_argument(&self.target)
    }
}

/// Raw path bytes as a C string; fails only on an interior NUL.
pub fn path_argument(path: &Path) -> Result<CString, Error> {
    CString::new(path_bytes(path)).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("path contains an interior NUL byte")
            .with_path(path)
            .with_source(err)
    })
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SYMBOL, InvocationRequest};
    use crate::core::error::ErrorKind;
    use crate::core::loader::LoadMode;

    #[test]
    fn new_request_binds_now() {
        let request = InvocationRequest::new("/tmp/song.mp3", "/tmp/libOSPort.so", DEFAULT_SYMBOL);
        assert_eq!(request.mode, LoadMode::Now);
        assert_eq!(request.symbol, "av_playAudio");
        assert_eq!(request.with_mode(LoadMode::Lazy).mode, LoadMode::Lazy);
    }

    #[test]
    fn target_argument_keeps_path_bytes() {
        let request = InvocationRequest::new("/tmp/my song.mp3", "/tmp/lib.so", DEFAULT_SYMBOL);
        let argument = request.target_argument().expect("argument");
        assert_eq!(argument.as_bytes(), b"/tmp/my song.mp3");
    }

    #[cfg(unix)]
    #[test]
    fn target_argument_forwards_non_utf8_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        use std::path::PathBuf;

        let target = PathBuf::from(OsStr::from_bytes(b"/tmp/\xffsong.mp3"));
        let request = InvocationRequest::new(target, "/tmp/lib.so", DEFAULT_SYMBOL);
        let argument = request.target_argument().expect("argument");
        assert_eq!(argument.as_bytes(), b"/tmp/\xffsong.mp3");
    }

    #[test]
    fn interior_nul_is_usage_error() {
        let request = InvocationRequest::new("/tmp/a\0b.mp3", "/tmp/lib.so", DEFAULT_SYMBOL);
        let err = request.target_argument().expect_err("nul");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
