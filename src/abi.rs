//! Purpose: C ABI export bound by name from the managed-language standard library.
//! Exports: `playAudio` (unmangled, `void playAudio(const char *file_path)`).
//! Role: The single entry point the foreign binding links against.
//! Invariants: The symbol name and signature are fixed; bindings declare the same pair.
//! Invariants: Never unwinds or aborts into the host; failures are logged and swallowed.
//! Invariants: The string is forwarded byte-for-byte; encoding is not validated.
//! Notes: Library path, symbol, and bind mode come from `config::BridgeConfig::from_env`.
#![allow(non_snake_case)]

use std::ffi::{CStr, c_char};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Once;

use tracing::{error, warn};

use crate::config::BridgeConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::invoke::invoke_named_entry_point;
use crate::core::loader::Loader;
use crate::core::native::NativeLoader;
use crate::core::request::InvocationRequest;
use crate::logging::init_tracing;

static LOGGING: Once = Once::new();

/// Plays `file_path` through the configured playback library.
///
/// `file_path` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[unsafe(no_mangle)]
pub extern "C" fn playAudio(file_path: *const c_char) {
    LOGGING.call_once(|| init_tracing("info"));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let config = BridgeConfig::from_env()?;
        play_audio_with(&NativeLoader, &config, file_path)
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(kind = ?err.kind(), error = %err, "playAudio failed"),
        Err(_) => error!("playAudio panicked"),
    }
}

pub(crate) fn play_audio_with<L: Loader>(
    loader: &L,
    config: &BridgeConfig,
    file_path: *const c_char,
) -> Result<(), Error> {
    let argument = borrow_c_str(file_path)?;
    let request = InvocationRequest::new(target_path(argument), &config.library, &config.symbol)
        .with_mode(config.mode);
    invoke_named_entry_point(loader, &request, argument)
}

fn borrow_c_str<'a>(input: *const c_char) -> Result<&'a CStr, Error> {
    if input.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("file_path is null"));
    }
    // SAFETY: non-null and NUL-terminated per the exported contract.
    Ok(unsafe { CStr::from_ptr(input) })
}

#[cfg(unix)]
fn target_path(argument: &CStr) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(argument.to_bytes()))
}

#[cfg(not(unix))]
fn target_path(argument: &CStr) -> PathBuf {
    PathBuf::from(argument.to_string_lossy().into_owned())
}
