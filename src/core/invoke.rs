//! Purpose: One-shot "check target → open → resolve → invoke → release" sequence.
//! Exports: `invoke_named_entry_point`, `invoke_target`, `probe_entry_point`, `Stage`.
//! Role: The loader-and-invoker core; callers pick the `Loader`.
//! Invariants: A missing target never reaches the loader.
//! Invariants: An opened library is released exactly once before returning, on every path.
//! Invariants: Failures surface only as `TargetNotFound`, `LibraryLoadFailed`, or `SymbolNotFound`.
//! Invariants: No retries; each call runs at most one open and one close.
use std::ffi::CStr;
use std::fmt;
use std::path::Path;

use tracing::{debug, info, info_span, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::loader::{EntryPoint, LoadMode, LoadedLibrary, Loader};
use crate::core::request::InvocationRequest;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    CheckingTarget,
    LoadingLibrary,
    ResolvingSymbol,
    Invoking,
    Released,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::CheckingTarget => "checking_target",
            Stage::LoadingLibrary => "loading_library",
            Stage::ResolvingSymbol => "resolving_symbol",
            Stage::Invoking => "invoking",
            Stage::Released => "released",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks `request.target`, loads `request.library`, and calls `request.symbol`
/// once with `argument`.
///
/// The entry point's own failures are not observable here. An entry point that
/// never returns blocks the caller.
pub fn invoke_named_entry_point<L: Loader>(
    loader: &L,
    request: &InvocationRequest,
    argument: &CStr,
) -> Result<(), Error> {
    let span = info_span!(
        "invoke",
        target = %request.target.display(),
        library = %request.library.display(),
        symbol = %request.symbol,
        bind = %request.mode
    );
    let _guard = span.enter();

    check_target(&request.target)?;
    let library = open_library(loader, &request.library, request.mode)?;
    let outcome = resolve_and_invoke(&library, &request.symbol, argument);
    release(library);

    if outcome.is_ok() {
        info!("entry point invoked");
    }
    outcome
}

/// Forwards the target path itself as the argument.
pub fn invoke_target<L: Loader>(loader: &L, request: &InvocationRequest) -> Result<(), Error> {
    let argument = request.target_argument()?;
    invoke_named_entry_point(loader, request, &argument)
}

/// Opens `library` and resolves `symbol` without calling it.
pub fn probe_entry_point<L: Loader>(
    loader: &L,
    library: &Path,
    symbol: &str,
    mode: LoadMode,
) -> Result<(), Error> {
    let span = info_span!(
        "probe",
        library = %library.display(),
        symbol = %symbol,
        bind = %mode
    );
    let _guard = span.enter();

    let library = open_library(loader, library, mode)?;
    let outcome = resolve(&library, symbol).map(|_| ());
    release(library);

    if outcome.is_ok() {
        info!("entry point resolved");
    }
    outcome
}

fn check_target(target: &Path) -> Result<(), Error> {
    info!(stage = %Stage::CheckingTarget, "checking target");
    match target.try_exists() {
        Ok(true) => {
            info!(stage = %Stage::CheckingTarget, "target exists");
            Ok(())
        }
        Ok(false) => {
            warn!(stage = %Stage::CheckingTarget, "target does not exist");
            Err(Error::new(ErrorKind::TargetNotFound)
                .with_message("target does not exist")
                .with_path(target))
        }
        Err(err) => {
            warn!(stage = %Stage::CheckingTarget, error = %err, "unable to check target");
            Err(Error::new(ErrorKind::TargetNotFound)
                .with_message(format!("unable to check target: {err}"))
                .with_path(target)
                .with_source(err))
        }
    }
}

fn open_library<L: Loader>(loader: &L, path: &Path, mode: LoadMode) -> Result<L::Library, Error> {
    info!(stage = %Stage::LoadingLibrary, "opening library");
    match loader.open(path, mode) {
        Ok(library) => {
            info!(
                stage = %Stage::LoadingLibrary,
                path = %library.path().display(),
                "library loaded"
            );
            Ok(library)
        }
        Err(err) => {
            let err = coerce_kind(err, ErrorKind::LibraryLoadFailed);
            warn!(
                stage = %Stage::LoadingLibrary,
                error = err.message().unwrap_or_default(),
                "unable to load library"
            );
            Err(err)
        }
    }
}

fn resolve<'lib, T>(library: &'lib T, symbol: &str) -> Result<T::Entry<'lib>, Error>
where
    T: LoadedLibrary + 'lib,
{
    info!(stage = %Stage::ResolvingSymbol, "resolving symbol");
    match library.resolve(symbol) {
        Ok(entry) => {
            info!(stage = %Stage::ResolvingSymbol, "symbol resolved");
            Ok(entry)
        }
        Err(err) => {
            let err = coerce_kind(err, ErrorKind::SymbolNotFound);
            warn!(
                stage = %Stage::ResolvingSymbol,
                error = err.message().unwrap_or_default(),
                "unable to find symbol"
            );
            Err(err)
        }
    }
}

fn resolve_and_invoke<T: LoadedLibrary>(
    library: &T,
    symbol: &str,
    argument: &CStr,
) -> Result<(), Error> {
    let entry = resolve(library, symbol)?;
    info!(stage = %Stage::Invoking, "invoking entry point");
    entry.invoke(argument);
    debug!(stage = %Stage::Invoking, "entry point returned");
    Ok(())
}

fn release<T: LoadedLibrary>(library: T) {
    let path = library.path().to_path_buf();
    match library.release() {
        Ok(()) => info!(stage = %Stage::Released, path = %path.display(), "library released"),
        Err(err) => warn!(
            stage = %Stage::Released,
            path = %path.display(),
            error = %err,
            "library close failed"
        ),
    }
}

// Loaders outside this crate may report other kinds; each stage owns exactly one.
fn coerce_kind(err: Error, kind: ErrorKind) -> Error {
    if err.kind() == kind {
        return err;
    }
    let message = err.message().map(str::to_owned).unwrap_or_else(|| err.to_string());
    let mut coerced = Error::new(kind).with_message(message);
    if let Some(path) = err.path() {
        coerced = coerced.with_path(path);
    }
    if let Some(symbol) = err.symbol() {
        coerced = coerced.with_symbol(symbol);
    }
    coerced.with_source(err)
}
