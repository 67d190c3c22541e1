//! Purpose: Compile the `av_playAudio` fixture into a real shared library for the test suite.
//! Role: Cargo build-script; drives the `cc`-discovered C compiler with `-shared`.
//! Invariants: `cargo:rerun-if-changed` covers the fixture source.
//! Invariants: Exposes the fixture path as `PLAYBRIDGE_FIXTURE_LIB` only when the build succeeded.
//! Invariants: A missing or failing C compiler is a warning, never a build failure.
//! Invariants: Fixture-dependent tests fail on Linux when the warning fires; elsewhere they skip.
//! Invariants: Uses only Cargo-provided env vars (e.g. `CARGO_MANIFEST_DIR`, `OUT_DIR`, `TARGET`).
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=c/av_fixture.c");

    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("windows") || target.contains("wasm") {
        return;
    }
    let (Some(manifest_dir), Some(out_dir)) = (
        env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from),
        env::var_os("OUT_DIR").map(PathBuf::from),
    ) else {
        return;
    };

    let source = manifest_dir.join("c").join("av_fixture.c");
    let output = out_dir.join(fixture_file_name(&target));
    match build_fixture(&source, &output, &target) {
        Ok(()) => println!(
            "cargo:rustc-env=PLAYBRIDGE_FIXTURE_LIB={}",
            output.display()
        ),
        Err(err) => warn_fixture_missing(&err, &target),
    }
}

fn warn_fixture_missing(err: &str, target: &str) {
    println!("cargo:warning=av_playAudio fixture library was NOT built: {err}");
    if target.contains("linux") {
        println!("cargo:warning=tests that load the fixture WILL FAIL on this host");
        println!("cargo:warning=install a C compiler or point CC at one, then rebuild");
    } else {
        println!("cargo:warning=tests that load the fixture will be skipped on this host");
    }
}

fn fixture_file_name(target: &str) -> &'static str {
    if target.contains("apple") {
        "libavfixture.dylib"
    } else {
        "libavfixture.so"
    }
}

fn build_fixture(source: &Path, output: &Path, target: &str) -> Result<(), String> {
    let compiler = cc::Build::new()
        .cargo_metadata(false)
        .try_get_compiler()
        .map_err(|err| err.to_string())?;
    let mut command = compiler.to_command();
    if target.contains("apple") {
        command.arg("-dynamiclib");
    } else {
        command.arg("-shared");
    }
    command.arg("-fPIC").arg("-fvisibility=hidden");
    command.arg(source).arg("-o").arg(output);

    let status = command
        .status()
        .map_err(|err| format!("failed to run {}: {err}", compiler.path().display()))?;
    if !status.success() {
        return Err(format!("{} exited with {status}", compiler.path().display()));
    }
    Ok(())
}
