// Native loader contract against the fixture library compiled by build.rs.
use std::ffi::CString;
use std::path::{Path, PathBuf};

use playbridge::core::error::ErrorKind;
use playbridge::core::invoke::{invoke_named_entry_point, invoke_target, probe_entry_point};
use playbridge::core::loader::LoadMode;
use playbridge::core::native::NativeLoader;
use playbridge::core::request::{DEFAULT_SYMBOL, InvocationRequest};

// A missing fixture fails on Linux and skips elsewhere.
fn fixture() -> Option<PathBuf> {
    match option_env!("PLAYBRIDGE_FIXTURE_LIB") {
        Some(path) => Some(PathBuf::from(path)),
        None if cfg!(target_os = "linux") => {
            panic!("fixture library was not built; see the build.rs warnings")
        }
        None => {
            eprintln!("skipping: fixture library was not built");
            None
        }
    }
}

fn played_record(target: &Path) -> Option<String> {
    let mut record = target.as_os_str().to_owned();
    record.push(".played");
    std::fs::read_to_string(record).ok()
}

fn write_target(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"ID3").expect("write target");
    path
}

#[test]
fn plays_existing_target_exactly_once() {
    let Some(library) = fixture() else { return };
    let temp = tempfile::tempdir().expect("tempdir");
    let song = write_target(temp.path(), "song.mp3");
    let request = InvocationRequest::new(&song, &library, DEFAULT_SYMBOL);

    invoke_target(&NativeLoader, &request).expect("invoke");

    assert_eq!(played_record(&song), Some(format!("{}\n", song.display())));
}

#[test]
fn forwards_argument_bytes_unchanged() {
    let Some(library) = fixture() else { return };
    let temp = tempfile::tempdir().expect("tempdir");
    let song = write_target(temp.path(), "song.mp3");
    let other = temp.path().join("caf\u{e9} track.flac");
    let request = InvocationRequest::new(&song, &library, DEFAULT_SYMBOL);
    let argument = CString::new(other.to_str().unwrap()).unwrap();

    invoke_named_entry_point(&NativeLoader, &request, &argument).expect("invoke");

    assert_eq!(played_record(&other), Some(format!("{}\n", other.display())));
    assert_eq!(played_record(&song), None);
}

#[test]
fn lazy_binding_also_plays() {
    let Some(library) = fixture() else { return };
    let temp = tempfile::tempdir().expect("tempdir");
    let song = write_target(temp.path(), "lazy.mp3");
    let request =
        InvocationRequest::new(&song, &library, DEFAULT_SYMBOL).with_mode(LoadMode::Lazy);

    invoke_target(&NativeLoader, &request).expect("invoke");

    assert!(played_record(&song).is_some());
}

#[test]
fn repeated_plays_append_once_per_call() {
    let Some(library) = fixture() else { return };
    let temp = tempfile::tempdir().expect("tempdir");
    let song = write_target(temp.path(), "loop.mp3");
    let request = InvocationRequest::new(&song, &library, DEFAULT_SYMBOL);

    for _ in 0..3 {
        invoke_target(&NativeLoader, &request).expect("invoke");
    }

    let record = played_record(&song).expect("record");
    assert_eq!(record.lines().count(), 3);
}

#[test]
fn hidden_symbol_is_not_resolvable() {
    let Some(library) = fixture() else { return };
    let temp = tempfile::tempdir().expect("tempdir");
    let song = write_target(temp.path(), "hidden.mp3");
    let request = InvocationRequest::new(&song, &library, "av_hiddenAudio");

    let err = invoke_target(&NativeLoader, &request).expect_err("hidden");

    assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
    assert_eq!(err.symbol(), Some("av_hiddenAudio"));
    assert_eq!(played_record(&song), None);
}

#[test]
fn probe_sees_exported_symbol_only() {
    let Some(library) = fixture() else { return };

    probe_entry_point(&NativeLoader, &library, DEFAULT_SYMBOL, LoadMode::Now).expect("probe");
    let err = probe_entry_point(&NativeLoader, &library, "av_hiddenAudio", LoadMode::Now)
        .expect_err("hidden");
    assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
}

#[test]
fn missing_target_skips_loading() {
    let temp = tempfile::tempdir().expect("tempdir");
    let request = InvocationRequest::new(
        temp.path().join("missing.mp3"),
        temp.path().join("nolib.so"),
        DEFAULT_SYMBOL,
    );

    let err = invoke_target(&NativeLoader, &request).expect_err("missing");

    assert_eq!(err.kind(), ErrorKind::TargetNotFound);
}

#[test]
fn missing_library_is_load_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let song = write_target(temp.path(), "song.mp3");
    let library = temp.path().join("nolib.so");
    let request = InvocationRequest::new(&song, &library, DEFAULT_SYMBOL);

    let err = invoke_target(&NativeLoader, &request).expect_err("no lib");

    assert_eq!(err.kind(), ErrorKind::LibraryLoadFailed);
    assert_eq!(err.path(), Some(library.as_path()));
    assert!(!err.message().unwrap_or_default().is_empty());
}
