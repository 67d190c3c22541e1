//! Purpose: Runtime bridge from an exported `playAudio` C symbol to a dynamically loaded playback library.
//! Exports: `abi` (the C export), `config` (library/symbol/bind resolution), `core` (loader-and-invoker),
//! `logging` (diagnostics subscriber).
//! Role: Built as `rlib` for the CLI and tests, and as `cdylib`/`staticlib` for the foreign binding.
//! Invariants: `core` has no configuration and no global state; outer layers resolve both.
pub mod abi;
pub mod config;
pub mod core;
pub mod logging;
