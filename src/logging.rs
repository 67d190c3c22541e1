//! Purpose: Install the stderr `tracing` subscriber for step diagnostics.
//! Exports: `init_tracing`.
//! Invariants: Never replaces a subscriber the host process already installed.
//! Invariants: Filter directives come from `PLAYBRIDGE_LOG`, falling back to the caller's default.
//! Invariants: ANSI colors only when stderr is a terminal.
use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::LOG_ENV;

pub fn init_tracing(default_directive: &str) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    let ansi = std::io::stderr().is_terminal();
    let subscriber = build_subscriber(env_filter, std::io::stderr, ansi);
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_subscriber<W>(
    env_filter: EnvFilter,
    writer: W,
    ansi: bool,
) -> impl Subscriber + Send + Sync
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .finish()
}
