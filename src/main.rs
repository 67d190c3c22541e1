//! Purpose: `playbridge` CLI entry point for driving the loader from a shell.
//! Role: Binary crate root; parses args, runs `play`/`probe`, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON line on stdout.
//! Invariants: Errors are emitted as JSON on stderr (text when stderr is a terminal).
//! Invariants: Process exit code is derived from `to_exit_code`.
//! Invariants: Step diagnostics go to stderr through `tracing`, never stdout.
use std::ffi::CString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::{Shell, generate};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;

mod report_json;

use playbridge::config::{BridgeConfig, EnvValues};
use playbridge::core::error::{Error, ErrorKind, to_exit_code};
use playbridge::core::invoke::{invoke_named_entry_point, probe_entry_point};
use playbridge::core::loader::LoadMode;
use playbridge::core::native::NativeLoader;
use playbridge::core::request::{InvocationRequest, path_argument};
use playbridge::logging::init_tracing;
use report_json::{InvokedReport, ResolvedReport};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing("info");
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `playbridge --help` for usage."));
            }
        },
    };

    dispatch(cli.command).map_err(add_hint)
}

#[derive(Parser)]
#[command(
    name = "playbridge",
    version,
    about = "Load a playback library at runtime and call its entry point",
    long_about = None,
    after_help = r#"EXAMPLES
  $ playbridge play ~/Music/intro.mp3
  $ playbridge play ~/Music/intro.mp3 --library ./libOSPort.so --symbol av_playAudio
  $ playbridge probe --library ./libOSPort.so     # is av_playAudio exported and visible?

ENVIRONMENT
  PLAYBRIDGE_LIBRARY  library path (default: ~/.playbridge/lib/<platform name for OSPort>)
  PLAYBRIDGE_SYMBOL   entry point name (default: av_playAudio)
  PLAYBRIDGE_BIND     now | lazy (default: now)
  PLAYBRIDGE_LOG      diagnostics filter, e.g. debug"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check TARGET, load the library, and call the entry point once.
    Play {
        #[arg(help = "File that must exist; its path is the default argument", value_hint = ValueHint::FilePath)]
        target: PathBuf,
        #[command(flatten)]
        library: LibraryArgs,
        #[arg(long, help = "Forward this text instead of the target path")]
        argument: Option<String>,
    },
    /// Load the library and resolve the entry point without calling it.
    Probe {
        #[command(flatten)]
        library: LibraryArgs,
    },
    /// Print a shell completion script.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct LibraryArgs {
    #[arg(long, help = "Shared library to load", value_hint = ValueHint::FilePath)]
    library: Option<PathBuf>,
    #[arg(long, help = "Exported entry point to resolve")]
    symbol: Option<String>,
    #[arg(long, value_enum, help = "Symbol binding mode at load time")]
    bind: Option<BindArg>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BindArg {
    Now,
    Lazy,
}

impl From<BindArg> for LoadMode {
    fn from(value: BindArg) -> Self {
        match value {
            BindArg::Now => LoadMode::Now,
            BindArg::Lazy => LoadMode::Lazy,
        }
    }
}

impl LibraryArgs {
    fn resolve(self) -> Result<BridgeConfig, Error> {
        BridgeConfig::resolve(
            self.library,
            self.symbol,
            self.bind.map(LoadMode::from),
            EnvValues::from_process(),
        )
    }
}

fn dispatch(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Play {
            target,
            library,
            argument,
        } => {
            let config = library.resolve()?;
            let request = InvocationRequest::new(target, config.library, config.symbol)
                .with_mode(config.mode);
            let argument = match argument {
                Some(text) => CString::new(text).map_err(|err| {
                    Error::new(ErrorKind::Usage)
                        .with_message("--argument contains an interior NUL byte")
                        .with_source(err)
                })?,
                None => path_argument(&request.target)?,
            };
            invoke_named_entry_point(&NativeLoader, &request, &argument)?;
            emit_json(&report_json::to_value(&InvokedReport::new(&request))?);
            Ok(RunOutcome::ok())
        }
        Command::Probe { library } => {
            let config = library.resolve()?;
            probe_entry_point(&NativeLoader, &config.library, &config.symbol, config.mode)?;
            emit_json(&report_json::to_value(&ResolvedReport::new(
                &config.library,
                &config.symbol,
                config.mode,
            ))?);
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut command = Cli::command();
            generate(shell, &mut command, "playbridge", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or("invalid arguments");
    first.trim_start_matches("error: ").trim().to_string()
}

fn add_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::TargetNotFound => err.with_hint("Check that the target path exists."),
        ErrorKind::LibraryLoadFailed => err.with_hint(
            "Point --library or PLAYBRIDGE_LIBRARY at a shared library built for this platform.",
        ),
        ErrorKind::SymbolNotFound => err.with_hint(
            "The library must export the symbol with default visibility; inspect it with `nm -D` (Linux) or `nm -gU` (macOS).",
        ),
        ErrorKind::Internal | ErrorKind::Usage => err,
    }
}

fn emit_json(value: &Value) {
    let json = serde_json::to_string(value)
        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::TargetNotFound => "target not found".to_string(),
        ErrorKind::LibraryLoadFailed => "unable to load library".to_string(),
        ErrorKind::SymbolNotFound => "unable to find symbol".to_string(),
    }
}

// The core copies loader text into the message; skip a cause that repeats it.
fn error_causes(err: &Error) -> Vec<String> {
    let message = error_message(err);
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        let text = source.to_string();
        if text != message {
            causes.push(text);
        }
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(symbol) = err.symbol() {
        inner.insert("symbol".to_string(), json!(symbol));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(symbol) = err.symbol() {
        lines.push(format!("symbol: {symbol}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    lines.join("\n")
}
