//! Purpose: JSON shapes printed on stdout by `play` and `probe`.
//! Exports: `InvokedReport`, `ResolvedReport`, `to_value`.
//! Invariants: Top-level key names the outcome (`invoked` / `resolved`); fields are additive-only.
use std::path::Path;

use playbridge::core::error::{Error, ErrorKind};
use playbridge::core::loader::LoadMode;
use playbridge::core::request::InvocationRequest;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct InvokedReport {
    invoked: InvokedBody,
}

#[derive(Debug, Serialize)]
struct InvokedBody {
    target: String,
    library: String,
    symbol: String,
    bind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
}

impl InvokedReport {
    pub fn new(request: &InvocationRequest) -> Self {
        Self {
            invoked: InvokedBody {
                target: request.target.display().to_string(),
                library: request.library.display().to_string(),
                symbol: request.symbol.clone(),
                bind: request.mode.as_str(),
                time: time_now(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResolvedReport {
    resolved: ResolvedBody,
}

#[derive(Debug, Serialize)]
struct ResolvedBody {
    library: String,
    symbol: String,
    bind: &'static str,
}

impl ResolvedReport {
    pub fn new(library: &Path, symbol: &str, mode: LoadMode) -> Self {
        Self {
            resolved: ResolvedBody {
                library: library.display().to_string(),
                symbol: symbol.to_string(),
                bind: mode.as_str(),
            },
        }
    }
}

pub fn to_value<T: Serialize>(report: &T) -> Result<Value, Error> {
    serde_json::to_value(report).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode report")
            .with_source(err)
    })
}

fn time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    time::OffsetDateTime::now_utc().format(&Rfc3339).ok()
}
