//! Purpose: Resolve library path, symbol, and bind mode for the ABI export and the CLI.
//! Exports: `BridgeConfig`, env var names, `default_library_path`.
//! Role: Single source of defaults so the exported `playAudio` and the CLI agree.
//! Invariants: Precedence is explicit value, then environment, then built-in default.
//! Invariants: Empty environment values count as unset.
use std::ffi::OsString;
use std::path::PathBuf;

use crate::core::error::{Error, ErrorKind};
use crate::core::loader::LoadMode;
use crate::core::request::DEFAULT_SYMBOL;

pub const LIBRARY_ENV: &str = "PLAYBRIDGE_LIBRARY";
pub const SYMBOL_ENV: &str = "PLAYBRIDGE_SYMBOL";
pub const BIND_ENV: &str = "PLAYBRIDGE_BIND";
pub const LOG_ENV: &str = "PLAYBRIDGE_LOG";

/// Base name of the playback library; the platform prefix and suffix are added.
pub const LIBRARY_STEM: &str = "OSPort";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BridgeConfig {
    pub library: PathBuf,
    pub symbol: String,
    pub mode: LoadMode,
}

/// Values read from the process environment.
#[derive(Clone, Debug, Default)]
pub struct EnvValues {
    pub library: Option<OsString>,
    pub symbol: Option<String>,
    pub bind: Option<String>,
}

impl EnvValues {
    pub fn from_process() -> Self {
        Self {
            library: std::env::var_os(LIBRARY_ENV),
            symbol: std::env::var(SYMBOL_ENV).ok(),
            bind: std::env::var(BIND_ENV).ok(),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::resolve(None, None, None, EnvValues::from_process())
    }

    pub fn resolve(
        library: Option<PathBuf>,
        symbol: Option<String>,
        mode: Option<LoadMode>,
        env: EnvValues,
    ) -> Result<Self, Error> {
        let library = library
            .or_else(|| non_empty_os(env.library).map(PathBuf::from))
            .unwrap_or_else(default_library_path);
        let symbol = symbol
            .or_else(|| non_empty(env.symbol))
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
        let mode = match (mode, non_empty(env.bind)) {
            (Some(mode), _) => mode,
            (None, Some(raw)) => LoadMode::parse(&raw).ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("invalid {BIND_ENV} value: {raw}"))
                    .with_hint("Use `now` or `lazy`.")
            })?,
            (None, None) => LoadMode::default(),
        };
        if symbol.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("symbol name is empty"));
        }
        Ok(Self {
            library,
            symbol,
            mode,
        })
    }
}

/// `~/.playbridge/lib/<libOSPort.so | libOSPort.dylib | OSPort.dll>`.
pub fn default_library_path() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home)
        .join(".playbridge")
        .join("lib")
        .join(libloading::library_filename(LIBRARY_STEM))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn non_empty_os(value: Option<OsString>) -> Option<OsString> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{BridgeConfig, EnvValues, default_library_path};
    use crate::core::error::ErrorKind;
    use crate::core::loader::LoadMode;
    use std::path::PathBuf;

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let config = BridgeConfig::resolve(None, None, None, EnvValues::default()).expect("config");
        assert_eq!(config.library, default_library_path());
        assert_eq!(config.symbol, "av_playAudio");
        assert_eq!(config.mode, LoadMode::Now);
    }

    #[test]
    fn default_library_uses_platform_file_name() {
        let path = default_library_path();
        let name = path.file_name().and_then(|name| name.to_str()).expect("name");
        assert!(name.contains("OSPort"));
        assert!(path.parent().expect("parent").ends_with(".playbridge/lib"));
    }

    #[test]
    fn env_overrides_defaults() {
        let env = EnvValues {
            library: Some("/opt/audio/libOSPort.so".into()),
            symbol: Some("av_playAudioV2".to_string()),
            bind: Some("lazy".to_string()),
        };
        let config = BridgeConfig::resolve(None, None, None, env).expect("config");
        assert_eq!(config.library, PathBuf::from("/opt/audio/libOSPort.so"));
        assert_eq!(config.symbol, "av_playAudioV2");
        assert_eq!(config.mode, LoadMode::Lazy);
    }

    #[test]
    fn explicit_values_override_env() {
        let env = EnvValues {
            library: Some("/opt/audio/libOSPort.so".into()),
            symbol: Some("av_playAudioV2".to_string()),
            bind: Some("not-a-mode".to_string()),
        };
        let config = BridgeConfig::resolve(
            Some(PathBuf::from("/tmp/libfixture.so")),
            Some("av_playAudio".to_string()),
            Some(LoadMode::Now),
            env,
        )
        .expect("config");
        assert_eq!(config.library, PathBuf::from("/tmp/libfixture.so"));
        assert_eq!(config.symbol, "av_playAudio");
        assert_eq!(config.mode, LoadMode::Now);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let env = EnvValues {
            library: Some("".into()),
            symbol: Some("  ".to_string()),
            bind: Some(String::new()),
        };
        let config = BridgeConfig::resolve(None, None, None, env).expect("config");
        assert_eq!(config.library, default_library_path());
        assert_eq!(config.symbol, "av_playAudio");
    }

    #[test]
    fn invalid_bind_env_is_usage_error() {
        let env = EnvValues {
            bind: Some("eager".to_string()),
            ..EnvValues::default()
        };
        let err = BridgeConfig::resolve(None, None, None, env).expect_err("bind");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn empty_explicit_symbol_is_rejected() {
        let err = BridgeConfig::resolve(None, Some(String::new()), None, EnvValues::default())
            .expect_err("symbol");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
