//! Configuration of the bridge.
//!
//! Values are layered, later layers winning:
//!
//! 1. built-in defaults,
//! 2. the optional config file `libctehxk2` (`ctehxk2` on Windows) in the working directory,
//!    in any format the `config` crate recognises by extension (TOML, JSON, YAML, INI, ...),
//! 3. `K2_`-prefixed environment variables (empty values are ignored).
//!
//! ```toml
//! base_url = "http://localhost:8088/k2/ctapi/"
//! timeout = 10
//! log_level = "debug"
//! log_path = "/var/log/ctapi"
//! ctn = 1
//! pn = 1
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, Map};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

#[cfg(target_os = "windows")]
pub const CONFIG_FILE: &str = "ctehxk2";
#[cfg(not(target_os = "windows"))]
pub const CONFIG_FILE: &str = "libctehxk2";

pub const LOG_FILE: &str = "ctehxk2.log";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8088/k2/ctapi/";
pub const DEFAULT_LOG_LEVEL: &str = "error";

const ENV_PREFIX: &str = "K2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the backend's CT-API resources, always ending with a slash.
    pub base_url: Url,

    /// Whole-request timeout.
    pub timeout: Option<Duration>,

    pub log_level: String,

    /// Existing directory to write the log file into; stderr when absent.
    pub log_path: Option<PathBuf>,

    /// Terminal ids sent to the backend instead of the caller's.
    pub terminal_override: Option<(u16, u16)>,
}

/// Merged values before validation.
#[derive(Debug, Deserialize)]
struct Raw {
    base_url: String,
    timeout: Option<u64>,
    log_level: String,
    log_path: Option<PathBuf>,
    ctn: Option<u16>,
    pn: Option<u16>,
}

impl Settings {
    /// Loads the settings from the working directory and the process environment.
    pub fn load() -> Result<Self> {
        Self::from_sources(Some(Path::new(CONFIG_FILE)), None)
    }

    /// Loads the settings from an optional config file and environment.
    ///
    /// `file` is a path without extension; a missing file is not an error.
    /// `env` replaces the process environment when given.
    pub fn from_sources(file: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let raw = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .ignore_empty(true)
                    .source(env),
            )
            .build()?
            .try_deserialize::<Raw>()?;

        Self::resolve(raw)
    }

    fn resolve(raw: Raw) -> Result<Self> {
        let mut base_url = raw.base_url.trim().to_owned();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        if let Some(path) = &raw.log_path {
            if !path.is_dir() {
                return Err(Error::LogPathNotFound(path.clone()));
            }
        }

        Ok(Self {
            base_url,
            timeout: raw.timeout.map(Duration::from_secs),
            log_level: raw.log_level,
            log_path: raw.log_path,
            terminal_override: raw.ctn.zip(raw.pn),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: None,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            log_path: None,
            terminal_override: None,
        }
    }
}
