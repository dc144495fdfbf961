//! Runtime configuration for the tailing agent.
//!
//! Configuration is static and loaded once at startup from a TOML file. When no
//! path is given, `<config_dir>/rtail/config.toml` is used if it exists and the
//! built-in defaults otherwise.
//!
//! ```toml
//! read_buffer_bytes     = 65536
//! max_read_bytes        = 5120000
//! line_delimiter        = "\n"
//! allowed_log_locations = ["/var/log"]
//! bind                  = "127.0.0.1:3000"
//! stream_capacity       = 16
//! debug                 = false
//! ```

use crate::error::{Result, TailError};
use crate::tail::TailSettings;
use serde::{Deserialize, Deserializer};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Hard cap on a single chunk read, whatever the configured buffer size
pub const MAX_READ_BYTES: usize = 5_120_000;

/// Top-level agent configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Size of each backward chunk read, in bytes
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,

    /// Upper bound applied to `read_buffer_bytes`
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: usize,

    /// Single byte separating lines, written as a one-character string
    #[serde(
        default = "default_line_delimiter",
        deserialize_with = "deserialize_delimiter"
    )]
    pub line_delimiter: u8,

    /// Directories whose files (recursively) may be tailed
    #[serde(default = "default_allowed_log_locations")]
    pub allowed_log_locations: Vec<PathBuf>,

    /// Listen address of the HTTP agent
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// How many response chunks may queue before the reader is paused
    #[serde(default = "default_stream_capacity")]
    pub stream_capacity: usize,

    /// Record first/last lines of each tail and log them at completion
    #[serde(default)]
    pub debug: bool,
}

fn default_read_buffer_bytes() -> usize {
    64 * 1024
}
fn default_max_read_bytes() -> usize {
    MAX_READ_BYTES
}
fn default_line_delimiter() -> u8 {
    b'\n'
}
fn default_allowed_log_locations() -> Vec<PathBuf> {
    vec![PathBuf::from("/var/log")]
}
fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}
fn default_stream_capacity() -> usize {
    16
}

fn deserialize_delimiter<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(serde::de::Error::custom(format!(
            "line_delimiter must be exactly one byte, got {raw:?}"
        ))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_buffer_bytes: default_read_buffer_bytes(),
            max_read_bytes: default_max_read_bytes(),
            line_delimiter: default_line_delimiter(),
            allowed_log_locations: default_allowed_log_locations(),
            bind: default_bind(),
            stream_capacity: default_stream_capacity(),
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default location is optional and
    /// falls back to [`Config::default`] when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    log::debug!("no configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            TailError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&raw)
            .map_err(|e| TailError::config(format!("{}: {e}", path.display())))?;

        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| TailError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the reader or the server cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_bytes == 0 {
            return Err(TailError::config("read_buffer_bytes must be positive"));
        }
        if self.max_read_bytes == 0 {
            return Err(TailError::config("max_read_bytes must be positive"));
        }
        if self.stream_capacity == 0 {
            return Err(TailError::config("stream_capacity must be positive"));
        }
        if self.allowed_log_locations.is_empty() {
            log::warn!("allowed_log_locations is empty, no log file can be tailed");
        }
        Ok(())
    }

    /// Reader settings derived from this configuration
    pub fn tail_settings(&self) -> TailSettings {
        TailSettings {
            buffer_size: self.read_buffer_bytes,
            max_read_bytes: self.max_read_bytes,
            delimiter: self.line_delimiter,
        }
    }
}

/// `<config_dir>/rtail/config.toml`, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rtail").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.read_buffer_bytes, 65536);
        assert_eq!(config.max_read_bytes, MAX_READ_BYTES);
        assert_eq!(config.line_delimiter, b'\n');
        assert_eq!(config.bind.port(), 3000);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            read_buffer_bytes = 1024
            allowed_log_locations = ["logs", "/srv/app/logs"]
            debug = true
            "#,
        )
        .unwrap();

        assert_eq!(config.read_buffer_bytes, 1024);
        assert_eq!(config.max_read_bytes, MAX_READ_BYTES);
        assert_eq!(
            config.allowed_log_locations,
            vec![PathBuf::from("logs"), PathBuf::from("/srv/app/logs")]
        );
        assert!(config.debug);

        let settings = config.tail_settings();
        assert_eq!(settings.buffer_size, 1024);
        assert_eq!(settings.delimiter, b'\n');
    }

    #[test]
    fn test_custom_delimiter() {
        let config = Config::from_toml_str(r#"line_delimiter = "|""#).unwrap();
        assert_eq!(config.line_delimiter, b'|');
    }

    #[test]
    fn test_multi_byte_delimiter_rejected() {
        let result = Config::from_toml_str(r#"line_delimiter = "\r\n""#);
        match result {
            Err(TailError::Config { message }) => {
                assert!(message.contains("exactly one byte"), "{message}");
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_buffer_rejected() {
        assert!(Config::from_toml_str("read_buffer_bytes = 0").is_err());
        assert!(Config::from_toml_str("stream_capacity = 0").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml_str("read_buffer_size = 10").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "bind = \"0.0.0.0:8080\"").unwrap();
        writeln!(file, "max_read_bytes = 4096").unwrap();
        file.flush().unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.max_read_bytes, 4096);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/this/config/does/not/exist.toml")));
        assert!(matches!(result, Err(TailError::Config { .. })));
    }
}
