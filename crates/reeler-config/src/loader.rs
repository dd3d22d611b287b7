//! YAML configuration loading and default resolution.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppConfig, Credentials};
use crate::validate::validate;

/// On-disk configuration shape. Every field other than the credentials is
/// optional and falls back to the values in [`defaults`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    credentials: RawCredentials,
    site_url: Option<String>,
    capture_directory: Option<PathBuf>,
    complete_directory: Option<PathBuf>,
    scan_interval_secs: Option<u64>,
    min_file_size_mb: Option<u64>,
    worker_binary: Option<String>,
    worker_verbose: Option<bool>,
    debug: Option<bool>,
    timestamp_format: Option<String>,
    #[serde(default)]
    targets: Vec<String>,
    per_target_subdir: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCredentials {
    email: String,
    password: String,
}

impl RawConfig {
    fn resolve(self) -> AppConfig {
        AppConfig {
            credentials: Credentials {
                email: self.credentials.email,
                password: self.credentials.password,
            },
            site_url: self
                .site_url
                .unwrap_or_else(|| defaults::SITE_URL.to_string()),
            capture_directory: self
                .capture_directory
                .unwrap_or_else(|| PathBuf::from(defaults::CAPTURE_DIRECTORY)),
            complete_directory: self
                .complete_directory
                .unwrap_or_else(|| PathBuf::from(defaults::COMPLETE_DIRECTORY)),
            scan_interval_secs: self.scan_interval_secs.unwrap_or(defaults::SCAN_INTERVAL_SECS),
            min_file_size_mb: self.min_file_size_mb.unwrap_or(defaults::MIN_FILE_SIZE_MB),
            worker_binary: self
                .worker_binary
                .unwrap_or_else(|| defaults::WORKER_BINARY.to_string()),
            worker_verbose: self.worker_verbose.unwrap_or(false),
            debug: self.debug.unwrap_or(false),
            timestamp_format: self
                .timestamp_format
                .unwrap_or_else(|| defaults::TIMESTAMP_FORMAT.to_string()),
            targets: self.targets,
            per_target_subdir: self.per_target_subdir.unwrap_or(false),
        }
    }
}

/// Load, resolve, and validate the configuration file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails to parse, or fails
/// validation.
pub async fn load(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::io("loader.read", path, source))?;
    parse(path, &text)
}

/// Parse a configuration document from an in-memory YAML string.
///
/// # Errors
///
/// Returns an error if the document fails to parse or fails validation.
pub fn from_yaml(text: &str) -> ConfigResult<AppConfig> {
    parse(Path::new("<inline>"), text)
}

fn parse(path: &Path, text: &str) -> ConfigResult<AppConfig> {
    let raw: RawConfig =
        serde_yaml::from_str(text).map_err(|source| ConfigError::yaml(path, source))?;
    let config = raw.resolve();
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
credentials:
  email: user@example.com
  password: secret
";

    #[test]
    fn minimal_document_resolves_defaults() {
        let config = from_yaml(MINIMAL).expect("minimal config loads");
        assert_eq!(config.site_url, defaults::SITE_URL);
        assert_eq!(
            config.capture_directory,
            PathBuf::from(defaults::CAPTURE_DIRECTORY)
        );
        assert_eq!(
            config.complete_directory,
            PathBuf::from(defaults::COMPLETE_DIRECTORY)
        );
        assert_eq!(config.scan_interval_secs, defaults::SCAN_INTERVAL_SECS);
        assert_eq!(config.min_file_size_mb, defaults::MIN_FILE_SIZE_MB);
        assert_eq!(config.worker_binary, defaults::WORKER_BINARY);
        assert_eq!(config.timestamp_format, defaults::TIMESTAMP_FORMAT);
        assert!(config.targets.is_empty());
        assert!(!config.worker_verbose);
        assert!(!config.debug);
        assert!(!config.per_target_subdir);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let text = "\
credentials:
  email: user@example.com
  password: secret
site_url: https://stream.example
capture_directory: /srv/capture
complete_directory: /srv/complete
scan_interval_secs: 45
min_file_size_mb: 5
worker_binary: rtmpdump-ng
worker_verbose: true
debug: true
timestamp_format: \"%Y%m%d-%H%M%S\"
targets:
  - alpha
  - beta_*
per_target_subdir: true
";
        let config = from_yaml(text).expect("explicit config loads");
        assert_eq!(config.site_url, "https://stream.example");
        assert_eq!(config.capture_directory, PathBuf::from("/srv/capture"));
        assert_eq!(config.scan_interval_secs, 45);
        assert_eq!(config.min_file_size_mb, 5);
        assert_eq!(config.worker_binary, "rtmpdump-ng");
        assert!(config.worker_verbose);
        assert!(config.debug);
        assert_eq!(config.targets, vec!["alpha", "beta_*"]);
        assert!(config.per_target_subdir);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = "\
credentials:
  email: user@example.com
  password: secret
surprise: true
";
        let err = from_yaml(text).expect_err("unknown field should fail");
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = from_yaml("site_url: https://stream.example\n")
            .expect_err("missing credentials should fail");
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
