//! Validation helpers for resolved configuration.

use chrono::format::{Item, StrftimeItems};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppConfig, TargetAllowList};

/// Validate a resolved configuration.
///
/// # Errors
///
/// Returns the first validation failure encountered.
pub fn validate(config: &AppConfig) -> ConfigResult<()> {
    ensure_non_empty("credentials.email", &config.credentials.email)?;
    ensure_non_empty("credentials.password", &config.credentials.password)?;
    ensure_non_empty("site_url", &config.site_url)?;
    ensure_non_empty(
        "capture_directory",
        &config.capture_directory.to_string_lossy(),
    )?;
    ensure_non_empty(
        "complete_directory",
        &config.complete_directory.to_string_lossy(),
    )?;

    if config.scan_interval_secs == 0 {
        return Err(ConfigError::InvalidField {
            field: "scan_interval_secs",
            reason: "zero",
            value: Some(config.scan_interval_secs.to_string()),
        });
    }

    ensure_timestamp_format(&config.timestamp_format)?;

    // Compiling here surfaces bad patterns at startup instead of first use.
    let _ = TargetAllowList::compile(&config.targets)?;

    Ok(())
}

fn ensure_non_empty(field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field,
            reason: "empty",
            value: Some(value.to_string()),
        });
    }
    Ok(())
}

fn ensure_timestamp_format(format: &str) -> ConfigResult<()> {
    if format.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "timestamp_format",
            reason: "empty",
            value: Some(format.to_string()),
        });
    }
    let invalid = StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    if invalid {
        return Err(ConfigError::InvalidField {
            field: "timestamp_format",
            reason: "unparseable",
            value: Some(format.to_string()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Credentials;
    use std::path::PathBuf;

    fn sample_config() -> AppConfig {
        AppConfig {
            credentials: Credentials {
                email: "user@example.com".into(),
                password: "secret".into(),
            },
            site_url: "https://stream.example".into(),
            capture_directory: PathBuf::from("./capture"),
            complete_directory: PathBuf::from("./complete"),
            scan_interval_secs: 30,
            min_file_size_mb: 0,
            worker_binary: "rtmpdump".into(),
            worker_verbose: false,
            debug: false,
            timestamp_format: "%Y-%m-%dT%H%M%S".into(),
            targets: Vec::new(),
            per_target_subdir: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        validate(&sample_config()).expect("sample config validates");
    }

    #[test]
    fn zero_scan_interval_is_rejected() {
        let mut config = sample_config();
        config.scan_interval_secs = 0;
        let err = validate(&config).expect_err("zero interval should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "scan_interval_secs",
                ..
            }
        ));
    }

    #[test]
    fn blank_directory_is_rejected() {
        let mut config = sample_config();
        config.capture_directory = PathBuf::from("   ");
        let err = validate(&config).expect_err("blank directory should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "capture_directory",
                ..
            }
        ));
    }

    #[test]
    fn bad_timestamp_format_is_rejected() {
        let mut config = sample_config();
        config.timestamp_format = "%Q".into();
        let err = validate(&config).expect_err("bad format should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "timestamp_format",
                ..
            }
        ));
    }

    #[test]
    fn bad_allow_list_pattern_is_rejected() {
        let mut config = sample_config();
        config.targets = vec!["[".into()];
        let err = validate(&config).expect_err("bad pattern should fail");
        assert!(matches!(err, ConfigError::Glob { .. }));
    }
}
