//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers used by bootstrap and the capture components.
//! - Keeps IO and default resolution in `loader.rs`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

const BYTES_PER_MEGABYTE: u64 = 1_048_576;

/// Fully resolved daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site login credentials.
    pub credentials: Credentials,
    /// Base URL of the streaming platform.
    pub site_url: String,
    /// Directory in-progress captures are written to.
    pub capture_directory: PathBuf,
    /// Directory finalized captures are relocated to.
    pub complete_directory: PathBuf,
    /// Seconds between scan cycles.
    pub scan_interval_secs: u64,
    /// Minimum retained artifact size in megabytes.
    pub min_file_size_mb: u64,
    /// External capture binary invoked per worker.
    pub worker_binary: String,
    /// Forward worker output at info level instead of suppressing it.
    pub worker_verbose: bool,
    /// Lower the default log filter to debug.
    pub debug: bool,
    /// Timestamp format used in output filenames.
    pub timestamp_format: String,
    /// Allow-list of target glob patterns; empty admits every target.
    pub targets: Vec<String>,
    /// Nest finalized files in a per-target subdirectory.
    pub per_target_subdir: bool,
}

impl AppConfig {
    /// Minimum retained artifact size converted to bytes.
    #[must_use]
    pub const fn min_file_size_bytes(&self) -> u64 {
        self.min_file_size_mb.saturating_mul(BYTES_PER_MEGABYTE)
    }

    /// Interval between scan cycles.
    #[must_use]
    pub const fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// Compile the target allow-list into a matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured pattern fails to compile.
    pub fn allow_list(&self) -> ConfigResult<TargetAllowList> {
        TargetAllowList::compile(&self.targets)
    }
}

/// Site login credentials.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account email used for the login form.
    pub email: String,
    /// Account password used for the login form.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Compiled allow-list deciding which online targets are eligible for capture.
#[derive(Debug, Clone)]
pub struct TargetAllowList {
    set: Option<GlobSet>,
}

impl TargetAllowList {
    /// Compile a set of glob patterns; an empty set admits everything.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn compile(patterns: &[String]) -> ConfigResult<Self> {
        if patterns.is_empty() {
            return Ok(Self { set: None });
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| ConfigError::Glob {
            pattern: patterns.join(","),
            source,
        })?;
        Ok(Self { set: Some(set) })
    }

    /// Whether the given target is eligible for capture.
    #[must_use]
    pub fn permits(&self, target: &str) -> bool {
        self.set.as_ref().is_none_or(|set| set.is_match(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_permits_everything() {
        let allow = TargetAllowList::compile(&[]).expect("compile empty list");
        assert!(allow.permits("anyone"));
    }

    #[test]
    fn allow_list_matches_globs() {
        let patterns = vec!["alpha".to_string(), "beta_*".to_string()];
        let allow = TargetAllowList::compile(&patterns).expect("compile patterns");
        assert!(allow.permits("alpha"));
        assert!(allow.permits("beta_one"));
        assert!(!allow.permits("gamma"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let patterns = vec!["[".to_string()];
        let err = TargetAllowList::compile(&patterns).expect_err("expected glob error");
        assert!(matches!(err, ConfigError::Glob { .. }));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials {
            email: "user@example.com".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("user@example.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn size_conversion_is_inclusive_of_megabyte_boundary() {
        let config = AppConfig {
            credentials: Credentials {
                email: "user@example.com".into(),
                password: "secret".into(),
            },
            site_url: "https://example.com".into(),
            capture_directory: PathBuf::from("./capture"),
            complete_directory: PathBuf::from("./complete"),
            scan_interval_secs: 30,
            min_file_size_mb: 5,
            worker_binary: "rtmpdump".into(),
            worker_verbose: false,
            debug: false,
            timestamp_format: "%Y-%m-%dT%H%M%S".into(),
            targets: Vec::new(),
            per_target_subdir: false,
        };
        assert_eq!(config.min_file_size_bytes(), 5 * 1_048_576);
        assert_eq!(config.scan_interval(), Duration::from_secs(30));
    }
}
