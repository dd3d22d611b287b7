//! # Design
//!
//! - Centralize application-level errors for bootstrap and the driver loop.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: reeler_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying telemetry failure.
        reason: anyhow::Error,
    },
    /// Site client operations failed.
    #[error("site client operation failed")]
    Site {
        /// Operation identifier.
        operation: &'static str,
        /// Source negotiation error.
        source: reeler_negotiate::NegotiateError,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Optional path involved in the failure.
        path: Option<PathBuf>,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: reeler_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(operation: &'static str, reason: anyhow::Error) -> Self {
        Self::Telemetry { operation, reason }
    }

    pub(crate) const fn site(
        operation: &'static str,
        source: reeler_negotiate::NegotiateError,
    ) -> Self {
        Self::Site { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: Some(path.into()),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn app_error_helpers_build_variants() {
        let config = AppError::config(
            "load",
            reeler_config::ConfigError::InvalidField {
                field: "scan_interval_secs",
                reason: "zero",
                value: None,
            },
        );
        assert!(matches!(config, AppError::Config { .. }));
        assert!(config.source().is_some());

        let telemetry = AppError::telemetry("init", anyhow::anyhow!("subscriber already set"));
        assert!(matches!(telemetry, AppError::Telemetry { .. }));

        let site = AppError::site("client.build", reeler_negotiate::NegotiateError::LoginRejected);
        assert!(matches!(site, AppError::Site { .. }));

        let io_err = AppError::io("create_dir", "/srv/capture", io::Error::other("io"));
        assert!(matches!(io_err, AppError::Io { .. }));
        assert!(io_err.source().is_some());
    }
}
