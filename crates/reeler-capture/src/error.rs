//! Error types for capture supervision.

use thiserror::Error;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors produced while starting or supervising captures.
///
/// The negotiation and spawn variants wrap the seam-level `anyhow` errors as
/// plain fields; rendering the chain is the caller's concern via
/// [`CaptureError::detail`].
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Negotiation with the platform failed for this target.
    #[error("capture negotiation failed")]
    Negotiation {
        /// Target whose negotiation failed.
        target: String,
        /// Underlying negotiation failure.
        reason: anyhow::Error,
    },
    /// The capture worker process could not be spawned.
    #[error("capture worker spawn failed")]
    Spawn {
        /// Target whose worker failed to spawn.
        target: String,
        /// Underlying spawn failure.
        reason: anyhow::Error,
    },
    /// A record for this target already exists in the registry.
    #[error("capture already active")]
    AlreadyActive {
        /// Target that is already being captured.
        target: String,
    },
}

impl CaptureError {
    /// Stage label used for failure metrics.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Negotiation { .. } => "negotiate",
            Self::Spawn { .. } => "spawn",
            Self::AlreadyActive { .. } => "registry",
        }
    }

    /// Human-readable failure description including the wrapped chain.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Negotiation { reason, .. } | Self::Spawn { reason, .. } => {
                format!("{reason:#}")
            }
            Self::AlreadyActive { target } => format!("capture already active for {target}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn stage_labels_cover_all_variants() {
        let negotiation = CaptureError::Negotiation {
            target: "alpha".into(),
            reason: anyhow!("offline"),
        };
        let spawn = CaptureError::Spawn {
            target: "alpha".into(),
            reason: anyhow!("no such binary"),
        };
        let registry = CaptureError::AlreadyActive {
            target: "alpha".into(),
        };
        assert_eq!(negotiation.stage(), "negotiate");
        assert_eq!(spawn.stage(), "spawn");
        assert_eq!(registry.stage(), "registry");
    }

    #[test]
    fn detail_renders_wrapped_chain() {
        let err = CaptureError::Negotiation {
            target: "alpha".into(),
            reason: anyhow!("socket closed").context("handshake aborted"),
        };
        let detail = err.detail();
        assert!(detail.contains("handshake aborted"));
        assert!(detail.contains("socket closed"));
    }
}
