//! Error types for platform negotiation.

use thiserror::Error;

/// Result type for negotiation operations.
pub type NegotiateResult<T> = Result<T, NegotiateError>;

/// Errors produced while talking to the streaming platform.
#[derive(Debug, Error)]
pub enum NegotiateError {
    /// HTTP request failures against the site.
    #[error("negotiation http failure")]
    Http {
        /// Operation that triggered the HTTP failure.
        operation: &'static str,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// Websocket failures during the push-protocol handshake.
    #[error("negotiation websocket failure")]
    WebSocket {
        /// Operation that triggered the websocket failure.
        operation: &'static str,
        /// Underlying websocket error.
        source: tokio_tungstenite::tungstenite::Error,
    },
    /// JSON payloads that failed to parse.
    #[error("negotiation json failure")]
    Json {
        /// Operation that triggered the JSON failure.
        operation: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// An expected marker was absent from the fetched page.
    #[error("negotiation parameter not found")]
    ParameterNotFound {
        /// Name of the missing marker.
        marker: &'static str,
    },
    /// The site rejected the configured credentials.
    #[error("site login rejected")]
    LoginRejected,
    /// The online listing could not be interpreted.
    #[error("online listing unavailable")]
    ListingUnavailable {
        /// Static reason the listing was unusable.
        reason: &'static str,
    },
    /// The platform reported the target as offline.
    #[error("target is offline")]
    Offline {
        /// Target the platform reported offline.
        target: String,
    },
    /// Another session already exists for the target.
    #[error("another session already joined the target")]
    AlreadyJoined {
        /// Target with a duplicate session.
        target: String,
    },
    /// The peer violated the expected frame protocol.
    #[error("negotiation protocol violation")]
    Protocol {
        /// Static reason describing the violation.
        reason: &'static str,
    },
    /// The overall negotiation deadline elapsed.
    #[error("negotiation timed out")]
    Timeout {
        /// Operation that exceeded the deadline.
        operation: String,
        /// Deadline in seconds.
        after_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_constant() {
        let err = NegotiateError::Offline {
            target: "alpha".into(),
        };
        assert_eq!(err.to_string(), "target is offline");

        let err = NegotiateError::ParameterNotFound {
            marker: "user.uid",
        };
        assert_eq!(err.to_string(), "negotiation parameter not found");
    }
}
