//! Typed domain events and their envelope.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier assigned to each event emitted by the daemon.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub(crate) const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed domain events surfaced across the system.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A scan cycle started.
    ScanStarted {
        /// Monotonic cycle counter, starting at one.
        cycle: u64,
    },
    /// The resolver produced this cycle's candidate set.
    TargetsResolved {
        /// Cycle the resolution belongs to.
        cycle: u64,
        /// Targets admitted by the allow-list this cycle.
        eligible: usize,
    },
    /// A capture worker was spawned and registered.
    CaptureStarted {
        /// Identifier of this capture attempt.
        capture_id: Uuid,
        /// Target being captured.
        target: String,
        /// File the worker writes to.
        output_path: String,
    },
    /// A health check observed output growth.
    CaptureProgress {
        /// Identifier of this capture attempt.
        capture_id: Uuid,
        /// Target being captured.
        target: String,
        /// Sampled output size in bytes.
        bytes: u64,
    },
    /// A health check observed no growth and terminated the worker.
    CaptureStalled {
        /// Identifier of this capture attempt.
        capture_id: Uuid,
        /// Target being captured.
        target: String,
        /// Last sampled output size in bytes.
        bytes: u64,
    },
    /// A capture worker exited and was removed from the registry.
    CaptureEnded {
        /// Identifier of this capture attempt.
        capture_id: Uuid,
        /// Target that was being captured.
        target: String,
    },
    /// Negotiation for a target failed; it will be retried next cycle.
    NegotiationFailed {
        /// Target whose negotiation failed.
        target: String,
        /// Human-readable failure description.
        reason: String,
    },
    /// An undersized artifact was discarded by the finalizer.
    FinalizeDiscarded {
        /// Identifier of the finished capture.
        capture_id: Uuid,
        /// Target that was being captured.
        target: String,
        /// Size of the discarded artifact.
        bytes: u64,
    },
    /// A finished artifact was relocated to the completed directory.
    FinalizeRelocated {
        /// Identifier of the finished capture.
        capture_id: Uuid,
        /// Target that was being captured.
        target: String,
        /// Destination the artifact was moved to.
        destination: String,
    },
    /// Finalization failed; the artifact was left in place.
    FinalizeFailed {
        /// Identifier of the finished capture.
        capture_id: Uuid,
        /// Target that was being captured.
        target: String,
        /// Human-readable failure description.
        message: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for metrics and log filtering.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ScanStarted { .. } => "scan_started",
            Self::TargetsResolved { .. } => "targets_resolved",
            Self::CaptureStarted { .. } => "capture_started",
            Self::CaptureProgress { .. } => "capture_progress",
            Self::CaptureStalled { .. } => "capture_stalled",
            Self::CaptureEnded { .. } => "capture_ended",
            Self::NegotiationFailed { .. } => "negotiation_failed",
            Self::FinalizeDiscarded { .. } => "finalize_discarded",
            Self::FinalizeRelocated { .. } => "finalize_relocated",
            Self::FinalizeFailed { .. } => "finalize_failed",
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EventEnvelope {
    /// Sequential identifier assigned by the bus.
    pub id: EventId,
    /// Wall-clock emission time.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub event: Event,
}
