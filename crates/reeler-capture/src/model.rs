//! Capture domain models.
//!
//! # Design
//! - Pure data carriers shared between the supervisor, the negotiation layer,
//!   and the driver loop.
//! - The registry record itself stays crate-private; only the supervisor
//!   mutates it.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::worker::WorkerHandle;

/// Delay before the first health check of a freshly started capture.
pub const INITIAL_CHECK_DELAY: Duration = Duration::from_secs(60);

/// Interval between health checks once a capture has shown growth.
pub const STEADY_CHECK_INTERVAL: Duration = Duration::from_secs(600);

/// Stream connection parameters negotiated for one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDescriptor {
    /// Media server the worker should pull from.
    pub server_address: String,
    /// Play path token granting access to the stream.
    pub play_path: String,
}

/// One entry of the resolver's candidate set.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Target name as listed by the platform.
    pub name: String,
    /// Upstream descriptor usable directly, bypassing negotiation.
    pub descriptor_hint: Option<CaptureDescriptor>,
}

impl ResolvedTarget {
    /// Candidate that still needs negotiation.
    #[must_use]
    pub const fn named(name: String) -> Self {
        Self {
            name,
            descriptor_hint: None,
        }
    }
}

/// Settings the supervisor needs to start and finalize captures.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Directory in-progress captures are written to.
    pub capture_directory: PathBuf,
    /// Directory finalized captures are relocated to.
    pub complete_directory: PathBuf,
    /// Inclusive discard threshold in bytes.
    pub min_file_size_bytes: u64,
    /// Timestamp format used in output filenames.
    pub timestamp_format: String,
    /// Nest finalized files in a per-target subdirectory.
    pub per_target_subdir: bool,
}

/// Read-only view of one in-flight capture, for status dumps.
#[derive(Debug, Clone)]
pub struct CaptureStatus {
    /// Identifier of the capture attempt.
    pub capture_id: Uuid,
    /// Target being captured.
    pub target: String,
    /// Process identifier of the worker.
    pub pid: u32,
    /// File the worker writes to.
    pub output_path: PathBuf,
    /// Last sampled output size in bytes.
    pub last_observed_size: u64,
    /// Time remaining until the next health check.
    pub check_due_in: Duration,
}

/// Registry entry for one in-flight capture.
///
/// Invariant: a record exists only while its worker handle is live; it is
/// inserted after a confirmed spawn and removed only by the worker's exit
/// notification.
pub(crate) struct CaptureRecord {
    pub(crate) capture_id: Uuid,
    pub(crate) target: String,
    pub(crate) output_path: PathBuf,
    pub(crate) last_observed_size: u64,
    pub(crate) next_check_at: Instant,
    pub(crate) worker: WorkerHandle,
}
