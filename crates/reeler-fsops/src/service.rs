//! Finalization pipeline applied when a capture worker exits.

use std::io;
use std::path::{Path, PathBuf};

use reeler_events::{Event, EventBus};
use reeler_telemetry::Metrics;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};

/// Immutable inputs for finalizing one ended capture.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    /// Identifier of the capture attempt that produced the artifact.
    pub capture_id: Uuid,
    /// Target the capture belonged to.
    pub target: String,
    /// Path the worker was writing to.
    pub source_path: PathBuf,
    /// Path the artifact should end up at when retained.
    pub destination_path: PathBuf,
    /// Inclusive discard threshold in bytes.
    pub min_size_bytes: u64,
}

/// Terminal state of one finalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The worker never produced a file; nothing to do.
    Missing,
    /// The artifact was at or under the threshold and was deleted.
    Discarded {
        /// Size of the discarded artifact.
        bytes: u64,
    },
    /// The artifact was moved to its destination.
    Relocated {
        /// Size of the relocated artifact.
        bytes: u64,
    },
    /// Finalization failed; the artifact was left where it was.
    Failed,
}

impl FinalizeOutcome {
    /// Metrics label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Discarded { .. } => "discarded",
            Self::Relocated { .. } => "relocated",
            Self::Failed => "failed",
        }
    }
}

/// Service responsible for retaining or discarding capture artifacts.
#[derive(Clone)]
pub struct FinalizeService {
    events: EventBus,
    metrics: Metrics,
}

impl FinalizeService {
    /// Construct a new finalize service backed by the shared event bus.
    #[must_use]
    pub const fn new(events: EventBus, metrics: Metrics) -> Self {
        Self { events, metrics }
    }

    /// Apply the retention policy to one ended capture.
    ///
    /// Failures are logged and reported through the event bus, never
    /// escalated to the caller.
    pub async fn finalize(&self, request: FinalizeRequest) -> FinalizeOutcome {
        let outcome = match self.execute(&request).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    target_name = %request.target,
                    capture_id = %request.capture_id,
                    error = %error,
                    path = %request.source_path.display(),
                    "finalization failed; artifact left in place"
                );
                self.events.send(Event::FinalizeFailed {
                    capture_id: request.capture_id,
                    target: request.target.clone(),
                    message: error.to_string(),
                });
                FinalizeOutcome::Failed
            }
        };

        match outcome {
            FinalizeOutcome::Missing => {
                debug!(
                    target_name = %request.target,
                    capture_id = %request.capture_id,
                    path = %request.source_path.display(),
                    "no artifact produced; nothing to finalize"
                );
            }
            FinalizeOutcome::Discarded { bytes } => {
                info!(
                    target_name = %request.target,
                    capture_id = %request.capture_id,
                    bytes,
                    threshold = request.min_size_bytes,
                    "discarded undersized capture artifact"
                );
                self.events.send(Event::FinalizeDiscarded {
                    capture_id: request.capture_id,
                    target: request.target.clone(),
                    bytes,
                });
            }
            FinalizeOutcome::Relocated { bytes } => {
                info!(
                    target_name = %request.target,
                    capture_id = %request.capture_id,
                    bytes,
                    destination = %request.destination_path.display(),
                    "relocated finished capture artifact"
                );
                self.events.send(Event::FinalizeRelocated {
                    capture_id: request.capture_id,
                    target: request.target.clone(),
                    destination: request.destination_path.display().to_string(),
                });
            }
            FinalizeOutcome::Failed => {}
        }

        self.metrics.inc_finalize_outcome(outcome.as_str());
        outcome
    }

    async fn execute(&self, request: &FinalizeRequest) -> FsOpsResult<FinalizeOutcome> {
        let metadata = match fs::metadata(&request.source_path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(FinalizeOutcome::Missing);
            }
            Err(err) => {
                return Err(FsOpsError::io("finalize.stat", &request.source_path, err));
            }
        };

        let bytes = metadata.len();
        if bytes <= request.min_size_bytes {
            fs::remove_file(&request.source_path)
                .await
                .map_err(|err| FsOpsError::io("finalize.discard", &request.source_path, err))?;
            return Ok(FinalizeOutcome::Discarded { bytes });
        }

        Self::relocate(&request.source_path, &request.destination_path).await?;
        Ok(FinalizeOutcome::Relocated { bytes })
    }

    async fn relocate(source: &Path, destination: &Path) -> FsOpsResult<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| FsOpsError::io("relocate.create_parent", parent, err))?;
        }

        match fs::rename(source, destination).await {
            Ok(()) => Ok(()),
            Err(_rename_err) => {
                // Rename fails across filesystems; fall back to copy-then-remove.
                fs::copy(source, destination)
                    .await
                    .map_err(|err| FsOpsError::io("relocate.copy", destination, err))?;
                fs::remove_file(source)
                    .await
                    .map_err(|err| FsOpsError::io("relocate.cleanup", source, err))?;
                Ok(())
            }
        }
    }
}
