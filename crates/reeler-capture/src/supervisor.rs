//! Registry ownership and capture lifecycle supervision.
//!
//! The supervisor owns the only mutable cross-cycle state in the daemon: the
//! registry of in-flight captures. All mutations (insert on spawn, field
//! updates on health check, removal on worker exit) are serialized through a
//! single async mutex, so a record can never be health-checked after its
//! removal has started, and removal happens-before any successor insert for
//! the same target.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use futures_util::future::join_all;
use reeler_events::{Event, EventBus};
use reeler_fsops::{FinalizeRequest, FinalizeService};
use reeler_telemetry::Metrics;
use tokio::fs;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::StreamNegotiator;
use crate::error::{CaptureError, CaptureResult};
use crate::model::{
    CaptureRecord, CaptureSettings, CaptureStatus, INITIAL_CHECK_DELAY, ResolvedTarget,
    STEADY_CHECK_INTERVAL,
};
use crate::worker::{WorkerExit, WorkerLauncher, WorkerRequest};

/// Owns the live registry of in-flight captures and drives their lifecycle.
pub struct CaptureSupervisor {
    registry: Mutex<HashMap<String, CaptureRecord>>,
    negotiator: Arc<dyn StreamNegotiator>,
    launcher: Arc<dyn WorkerLauncher>,
    finalizer: FinalizeService,
    events: EventBus,
    metrics: Metrics,
    settings: CaptureSettings,
}

impl CaptureSupervisor {
    /// Construct a supervisor with shared dependencies and an empty registry.
    #[must_use]
    pub fn new(
        negotiator: Arc<dyn StreamNegotiator>,
        launcher: Arc<dyn WorkerLauncher>,
        finalizer: FinalizeService,
        events: EventBus,
        metrics: Metrics,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            negotiator,
            launcher,
            finalizer,
            events,
            metrics,
            settings,
        }
    }

    /// Start captures for every candidate target not already in the registry.
    ///
    /// Presence in the registry is the sole deduplication mechanism; targets
    /// already being captured are skipped silently. Negotiations for the
    /// remaining candidates run concurrently so one stuck target cannot
    /// serialize the batch, and each attempt fails in isolation.
    pub async fn reconcile(&self, candidates: Vec<ResolvedTarget>) {
        let pending = {
            let registry = self.registry.lock().await;
            let mut seen = HashSet::new();
            candidates
                .into_iter()
                .filter(|candidate| {
                    if registry.contains_key(&candidate.name) {
                        debug!(target_name = %candidate.name, "already capturing; skipping");
                        return false;
                    }
                    seen.insert(candidate.name.clone())
                })
                .collect::<Vec<_>>()
        };
        if pending.is_empty() {
            return;
        }

        join_all(
            pending
                .into_iter()
                .map(|candidate| self.start_capture(candidate)),
        )
        .await;
    }

    /// Sample every due capture's output file and terminate stalled workers.
    ///
    /// Termination never removes the record; cleanup belongs to the worker's
    /// own exit notification to avoid racing it.
    pub async fn health_check(&self) {
        let now = Instant::now();
        let mut registry = self.registry.lock().await;
        for record in registry.values_mut() {
            if record.next_check_at > now {
                continue;
            }

            match fs::metadata(&record.output_path).await {
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    // The exit notification owns cleanup; a missing file here
                    // is either not yet created or already finalized.
                    debug!(
                        target_name = %record.target,
                        path = %record.output_path.display(),
                        "output file absent at health check"
                    );
                }
                Err(err) => {
                    warn!(
                        target_name = %record.target,
                        error = %err,
                        path = %record.output_path.display(),
                        "health check stat failed"
                    );
                }
                Ok(metadata) => {
                    let size = metadata.len();
                    if size > record.last_observed_size {
                        record.last_observed_size = size;
                        record.next_check_at = now + STEADY_CHECK_INTERVAL;
                        debug!(target_name = %record.target, bytes = size, "capture is growing");
                        self.events.send(Event::CaptureProgress {
                            capture_id: record.capture_id,
                            target: record.target.clone(),
                            bytes: size,
                        });
                    } else {
                        warn!(
                            target_name = %record.target,
                            capture_id = %record.capture_id,
                            bytes = size,
                            "no growth since last check; terminating worker"
                        );
                        self.metrics.inc_capture_kill();
                        self.events.send(Event::CaptureStalled {
                            capture_id: record.capture_id,
                            target: record.target.clone(),
                            bytes: record.last_observed_size,
                        });
                        if !record.worker.terminate() {
                            debug!(target_name = %record.target, "termination already signalled");
                        }
                    }
                }
            }
        }
    }

    /// Handle a worker exit: drop the registry entry first, then finalize.
    ///
    /// The removal verifies the capture id so a stale notification can never
    /// evict a successor record for the same target.
    pub async fn on_worker_exit(&self, exit: WorkerExit) {
        let removed = {
            let mut registry = self.registry.lock().await;
            let matches = registry
                .get(&exit.target)
                .is_some_and(|record| record.capture_id == exit.capture_id);
            let removed = matches.then(|| registry.remove(&exit.target)).flatten();
            self.metrics.set_active_captures(registry_gauge(registry.len()));
            removed
        };

        if removed.is_some() {
            info!(
                target_name = %exit.target,
                capture_id = %exit.capture_id,
                "capture worker stopped"
            );
        } else {
            debug!(
                target_name = %exit.target,
                capture_id = %exit.capture_id,
                "exit notification for an unregistered capture"
            );
        }

        self.metrics.inc_capture_ended();
        self.events.send(Event::CaptureEnded {
            capture_id: exit.capture_id,
            target: exit.target.clone(),
        });

        let destination_path = self.destination_for(&exit);
        self.finalizer
            .finalize(FinalizeRequest {
                capture_id: exit.capture_id,
                target: exit.target,
                source_path: exit.output_path,
                destination_path,
                min_size_bytes: self.settings.min_file_size_bytes,
            })
            .await;
    }

    /// Spawn the task that drains worker exit notifications.
    pub fn spawn_exit_listener(
        self: &Arc<Self>,
        mut exits: mpsc::UnboundedReceiver<WorkerExit>,
    ) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(exit) = exits.recv().await {
                supervisor.on_worker_exit(exit).await;
            }
        })
    }

    /// Read-only snapshot of the registry, sorted by target name.
    pub async fn statuses(&self) -> Vec<CaptureStatus> {
        let now = Instant::now();
        let registry = self.registry.lock().await;
        let mut statuses = registry
            .values()
            .map(|record| CaptureStatus {
                capture_id: record.capture_id,
                target: record.target.clone(),
                pid: record.worker.pid(),
                output_path: record.output_path.clone(),
                last_observed_size: record.last_observed_size,
                check_due_in: record.next_check_at.saturating_duration_since(now),
            })
            .collect::<Vec<_>>();
        statuses.sort_by(|a, b| a.target.cmp(&b.target));
        statuses
    }

    /// Number of captures currently registered.
    pub async fn active_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    async fn start_capture(&self, candidate: ResolvedTarget) {
        let target = candidate.name.clone();
        if let Err(error) = self.try_start(candidate).await {
            self.metrics.inc_negotiation_failure(error.stage());
            let reason = error.detail();
            warn!(
                target_name = %target,
                stage = error.stage(),
                reason = %reason,
                "capture attempt failed; target will be retried next cycle"
            );
            self.events.send(Event::NegotiationFailed { target, reason });
        }
    }

    async fn try_start(&self, candidate: ResolvedTarget) -> CaptureResult<()> {
        let ResolvedTarget {
            name: target,
            descriptor_hint,
        } = candidate;

        let descriptor = match descriptor_hint {
            Some(descriptor) => descriptor,
            None => self
                .negotiator
                .negotiate(&target)
                .await
                .map_err(|reason| CaptureError::Negotiation {
                    target: target.clone(),
                    reason,
                })?,
        };

        let capture_id = Uuid::new_v4();
        let started_at = Local::now();
        let filename = format!(
            "{target}_{}.flv",
            started_at.format(&self.settings.timestamp_format)
        );
        let output_path = self.settings.capture_directory.join(&filename);

        info!(
            target_name = %target,
            capture_id = %capture_id,
            "target is online; starting capture worker"
        );

        let handle = self
            .launcher
            .launch(WorkerRequest {
                capture_id,
                target: target.clone(),
                descriptor,
                output_path: output_path.clone(),
            })
            .await
            .map_err(|reason| CaptureError::Spawn {
                target: target.clone(),
                reason,
            })?;

        let mut record = CaptureRecord {
            capture_id,
            target: target.clone(),
            output_path: output_path.clone(),
            last_observed_size: 0,
            next_check_at: Instant::now() + INITIAL_CHECK_DELAY,
            worker: handle,
        };

        {
            let mut registry = self.registry.lock().await;
            if registry.contains_key(&target) {
                // Lost a race for the same target; the extra worker is killed
                // and its exit notification finalizes whatever it wrote.
                record.worker.terminate();
                return Err(CaptureError::AlreadyActive { target });
            }
            registry.insert(target.clone(), record);
            self.metrics.set_active_captures(registry_gauge(registry.len()));
        }

        self.metrics.inc_capture_started();
        self.events.send(Event::CaptureStarted {
            capture_id,
            target,
            output_path: output_path.display().to_string(),
        });
        Ok(())
    }

    fn destination_for(&self, exit: &WorkerExit) -> PathBuf {
        let filename = exit.output_path.file_name().map_or_else(
            || std::ffi::OsString::from(format!("{}.flv", exit.target)),
            std::borrow::ToOwned::to_owned,
        );
        let mut destination = self.settings.complete_directory.clone();
        if self.settings.per_target_subdir {
            destination.push(&exit.target);
        }
        destination.push(filename);
        destination
    }
}

fn registry_gauge(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
