//! Periodic scan loop: resolve, reconcile, health-check, sleep.
//!
//! The loop is the only driver of cross-cycle work and it must outlive any
//! single cycle's failure: a cycle error is logged and the next cycle
//! proceeds on schedule. Registry access goes exclusively through supervisor
//! methods.

use std::sync::Arc;
use std::time::Duration;

use reeler_capture::{CaptureSupervisor, TargetResolver};
use reeler_events::{Event, EventBus};
use reeler_telemetry::Metrics;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Driver that repeatedly runs one full scan cycle.
pub(crate) struct ScanLoop {
    resolver: Arc<dyn TargetResolver>,
    supervisor: Arc<CaptureSupervisor>,
    events: EventBus,
    metrics: Metrics,
    interval: Duration,
}

impl ScanLoop {
    pub(crate) fn new(
        resolver: Arc<dyn TargetResolver>,
        supervisor: Arc<CaptureSupervisor>,
        events: EventBus,
        metrics: Metrics,
        interval: Duration,
    ) -> Self {
        Self {
            resolver,
            supervisor,
            events,
            metrics,
            interval,
        }
    }

    /// Run cycles until the surrounding task is dropped.
    pub(crate) async fn run(self) {
        let mut cycle: u64 = 0;
        loop {
            cycle = cycle.wrapping_add(1);
            match self.cycle(cycle).await {
                Ok(()) => self.metrics.inc_scan_cycle(),
                Err(err) => {
                    self.metrics.inc_scan_cycle_failure();
                    error!(
                        cycle,
                        reason = %format!("{err:#}"),
                        "scan cycle failed; continuing with the next one"
                    );
                }
            }
            self.dump_registry().await;
            info!(
                cycle,
                interval_secs = self.interval.as_secs(),
                "cycle complete; sleeping until next scan"
            );
            sleep(self.interval).await;
        }
    }

    async fn cycle(&self, cycle: u64) -> anyhow::Result<()> {
        self.events.send(Event::ScanStarted { cycle });
        debug!(cycle, "searching for online targets");

        let candidates = self.resolver.resolve().await?;
        self.metrics
            .set_targets_online(i64::try_from(candidates.len()).unwrap_or(i64::MAX));
        self.events.send(Event::TargetsResolved {
            cycle,
            eligible: candidates.len(),
        });

        self.supervisor.reconcile(candidates).await;
        self.supervisor.health_check().await;
        Ok(())
    }

    async fn dump_registry(&self) {
        for status in self.supervisor.statuses().await {
            debug!(
                target_name = %status.target,
                capture_id = %status.capture_id,
                pid = status.pid,
                bytes = status.last_observed_size,
                check_due_in_secs = status.check_due_in.as_secs(),
                file = %status.output_path.display(),
                "active capture"
            );
        }
        debug!(snapshot = ?self.metrics.snapshot(), "cycle metrics");
    }
}
