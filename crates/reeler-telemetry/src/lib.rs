#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives shared across the Reeler workspace.
//!
//! This crate centralises logging and metrics so every service adopts a
//! consistent observability story: one tracing subscriber installed at
//! bootstrap, one Prometheus registry threaded through the components.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;
use tracing::{Span, span::Entered};
use tracing_subscriber::{EnvFilter, fmt};

/// Default logging target when `RUST_LOG` is not provided.
const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    BUILD_SHA
        .set(config.build_sha.to_string())
        .ok()
        .or(Some(()));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));

    let install = |format: LogFormat| {
        let builder = fmt::fmt()
            .with_env_filter(env_filter.clone())
            .with_target(false)
            .with_thread_ids(false);

        match format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        }
    };

    install(config.format).map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    Ok(())
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Default filter directive applied when `RUST_LOG` is unset.
    pub level: &'a str,
    /// Output format for the installed subscriber.
    pub format: LogFormat,
    /// Build identifier stamped onto the application span.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Machine-readable JSON lines.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application span, recording the supplied mode.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", mode = %mode, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    events_emitted_total: IntCounterVec,
    captures_started_total: IntCounter,
    captures_ended_total: IntCounter,
    capture_kills_total: IntCounter,
    negotiation_failures_total: IntCounterVec,
    finalize_outcomes_total: IntCounterVec,
    scan_cycles_total: IntCounter,
    scan_cycle_failures_total: IntCounter,
    active_captures: IntGauge,
    targets_online: IntGauge,
}

/// Snapshot of selected gauges and counters for cycle reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Number of captures currently registered.
    pub active_captures: i64,
    /// Number of targets the last resolve pass reported online.
    pub targets_online: i64,
    /// Captures started since process start.
    pub captures_started_total: u64,
    /// Captures ended since process start.
    pub captures_ended_total: u64,
    /// Workers terminated by the stall detector.
    pub capture_kills_total: u64,
    /// Completed scan cycles.
    pub scan_cycles_total: u64,
    /// Scan cycles that ended with an error.
    pub scan_cycle_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events_emitted_total = IntCounterVec::new(
            Opts::new("events_emitted_total", "Domain events emitted by type"),
            &["type"],
        )?;
        let captures_started_total = IntCounter::with_opts(Opts::new(
            "captures_started_total",
            "Capture workers spawned",
        ))?;
        let captures_ended_total = IntCounter::with_opts(Opts::new(
            "captures_ended_total",
            "Capture workers that exited",
        ))?;
        let capture_kills_total = IntCounter::with_opts(Opts::new(
            "capture_kills_total",
            "Capture workers terminated by the stall detector",
        ))?;
        let negotiation_failures_total = IntCounterVec::new(
            Opts::new(
                "negotiation_failures_total",
                "Failed capture negotiations by stage",
            ),
            &["stage"],
        )?;
        let finalize_outcomes_total = IntCounterVec::new(
            Opts::new(
                "finalize_outcomes_total",
                "Artifact finalizations by outcome",
            ),
            &["outcome"],
        )?;
        let scan_cycles_total =
            IntCounter::with_opts(Opts::new("scan_cycles_total", "Completed scan cycles"))?;
        let scan_cycle_failures_total = IntCounter::with_opts(Opts::new(
            "scan_cycle_failures_total",
            "Scan cycles that ended with an error",
        ))?;
        let active_captures = IntGauge::with_opts(Opts::new(
            "active_captures",
            "Number of captures currently registered",
        ))?;
        let targets_online = IntGauge::with_opts(Opts::new(
            "targets_online",
            "Targets reported online by the last resolve pass",
        ))?;

        registry.register(Box::new(events_emitted_total.clone()))?;
        registry.register(Box::new(captures_started_total.clone()))?;
        registry.register(Box::new(captures_ended_total.clone()))?;
        registry.register(Box::new(capture_kills_total.clone()))?;
        registry.register(Box::new(negotiation_failures_total.clone()))?;
        registry.register(Box::new(finalize_outcomes_total.clone()))?;
        registry.register(Box::new(scan_cycles_total.clone()))?;
        registry.register(Box::new(scan_cycle_failures_total.clone()))?;
        registry.register(Box::new(active_captures.clone()))?;
        registry.register(Box::new(targets_online.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                events_emitted_total,
                captures_started_total,
                captures_ended_total,
                capture_kills_total,
                negotiation_failures_total,
                finalize_outcomes_total,
                scan_cycles_total,
                scan_cycle_failures_total,
                active_captures,
                targets_online,
            }),
        })
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Record a capture worker spawn.
    pub fn inc_capture_started(&self) {
        self.inner.captures_started_total.inc();
    }

    /// Record a capture worker exit.
    pub fn inc_capture_ended(&self) {
        self.inner.captures_ended_total.inc();
    }

    /// Record a worker termination issued by the stall detector.
    pub fn inc_capture_kill(&self) {
        self.inner.capture_kills_total.inc();
    }

    /// Record a failed negotiation attributed to the given stage.
    pub fn inc_negotiation_failure(&self, stage: &str) {
        self.inner
            .negotiation_failures_total
            .with_label_values(&[stage])
            .inc();
    }

    /// Record an artifact finalization outcome.
    pub fn inc_finalize_outcome(&self, outcome: &str) {
        self.inner
            .finalize_outcomes_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record a completed scan cycle.
    pub fn inc_scan_cycle(&self) {
        self.inner.scan_cycles_total.inc();
    }

    /// Record a scan cycle that ended with an error.
    pub fn inc_scan_cycle_failure(&self) {
        self.inner.scan_cycle_failures_total.inc();
    }

    /// Set the active capture gauge.
    pub fn set_active_captures(&self, count: i64) {
        self.inner.active_captures.set(count);
    }

    /// Set the online target gauge.
    pub fn set_targets_online(&self, count: i64) {
        self.inner.targets_online.set(count);
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_captures: self.inner.active_captures.get(),
            targets_online: self.inner.targets_online.get(),
            captures_started_total: self.inner.captures_started_total.get(),
            captures_ended_total: self.inner.captures_ended_total.get(),
            capture_kills_total: self.inner.capture_kills_total.get(),
            scan_cycles_total: self.inner.scan_cycles_total.get(),
            scan_cycle_failures_total: self.inner.scan_cycle_failures_total.get(),
        }
    }
}
