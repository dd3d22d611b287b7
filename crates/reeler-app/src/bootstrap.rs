//! Service wiring for the Reeler daemon.

use std::sync::Arc;

use reeler_capture::{CaptureSettings, CaptureSupervisor, ProcessLauncher};
use reeler_config::AppConfig;
use reeler_events::EventBus;
use reeler_fsops::FinalizeService;
use reeler_negotiate::{PushNegotiator, SiteClient, SiteResolver};
use reeler_telemetry::{GlobalContextGuard, LoggingConfig, Metrics};
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::scanner::ScanLoop;

const CONFIG_PATH_ENV: &str = "REELER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Dependencies required to bootstrap the daemon.
pub(crate) struct BootstrapDependencies {
    config: AppConfig,
    events: EventBus,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary
    /// entrypoint.
    pub(crate) async fn from_env() -> AppResult<Self> {
        let path = config_path_from(std::env::var(CONFIG_PATH_ENV).ok());
        let config = reeler_config::load(&path)
            .await
            .map_err(|err| AppError::config("config.load", err))?;
        Self::from_config(config)
    }

    /// Construct dependencies around an already-loaded configuration.
    pub(crate) fn from_config(config: AppConfig) -> AppResult<Self> {
        let events = EventBus::new();
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            events,
            telemetry,
        })
    }
}

/// Entry point for the daemon boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or startup fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env().await?;
    Box::pin(run_app_with(dependencies)).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify
/// testing.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies {
        config,
        events,
        telemetry,
    } = dependencies;

    let logging = LoggingConfig {
        level: log_level(config.debug),
        ..LoggingConfig::default()
    };
    reeler_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("daemon");

    info!("Reeler daemon bootstrap starting");

    // The only fatal filesystem concern: everything downstream assumes these
    // directories exist.
    fs::create_dir_all(&config.capture_directory)
        .await
        .map_err(|err| AppError::io("bootstrap.create_capture_dir", &config.capture_directory, err))?;
    fs::create_dir_all(&config.complete_directory)
        .await
        .map_err(|err| {
            AppError::io("bootstrap.create_complete_dir", &config.complete_directory, err)
        })?;

    let allow = config
        .allow_list()
        .map_err(|err| AppError::config("config.allow_list", err))?;
    let site = Arc::new(
        SiteClient::new(config.site_url.clone())
            .map_err(|err| AppError::site("client.build", err))?,
    );
    let negotiator = Arc::new(PushNegotiator::new(Arc::clone(&site)));
    let resolver = Arc::new(SiteResolver::new(
        Arc::clone(&site),
        config.credentials.clone(),
        allow,
    ));

    let (exit_tx, exit_rx) = mpsc::unbounded_channel();
    let launcher = Arc::new(ProcessLauncher::new(
        config.worker_binary.clone(),
        config.site_url.clone(),
        config.worker_verbose,
        exit_tx,
    ));
    let finalizer = FinalizeService::new(events.clone(), telemetry.clone());
    let settings = CaptureSettings {
        capture_directory: config.capture_directory.clone(),
        complete_directory: config.complete_directory.clone(),
        min_file_size_bytes: config.min_file_size_bytes(),
        timestamp_format: config.timestamp_format.clone(),
        per_target_subdir: config.per_target_subdir,
    };
    let supervisor = Arc::new(CaptureSupervisor::new(
        negotiator,
        launcher,
        finalizer,
        events.clone(),
        telemetry.clone(),
        settings,
    ));
    let exit_listener = supervisor.spawn_exit_listener(exit_rx);
    info!("capture supervisor ready");

    let scan_loop = ScanLoop::new(
        resolver,
        Arc::clone(&supervisor),
        events,
        telemetry,
        config.scan_interval(),
    );

    tokio::select! {
        () = scan_loop.run() => {}
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("shutdown signal received"),
            Err(err) => warn!(error = %err, "failed to listen for shutdown signal"),
        },
    }

    if !exit_listener.is_finished() {
        exit_listener.abort();
    }
    if let Err(err) = exit_listener.await {
        if !err.is_cancelled() {
            warn!(error = %err, "exit listener join failed");
        }
    }

    info!("Reeler daemon shutdown complete");
    Ok(())
}

fn config_path_from(value: Option<String>) -> String {
    value.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

const fn log_level(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reeler_config::from_yaml;

    #[test]
    fn config_path_falls_back_to_default() {
        assert_eq!(config_path_from(None), DEFAULT_CONFIG_PATH);
        assert_eq!(
            config_path_from(Some("/etc/reeler.yml".into())),
            "/etc/reeler.yml"
        );
    }

    #[test]
    fn debug_toggle_selects_the_log_level() {
        assert_eq!(log_level(true), "debug");
        assert_eq!(log_level(false), "info");
    }

    #[test]
    fn dependencies_build_from_a_loaded_config() -> AppResult<()> {
        let config = from_yaml(
            "credentials:\n  email: user@example.com\n  password: secret\n",
        )
        .map_err(|err| AppError::config("config.parse", err))?;
        let dependencies = BootstrapDependencies::from_config(config)?;
        assert_eq!(dependencies.config.credentials.email, "user@example.com");
        assert!(dependencies.events.last_event_id().is_none());
        let snapshot = dependencies.telemetry.snapshot();
        assert_eq!(snapshot.active_captures, 0);
        Ok(())
    }
}
