//! External capture worker processes.
//!
//! The worker binary is an opaque subprocess: its stdout/stderr are forwarded
//! to the logging sink verbatim and its exit is reported through a channel.
//! Exit codes are never inspected; artifact size is the sole correctness
//! signal.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::CaptureDescriptor;

/// Notification emitted when a capture worker terminates, for any reason.
#[derive(Debug)]
pub struct WorkerExit {
    /// Target the worker was capturing.
    pub target: String,
    /// Identifier of the capture attempt the worker belonged to.
    pub capture_id: Uuid,
    /// File the worker was writing to.
    pub output_path: PathBuf,
}

/// Sending half of the worker exit channel.
pub type ExitSender = mpsc::UnboundedSender<WorkerExit>;

/// Supervisor-owned handle over a spawned worker process.
///
/// The supervisor is the only authority permitted to terminate the worker;
/// dropping the handle also signals termination, which keeps workers from
/// outliving their registry entries on shutdown.
pub struct WorkerHandle {
    pid: u32,
    kill: Option<oneshot::Sender<()>>,
}

impl WorkerHandle {
    /// Wrap a confirmed process id and its termination channel.
    #[must_use]
    pub const fn new(pid: u32, kill: oneshot::Sender<()>) -> Self {
        Self {
            pid,
            kill: Some(kill),
        }
    }

    /// Process identifier of the worker.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Signal the worker to terminate. Returns `false` if termination was
    /// already signalled.
    pub(crate) fn terminate(&mut self) -> bool {
        self.kill
            .take()
            .is_some_and(|kill| kill.send(()).is_ok())
    }
}

/// Inputs needed to start one capture worker.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    /// Identifier of the capture attempt.
    pub capture_id: Uuid,
    /// Target to capture.
    pub target: String,
    /// Negotiated stream parameters.
    pub descriptor: CaptureDescriptor,
    /// File the worker should write to.
    pub output_path: PathBuf,
}

/// Spawns capture workers.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Spawn a worker for the request, returning a handle only once the
    /// process id is confirmed.
    async fn launch(&self, request: WorkerRequest) -> anyhow::Result<WorkerHandle>;
}

/// Launcher backed by the external capture binary.
pub struct ProcessLauncher {
    binary: String,
    site_url: String,
    verbose: bool,
    exits: ExitSender,
}

impl ProcessLauncher {
    /// Construct a launcher for the given binary and platform base URL.
    #[must_use]
    pub const fn new(binary: String, site_url: String, verbose: bool, exits: ExitSender) -> Self {
        Self {
            binary,
            site_url,
            verbose,
            exits,
        }
    }

    fn build_arguments(&self, request: &WorkerRequest) -> Vec<String> {
        let mut arguments = vec![
            "--live".to_string(),
            "-a".to_string(),
            "liveedge".to_string(),
        ];
        if !self.verbose {
            arguments.push("--quiet".to_string());
        }
        arguments.extend([
            "-s".to_string(),
            format!("{}/flash/suStreamer.swf", self.site_url),
            "--rtmp".to_string(),
            format!("rtmp://{}/liveedge", request.descriptor.server_address),
            "--pageUrl".to_string(),
            format!("{}/{}", self.site_url, request.target),
            "--playpath".to_string(),
            request.descriptor.play_path.clone(),
            "--flv".to_string(),
            request.output_path.display().to_string(),
        ]);
        arguments
    }
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn launch(&self, request: WorkerRequest) -> anyhow::Result<WorkerHandle> {
        let arguments = self.build_arguments(&request);
        let mut child = Command::new(&self.binary)
            .args(&arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn capture worker '{}'", self.binary))?;

        let pid = child
            .id()
            .context("spawned capture worker reported no process id")?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, request.target.clone(), self.verbose));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, request.target.clone(), self.verbose));
        }

        let (kill_tx, kill_rx) = oneshot::channel();
        let exit = WorkerExit {
            target: request.target,
            capture_id: request.capture_id,
            output_path: request.output_path,
        };
        tokio::spawn(supervise_child(child, kill_rx, self.exits.clone(), exit));

        Ok(WorkerHandle::new(pid, kill_tx))
    }
}

async fn forward_output<R>(reader: R, target: String, verbose: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if verbose {
            info!(target_name = %target, "{line}");
        } else {
            debug!(target_name = %target, "{line}");
        }
    }
}

async fn supervise_child(
    mut child: Child,
    mut kill_rx: oneshot::Receiver<()>,
    exits: ExitSender,
    exit: WorkerExit,
) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                debug!(target_name = %exit.target, code = ?status.code(), "capture worker exited");
            }
            Err(err) => {
                warn!(target_name = %exit.target, error = %err, "failed to await capture worker");
            }
        },
        // Fires on explicit termination and when the handle is dropped.
        _ = &mut kill_rx => {
            if let Err(err) = child.start_kill() {
                warn!(target_name = %exit.target, error = %err, "failed to signal capture worker");
            }
            if let Err(err) = child.wait().await {
                warn!(target_name = %exit.target, error = %err, "failed to reap capture worker");
            }
        }
    }

    if exits.send(exit).is_err() {
        debug!("exit listener gone; dropping worker exit notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> WorkerRequest {
        WorkerRequest {
            capture_id: Uuid::nil(),
            target: "alpha".into(),
            descriptor: CaptureDescriptor {
                server_address: "edge01.example:1935".into(),
                play_path: "token-123".into(),
            },
            output_path: PathBuf::from("/tmp/capture/alpha_2026-01-01T000000.flv"),
        }
    }

    #[test]
    fn quiet_arguments_follow_the_worker_contract() {
        let (exits, _rx) = mpsc::unbounded_channel();
        let launcher = ProcessLauncher::new(
            "rtmpdump".into(),
            "https://stream.example".into(),
            false,
            exits,
        );
        let arguments = launcher.build_arguments(&sample_request());
        assert_eq!(
            arguments,
            vec![
                "--live",
                "-a",
                "liveedge",
                "--quiet",
                "-s",
                "https://stream.example/flash/suStreamer.swf",
                "--rtmp",
                "rtmp://edge01.example:1935/liveedge",
                "--pageUrl",
                "https://stream.example/alpha",
                "--playpath",
                "token-123",
                "--flv",
                "/tmp/capture/alpha_2026-01-01T000000.flv",
            ]
        );
    }

    #[test]
    fn verbose_mode_drops_the_quiet_flag() {
        let (exits, _rx) = mpsc::unbounded_channel();
        let launcher = ProcessLauncher::new(
            "rtmpdump".into(),
            "https://stream.example".into(),
            true,
            exits,
        );
        let arguments = launcher.build_arguments(&sample_request());
        assert!(!arguments.contains(&"--quiet".to_string()));
    }

    #[tokio::test]
    async fn terminate_signals_once() {
        let (kill_tx, mut kill_rx) = oneshot::channel();
        let mut handle = WorkerHandle::new(42, kill_tx);
        assert_eq!(handle.pid(), 42);
        assert!(handle.terminate(), "first termination succeeds");
        assert!(!handle.terminate(), "second termination is a no-op");
        assert!(kill_rx.try_recv().is_ok(), "signal was delivered");
    }
}
