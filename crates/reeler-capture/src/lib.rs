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

//! Capture supervision engine.
//!
//! Layout: `model.rs` (descriptors, records, settings), `supervisor.rs`
//! (registry ownership, reconcile, health checks, exit handling),
//! `worker.rs` (external process launching and exit notification).

pub mod error;
pub mod model;
pub mod supervisor;
pub mod worker;

pub use error::{CaptureError, CaptureResult};
pub use model::{
    CaptureDescriptor, CaptureSettings, CaptureStatus, INITIAL_CHECK_DELAY, ResolvedTarget,
    STEADY_CHECK_INTERVAL,
};
pub use supervisor::CaptureSupervisor;
pub use worker::{ExitSender, ProcessLauncher, WorkerExit, WorkerHandle, WorkerLauncher, WorkerRequest};

use async_trait::async_trait;

/// Negotiates per-target stream connection parameters.
///
/// Implementations must fail explicitly rather than hang; one stuck target
/// must never stall a whole reconcile pass.
#[async_trait]
pub trait StreamNegotiator: Send + Sync {
    /// Produce a capture descriptor for the given target.
    async fn negotiate(&self, target: &str) -> anyhow::Result<CaptureDescriptor>;
}

/// Produces the set of targets eligible for capture this cycle.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    /// Resolve the currently-online, allow-listed targets.
    async fn resolve(&self) -> anyhow::Result<Vec<ResolvedTarget>>;
}
