use std::path::Path;

use reeler_events::EventBus;
use reeler_fsops::{FinalizeOutcome, FinalizeRequest, FinalizeService};
use reeler_telemetry::Metrics;
use tempfile::TempDir;
use tokio::fs;
use uuid::Uuid;

fn service() -> FinalizeService {
    let metrics = Metrics::new().expect("metrics registry");
    FinalizeService::new(EventBus::with_capacity(16), metrics)
}

fn request(source: &Path, destination: &Path, min_size_bytes: u64) -> FinalizeRequest {
    FinalizeRequest {
        capture_id: Uuid::new_v4(),
        target: "alpha".into(),
        source_path: source.to_path_buf(),
        destination_path: destination.to_path_buf(),
        min_size_bytes,
    }
}

#[tokio::test]
async fn artifact_at_threshold_is_discarded() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("alpha.flv");
    fs::write(&source, vec![0u8; 5_000]).await?;
    let destination = temp.path().join("complete").join("alpha.flv");

    let outcome = service()
        .finalize(request(&source, &destination, 5_000))
        .await;

    assert_eq!(outcome, FinalizeOutcome::Discarded { bytes: 5_000 });
    assert!(!source.exists(), "undersized artifact should be deleted");
    assert!(!destination.exists());
    Ok(())
}

#[tokio::test]
async fn artifact_over_threshold_is_relocated_intact() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("alpha.flv");
    let payload = vec![7u8; 5_001];
    fs::write(&source, &payload).await?;
    let destination = temp
        .path()
        .join("complete")
        .join("alpha")
        .join("alpha.flv");

    let outcome = service()
        .finalize(request(&source, &destination, 5_000))
        .await;

    assert_eq!(outcome, FinalizeOutcome::Relocated { bytes: 5_001 });
    assert!(!source.exists(), "source should be gone after the move");
    let moved = fs::read(&destination).await?;
    assert_eq!(moved, payload, "artifact must be moved intact");
    Ok(())
}

#[tokio::test]
async fn missing_artifact_is_a_silent_no_op() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("never-written.flv");
    let destination = temp.path().join("complete").join("never-written.flv");

    let outcome = service()
        .finalize(request(&source, &destination, 5_000))
        .await;

    assert_eq!(outcome, FinalizeOutcome::Missing);
    Ok(())
}

#[tokio::test]
async fn zero_byte_artifact_is_discarded_even_without_threshold() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("alpha.flv");
    fs::write(&source, b"").await?;
    let destination = temp.path().join("complete").join("alpha.flv");

    let outcome = service().finalize(request(&source, &destination, 0)).await;

    assert_eq!(outcome, FinalizeOutcome::Discarded { bytes: 0 });
    assert!(!source.exists());
    Ok(())
}
