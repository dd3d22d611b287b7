use std::path::PathBuf;

use reeler_config::{ConfigError, defaults, load};
use tempfile::TempDir;
use tokio::fs;

#[tokio::test]
async fn load_reads_file_and_applies_defaults() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("config.yml");
    fs::write(
        &path,
        "credentials:\n  email: user@example.com\n  password: secret\nmin_file_size_mb: 2\n",
    )
    .await?;

    let config = load(&path).await?;
    assert_eq!(config.credentials.email, "user@example.com");
    assert_eq!(config.min_file_size_mb, 2);
    assert_eq!(config.min_file_size_bytes(), 2 * 1_048_576);
    assert_eq!(config.site_url, defaults::SITE_URL);
    assert_eq!(
        config.capture_directory,
        PathBuf::from(defaults::CAPTURE_DIRECTORY)
    );

    let allow = config.allow_list()?;
    assert!(allow.permits("anyone"), "empty allow-list admits everyone");
    Ok(())
}

#[tokio::test]
async fn load_surfaces_missing_file_as_io_error() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("nope.yml");

    let err = load(&missing).await.expect_err("missing file should fail");
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[tokio::test]
async fn load_rejects_invalid_values() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("config.yml");
    fs::write(
        &path,
        "credentials:\n  email: user@example.com\n  password: secret\nscan_interval_secs: 0\n",
    )
    .await?;

    let err = load(&path).await.expect_err("zero interval should fail");
    assert!(matches!(
        err,
        ConfigError::InvalidField {
            field: "scan_interval_secs",
            ..
        }
    ));
    Ok(())
}
