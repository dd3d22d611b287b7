//! Fallback values applied when the configuration file omits a field.

/// Base URL of the streaming platform.
pub const SITE_URL: &str = "https://showup.tv";

/// Directory in-progress captures are written to.
pub const CAPTURE_DIRECTORY: &str = "./capture";

/// Directory finalized captures are relocated to.
pub const COMPLETE_DIRECTORY: &str = "./complete";

/// Seconds between scan cycles.
pub const SCAN_INTERVAL_SECS: u64 = 30;

/// Minimum retained artifact size in megabytes; zero retains everything.
pub const MIN_FILE_SIZE_MB: u64 = 0;

/// External capture binary invoked per worker.
pub const WORKER_BINARY: &str = "rtmpdump";

/// Timestamp format used in output filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H%M%S";
