//! Test harness helpers.

use std::path::PathBuf;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Create a temporary directory for testing.
///
/// The directory is removed when the returned `TempDir` is dropped.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::with_prefix("kvmux-").expect("Failed to create temp directory")
}

/// Path of a file named `name` inside `dir` (the file is not created).
#[must_use]
pub fn test_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

/// Write `content` to `name` inside `dir` and return its path.
///
/// # Panics
///
/// Panics if the file cannot be written.
#[must_use]
pub fn test_file_in_dir(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = test_path(dir, name);
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

/// Set up test logging with the given filter.
///
/// Output goes through the test writer so it is captured per test. Calling
/// it more than once is harmless.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging at `warn`.
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}
