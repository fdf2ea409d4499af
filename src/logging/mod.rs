//! Tracing subscriber initialization.
//!
//! The terminal belongs to the TUI, so logs go to a file instead.
//! Follow them with `tail -f` in a separate terminal.
//!
//! Engine events use per-subsystem targets, so `RUST_LOG` can single one out:
//!
//! | Target               | What                                   |
//! |----------------------|----------------------------------------|
//! | `vtimeline::mount`   | cell mount, remount, unmount, settling |
//! | `vtimeline::scroll`  | window changes, tail-triggered loads   |
//! | `vtimeline::resize`  | debounced height changes, propagation  |
//! | `vtimeline::pager`   | page requests, exhaustion, disposal    |
//!
//! e.g. `RUST_LOG=vtimeline::resize=debug,info`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Log path has no parent directory
    #[error("Log path has no parent directory: {0:?}")]
    NoParentDirectory(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Initialize the tracing subscriber with file-based logging.
///
/// Respects `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
/// Creates the log directory if it doesn't exist.
///
/// # Errors
///
/// Returns `LoggingError` if the path is unusable, the directory cannot be
/// created, or a subscriber was already installed.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;

    std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.to_path_buf(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_target(true)
        .with_ansi(false) // No ANSI colors in log files
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    #[serial(tracing_init)]
    fn init_creates_log_directory_if_missing() {
        let test_dir = std::env::temp_dir().join("vtimeline_test_logs_create");
        let log_file = test_dir.join("test.log");
        let _ = fs::remove_dir_all(&test_dir);

        // May fail if subscriber already set; the directory is created first
        let _ = init(&log_file);

        assert!(
            test_dir.exists(),
            "Log directory should be created: {:?}",
            test_dir
        );
        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn init_rejects_path_without_file_name() {
        let result = init(Path::new("/"));
        assert!(
            matches!(result, Err(LoggingError::InvalidPath(_))),
            "got: {:?}",
            result
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn subsystem_targets_can_be_filtered() {
        use crate::timeline::resize::ResizeAggregator;
        use crate::timeline::surface::NodeId;
        use std::time::{Duration, Instant};
        use tracing_subscriber::EnvFilter;

        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("vtimeline::resize=debug"))
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut agg = ResizeAggregator::default();
            let node = NodeId::new(7);
            let t0 = Instant::now();
            agg.observe(node, 3, 10);
            agg.record(node, 30, t0);
            agg.flush_due(t0 + Duration::from_millis(20));
            tracing::info!(target: "vtimeline::pager", "filtered out");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("vtimeline::resize"), "got: {output}");
        assert!(output.contains("index=3"), "got: {output}");
        assert!(!output.contains("filtered out"), "got: {output}");
    }
}
