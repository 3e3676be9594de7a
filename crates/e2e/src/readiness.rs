//! Bounded polling for asynchronously flushed result files
//!
//! The artifact writer gives no completion signal, so readiness is detected by
//! listing the directory at a fixed cadence until a result file shows up or the
//! deadline passes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

static RESULT_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-result\.json$|test-cases").expect("result file pattern is valid")
});

/// Whether a directory entry name counts as a flushed result file
pub fn is_result_file(name: &str) -> bool {
    RESULT_FILE.is_match(name)
}

/// Polls a directory for result files
#[derive(Debug, Clone, Copy)]
pub struct ReadinessWaiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl ReadinessWaiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            // A zero interval would spin.
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Wait until `dir` contains a result file.
    ///
    /// Returns `true` as soon as one is seen, `false` once the timeout has
    /// elapsed without a match. Read errors count as "not yet".
    pub async fn wait(&self, dir: &Path) -> bool {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut polls = 0u32;

        loop {
            polls += 1;
            if has_result_file(dir) {
                info!(
                    "Result files ready in {} after {} ms",
                    dir.display(),
                    start.elapsed().as_millis()
                );
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("Gave up on {} after {} polls", dir.display(), polls);
                return false;
            }

            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

/// One-shot form of [`ReadinessWaiter::wait`]
pub async fn wait_for_results(dir: &Path, timeout: Duration, poll_interval: Duration) -> bool {
    ReadinessWaiter::new(timeout, poll_interval).wait(dir).await
}

fn has_result_file(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .any(|e| is_result_file(&e.file_name().to_string_lossy())),
        Err(e) => {
            debug!("Polling {} failed: {}", dir.display(), e);
            false
        }
    }
}
