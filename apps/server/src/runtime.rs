//! Tokio runtime profile for the listener.
//!
//! The runtime is built only after bootstrap has finished, so blocking warm-up never
//! runs inside an async context.

use anyhow::{Context, Result};
use std::thread::available_parallelism;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeProfile {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl RuntimeProfile {
    /// Preset for the HTTP listener. `TOKIO_WORKER_THREADS` overrides the detected parallelism.
    #[must_use]
    pub fn server() -> Self {
        Self {
            worker_threads: worker_threads(std::env::var("TOKIO_WORKER_THREADS").ok().as_deref()),
            stack_size: 4 * 1024 * 1024,
            thread_name: "dwaste-http".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
        }
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, 1024);
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    /// Builds a multi-threaded runtime with I/O, timers and signals enabled.
    ///
    /// # Errors
    /// Returns an error if the OS refuses to create the worker threads.
    pub fn build(&self) -> Result<Runtime> {
        debug!(profile = ?self, "Building tokio runtime");

        Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name(&self.thread_name)
            .thread_stack_size(self.stack_size)
            .thread_keep_alive(self.thread_keep_alive)
            .enable_all()
            .build()
            .context("Failed to initialize runtime")
    }
}

fn worker_threads(requested: Option<&str>) -> usize {
    requested
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0 && n <= 1024)
        .unwrap_or_else(|| {
            available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_threads_honour_valid_overrides_only() {
        assert_eq!(worker_threads(Some("3")), 3);
        assert_eq!(worker_threads(Some("0")), worker_threads(None));
        assert_eq!(worker_threads(Some("many")), worker_threads(None));
    }

    #[test]
    fn builders_clamp_their_inputs() {
        let profile = RuntimeProfile::server().with_worker_threads(0).with_stack_size(100);
        assert_eq!(profile.worker_threads, 1);
        assert_eq!(profile.stack_size, MIN_STACK_SIZE);

        let profile = RuntimeProfile::server().with_worker_threads(5000).with_stack_size(usize::MAX);
        assert_eq!(profile.worker_threads, 1024);
        assert_eq!(profile.stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn builds_a_working_runtime() {
        let runtime = RuntimeProfile::server().with_worker_threads(1).build().expect("runtime");
        assert_eq!(runtime.block_on(async { 40 + 2 }), 42);
    }
}
