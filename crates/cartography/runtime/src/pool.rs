//! Fixed-size search worker pool.

use crate::error::{RuntimeError, RuntimeResult};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Dedicated runtime whose blocking pool runs search jobs.
///
/// At most `threads` searches run at once; further jobs queue. Must be
/// created and shut down outside of any async context.
pub struct WorkerPool {
    runtime: Option<Runtime>,
    threads: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> RuntimeResult<Self> {
        let threads = threads.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(threads)
            .thread_name("cartography-search")
            .build()
            .map_err(RuntimeError::PoolStart)?;

        tracing::info!(threads, "Search worker pool started");
        Ok(Self {
            runtime: Some(runtime),
            threads,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Queue a blocking job.
    pub fn submit<F>(&self, job: F) -> RuntimeResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = self.runtime.as_ref().ok_or(RuntimeError::PoolShutDown)?;
        drop(runtime.spawn_blocking(job));
        Ok(())
    }

    /// Stop accepting jobs and wait up to `timeout` for running ones.
    pub fn shutdown(&mut self, timeout: Duration) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(timeout);
            tracing::info!("Search worker pool stopped");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("running", &self.is_running())
            .finish()
    }
}
