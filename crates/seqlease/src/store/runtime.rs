use core::future::Future;

use tokio::{
    runtime::{Builder, Runtime},
    task::JoinHandle,
};

use crate::error::{Error, Result};

/// A dedicated Tokio runtime driving an async client behind a blocking API.
///
/// One worker thread runs spawned background tasks (such as liveness pings);
/// callers drive their own requests through [`BlockingRuntime::block_on`], so
/// concurrent callers do not queue behind each other.
#[derive(Debug)]
pub(crate) struct BlockingRuntime {
    runtime: Runtime,
}

impl BlockingRuntime {
    pub(crate) fn new(thread_name: &str) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(thread_name)
            .enable_all()
            .build()
            .map_err(|e| Error::config(format!("cannot start {thread_name} runtime: {e}")))?;
        Ok(Self { runtime })
    }

    /// Runs `future` to completion on the calling thread.
    ///
    /// Panics if called from within an async execution context.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }
}
