use std::fmt::Debug;
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Result, TensorError};

/// One unit of fork-join work. Borrowing is allowed: every job finishes before
/// [`ParallelExecutor::execute`] returns.
pub type Job<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Worker pool the kernels fan out onto.
///
/// The pool is owned by whoever embeds the runtime; kernels only need to run a
/// batch of independent jobs and block until all of them are done. Jobs carry
/// no ordering guarantee relative to each other.
pub trait ParallelExecutor: Send + Sync + Debug {
    /// Returns the name of this executor (e.g., "rayon", "serial").
    fn name(&self) -> &str;

    /// Number of jobs that can make progress at the same time.
    fn num_threads(&self) -> usize;

    /// Runs every job to completion.
    fn execute<'a>(&self, jobs: Vec<Job<'a>>);
}

/// Runs jobs inline on the calling thread, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl ParallelExecutor for SerialExecutor {
    fn name(&self) -> &str {
        "serial"
    }

    fn num_threads(&self) -> usize {
        1
    }

    fn execute<'a>(&self, jobs: Vec<Job<'a>>) {
        for job in jobs {
            job();
        }
    }
}

/// Runs jobs on a rayon thread pool, either the global one or a dedicated
/// pool with a fixed thread count.
#[derive(Debug, Clone, Default)]
pub struct RayonExecutor {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl RayonExecutor {
    /// Executor backed by rayon's global pool.
    pub fn new() -> Self {
        RayonExecutor { pool: None }
    }

    /// Executor backed by a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ar-worker-{}", i))
            .build()
            .map_err(|e| TensorError::Other(format!("failed to build thread pool: {}", e)))?;
        log::debug!("built rayon pool with {} threads", pool.current_num_threads());
        Ok(RayonExecutor {
            pool: Some(Arc::new(pool)),
        })
    }
}

impl ParallelExecutor for RayonExecutor {
    fn name(&self) -> &str {
        "rayon"
    }

    fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn execute<'a>(&self, jobs: Vec<Job<'a>>) {
        let run = move || jobs.into_par_iter().for_each(|job| job());
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
