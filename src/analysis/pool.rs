use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Bounded pool running episode analysis and query fan-out.
pub fn build_worker_pool(workers: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|index| format!("analysis-{}", index))
        .build()
}
