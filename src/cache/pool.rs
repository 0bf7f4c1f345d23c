//! Worker pool for background computations.

use rayon::ThreadPool;
use tracing::warn;

/// Build a cache-local pool of `threads` workers.
///
/// Falls back to a single worker, then to `None` (compute on the calling thread)
/// when the host refuses to spawn threads.
pub(crate) fn build_pool(threads: usize) -> Option<ThreadPool> {
    let requested = threads.max(1);
    let try_build = |n: usize| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("gridlayer-cache-{i}"))
            .build()
    };

    match try_build(requested) {
        Ok(pool) => Some(pool),
        Err(_) if requested > 1 => try_build(1).ok(),
        Err(e) => {
            warn!(error = %e, "no worker pool; computing on the calling thread");
            None
        }
    }
}
