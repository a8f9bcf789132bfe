//! Named worker-thread spawning for the deferred-work pool.
//!
//! Every worker gets a stable name (`pwmled-wq/<n>`) and an explicit stack
//! size so it is easy to spot in a debugger or `top -H`.

use std::io;
use std::thread::{Builder, JoinHandle};

/// Thread names, indexed by worker number.
const WORKER_NAMES: [&str; 4] = ["pwmled-wq/0", "pwmled-wq/1", "pwmled-wq/2", "pwmled-wq/3"];

/// Maximum workers a pool can spawn.
pub const MAX_WORKERS: usize = WORKER_NAMES.len();

/// Stack size for a worker.  Work items are small, non-recursive closures.
const WORKER_STACK_KB: usize = 64;

/// Spawn worker `index` running `f`.
///
/// Fails with `InvalidInput` if `index` is outside `0..MAX_WORKERS`.
pub fn spawn_worker(
    index: usize,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let name = WORKER_NAMES
        .get(index)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "worker index out of range"))?;

    log::debug!("Spawning '{}' (stack={}KB)", name, WORKER_STACK_KB);

    Builder::new()
        .name((*name).into())
        .stack_size(WORKER_STACK_KB * 1024)
        .spawn(f)
}
