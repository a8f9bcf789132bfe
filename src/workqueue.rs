//! Deferred-work queue.
//!
//! A small pool of worker threads executing [`Work`] items, with the two
//! guarantees the driver relies on:
//!
//! - **Idempotent scheduling.**  [`Work::schedule`] on an item that is
//!   already pending is a no-op and returns `false`.  An item becomes
//!   schedulable again the moment a worker starts running it, so a body may
//!   resubmit itself.
//! - **Non-reentrancy.**  One item never runs on two workers at once; a
//!   second worker picking up the same item waits for the first to finish.
//!
//! [`Work::cancel_sync`] stops an item for good: it waits for an in-flight
//! run to complete and makes every later `schedule` (including a body's
//! self-resubmission) fail.
//!
//! ```text
//! ┌──────────────┐  schedule()  ┌──────────────┐     ┌────────────┐
//! │ IRQ handler  │─────────────▶│              │────▶│ wq/0       │
//! │ Work bodies  │─────────────▶│  FIFO queue  │     │ wq/1       │
//! └──────────────┘              └──────────────┘────▶│ ...        │
//!                                                     └────────────┘
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::JoinHandle;

use log::{debug, error, info};

use crate::drivers::task_pin::{MAX_WORKERS, spawn_worker};
use crate::error::{Error, Result};

const PENDING: u8 = 0b01;
const CANCELED: u8 = 0b10;

type WorkFn = Box<dyn Fn(&Work) + Send + Sync>;

// ═══════════════════════════════════════════════════════════════
//  Work item
// ═══════════════════════════════════════════════════════════════

/// A unit of deferred work bound to one [`WorkQueue`].
pub struct Work {
    name: &'static str,
    flags: AtomicU8,
    /// Held for the whole duration of a run.
    running: Mutex<()>,
    func: WorkFn,
    queue: Weak<Shared>,
    this: Weak<Work>,
}

impl Work {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Queue the item for execution.
    ///
    /// Returns `true` if it was queued, `false` if it was already pending,
    /// has been cancelled, or the queue is shut down.
    pub fn schedule(&self) -> bool {
        let claimed = self
            .flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |f| {
                (f & (PENDING | CANCELED) == 0).then_some(f | PENDING)
            })
            .is_ok();
        if !claimed {
            return false;
        }

        let queued = match (self.queue.upgrade(), self.this.upgrade()) {
            (Some(queue), Some(work)) => queue.enqueue(work),
            _ => false,
        };
        if !queued {
            self.flags.fetch_and(!PENDING, Ordering::AcqRel);
        }
        queued
    }

    /// Cancel the item and wait for any in-flight run to finish.
    ///
    /// After this returns the body is not running and never runs again.
    /// Returns whether the item was pending at the time of the call.
    pub fn cancel_sync(&self) -> bool {
        let prev = self.flags.fetch_or(CANCELED, Ordering::AcqRel);
        self.flags.fetch_and(!PENDING, Ordering::AcqRel);
        drop(lock(&self.running));
        debug!("work '{}' cancelled", self.name);
        prev & PENDING != 0
    }

    /// Queued but not yet started.
    pub fn is_pending(&self) -> bool {
        self.flags.load(Ordering::Acquire) & PENDING != 0
    }

    pub fn is_canceled(&self) -> bool {
        self.flags.load(Ordering::Acquire) & CANCELED != 0
    }

    fn execute(&self) {
        let _running = lock(&self.running);

        // Clear PENDING before the body runs so it can resubmit itself.
        let prev = self.flags.fetch_and(!PENDING, Ordering::AcqRel);
        if prev & CANCELED != 0 {
            return;
        }

        if catch_unwind(AssertUnwindSafe(|| (self.func)(self))).is_err() {
            error!("work '{}' panicked", self.name);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Queue
// ═══════════════════════════════════════════════════════════════

struct Shared {
    /// `None` once the queue is shutting down.
    sender: Mutex<Option<Sender<Arc<Work>>>>,
}

impl Shared {
    fn enqueue(&self, work: Arc<Work>) -> bool {
        lock(&self.sender)
            .as_ref()
            .is_some_and(|tx| tx.send(work).is_ok())
    }
}

/// Pool of worker threads draining a shared FIFO of [`Work`] items.
pub struct WorkQueue {
    name: &'static str,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkQueue {
    /// Spawn `workers` threads (clamped to `1..=4`).
    pub fn new(name: &'static str, workers: usize) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Arc<Work>>();
        let rx = Arc::new(Mutex::new(rx));
        let mut queue = Self {
            name,
            shared: Arc::new(Shared {
                sender: Mutex::new(Some(tx)),
            }),
            workers: Vec::new(),
        };

        for index in 0..workers.clamp(1, MAX_WORKERS) {
            let rx = Arc::clone(&rx);
            match spawn_worker(index, move || worker_loop(&rx)) {
                Ok(handle) => queue.workers.push(handle),
                Err(e) => {
                    error!("{}: worker {} spawn failed: {}", name, index, e);
                    // Dropping `queue` joins the workers already running.
                    return Err(Error::WorkQueue("worker spawn failed"));
                }
            }
        }

        info!("{}: {} worker(s) started", name, queue.workers.len());
        Ok(queue)
    }

    /// Create a work item bound to this queue.  It does nothing until
    /// [`Work::schedule`] is called.
    pub fn create_work(
        &self,
        name: &'static str,
        func: impl Fn(&Work) + Send + Sync + 'static,
    ) -> Arc<Work> {
        let queue = Arc::downgrade(&self.shared);
        Arc::new_cyclic(|this| Work {
            name,
            flags: AtomicU8::new(0),
            running: Mutex::new(()),
            func: Box::new(func),
            queue,
            this: this.clone(),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting work, let the workers drain the queue and join them.
    ///
    /// Items still queued run once more unless they were cancelled first.
    pub fn shutdown(mut self) {
        self.stop_workers();
    }

    fn stop_workers(&mut self) {
        lock(&self.shared.sender).take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("{}: worker exited by panic", self.name);
            }
        }
        debug!("{}: stopped", self.name);
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

fn worker_loop(rx: &Mutex<Receiver<Arc<Work>>>) {
    loop {
        let next = lock(rx).recv();
        match next {
            Ok(work) => work.execute(),
            Err(_) => break, // queue shut down and drained
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
