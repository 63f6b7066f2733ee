//! Kernel Semaphore Implementation
//!
//! A binary semaphore (limit 1) used as a one-shot completion signal: the
//! requesting thread waits, the interrupt handler releases. Each release is
//! consumed by exactly one wait.
//!
//! # Usage
//! ```ignore
//! static DONE: KSemaphore = KSemaphore::new();
//!
//! // Thread: block until the device completes
//! DONE.wait(&scheduler);
//!
//! // ISR: wake the waiter
//! DONE.release();
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use super::Scheduler;

/// Maximum count
const LIMIT: u32 = 1;

/// Kernel Semaphore
pub struct KSemaphore {
    /// Current count (0 = unsignaled)
    count: AtomicU32,
}

impl KSemaphore {
    /// Create a new unsignaled semaphore
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Check if the semaphore is signaled
    #[inline]
    pub fn is_signaled(&self) -> bool {
        self.count.load(Ordering::Acquire) > 0
    }

    /// Wait (acquire) the semaphore
    ///
    /// Consumes one signal, yielding to the scheduler until one is
    /// available. Must be called from thread context (not interrupt).
    pub fn wait<S: Scheduler + ?Sized>(&self, sched: &S) {
        while !self.try_wait() {
            sched.yield_now();
        }
    }

    /// Try to acquire the semaphore without blocking
    ///
    /// Returns true if a signal was consumed
    pub fn try_wait(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .is_ok()
    }

    /// Release the semaphore
    ///
    /// Safe from interrupt context: never blocks, never panics. A release
    /// at the limit is dropped.
    ///
    /// Returns true if the count changed
    pub fn release(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < LIMIT).then_some(count + 1)
            })
            .is_ok()
    }
}

impl Default for KSemaphore {
    fn default() -> Self {
        Self::new()
    }
}
