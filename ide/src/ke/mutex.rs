//! Fast Mutex Implementation
//!
//! Mutual exclusion that blocks instead of spinning: a contended acquirer
//! hands the processor back to the scheduler between attempts. Used as the
//! per-channel lock, held across every chunk of a transfer.
//!
//! Must not be acquired from interrupt context.
//!
//! # Usage
//! ```ignore
//! let mutex = FastMutex::new();
//! {
//!     let _guard = mutex.acquire(&scheduler);
//!     // ... critical section ...
//! }
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::Scheduler;

/// Fast mutex structure
pub struct FastMutex {
    /// Lock state (true = held)
    locked: AtomicBool,
    /// Contention count (statistics)
    contention: AtomicU32,
}

impl FastMutex {
    /// Create a new unlocked fast mutex
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            contention: AtomicU32::new(0),
        }
    }

    /// Acquire the fast mutex
    ///
    /// Blocks if the mutex is held by another thread.
    pub fn acquire<'a, S: Scheduler + ?Sized>(&'a self, sched: &S) -> FastMutexGuard<'a> {
        if !self.try_lock() {
            self.contention.fetch_add(1, Ordering::Relaxed);
            while !self.try_lock() {
                sched.yield_now();
            }
        }

        FastMutexGuard { mutex: self }
    }

    /// Try to acquire without blocking
    pub fn try_acquire(&self) -> Option<FastMutexGuard<'_>> {
        if self.try_lock() {
            Some(FastMutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Check if the mutex is currently held
    #[inline]
    pub fn is_held(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Get contention count (for debugging/statistics)
    #[inline]
    pub fn contention_count(&self) -> u32 {
        self.contention.load(Ordering::Relaxed)
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

impl Default for FastMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for fast mutex
pub struct FastMutexGuard<'a> {
    mutex: &'a FastMutex,
}

impl Drop for FastMutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}
