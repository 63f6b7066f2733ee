//! Kernel Synchronization Support
//!
//! Thread scheduling is owned by the host kernel. The driver only needs
//! three things from it, collected in [`Scheduler`]:
//!
//! - give up the CPU while blocked on a channel lock or completion
//! - sleep for a bounded interval during the ready poll
//! - halt the system on an unrecoverable hardware failure
//!
//! On top of those the module provides the two per-channel primitives:
//!
//! - **FastMutex**: blocking mutual exclusion over a channel's register bank
//! - **KSemaphore**: binary completion signal released by the interrupt path

use core::fmt;

pub mod mutex;
pub mod semaphore;

pub use mutex::{FastMutex, FastMutexGuard};
pub use semaphore::KSemaphore;

/// Scheduler services the driver depends on
pub trait Scheduler: Sync {
    /// Give up the processor; the caller is blocked on a lock or signal
    fn yield_now(&self);

    /// Suspend the caller for at least `ms` milliseconds
    fn sleep_ms(&self, ms: u32);

    /// Stop the whole system. Never returns.
    fn halt(&self, args: fmt::Arguments<'_>) -> ! {
        panic!("{}", args)
    }
}

impl<T: Scheduler + ?Sized> Scheduler for &T {
    #[inline]
    fn yield_now(&self) {
        (**self).yield_now()
    }

    #[inline]
    fn sleep_ms(&self, ms: u32) {
        (**self).sleep_ms(ms)
    }

    fn halt(&self, args: fmt::Arguments<'_>) -> ! {
        (**self).halt(args)
    }
}
