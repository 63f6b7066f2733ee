//! Busy/Ready Poll
//!
//! The only timeout in the driver. While BSY is set the caller sleeps in
//! `poll_interval_ms` steps through the scheduler, so a slow drive never
//! starves other threads. Once BSY clears the answer is DRQ.

use super::channel::IdeChannel;
use super::regs::{reg, AtaStatus};
use crate::config::IdeConfig;
use crate::hal::port::PortIo;
use crate::ke::Scheduler;

/// Wait for BSY to clear, then report whether the drive requests data
///
/// Returns false if BSY is still set after `ready_timeout_ms`.
pub fn wait_until_ready<P, S>(io: &P, sched: &S, channel: &IdeChannel, config: &IdeConfig) -> bool
where
    P: PortIo + ?Sized,
    S: Scheduler + ?Sized,
{
    let step = config.poll_interval_ms.max(1);
    let mut remaining = config.ready_timeout_ms;

    loop {
        let status = AtaStatus::from_bits_retain(io.inb(channel.reg(reg::STATUS)));
        if !status.contains(AtaStatus::BSY) {
            return status.contains(AtaStatus::DRQ);
        }
        if remaining == 0 {
            return false;
        }

        let slice = step.min(remaining);
        sched.sleep_ms(slice);
        remaining -= slice;
    }
}
