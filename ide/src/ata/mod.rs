//! ATA/IDE Driver
//!
//! Interrupt-driven PIO driver for up to two legacy channels with up to two
//! devices each.
//!
//! - **regs**: port offsets, status and device-select bits, opcodes
//! - **protocol**: device selection, address loading, command issue
//! - **pump**: sector payload transfer over the data port
//! - **poll**: bounded wait for BSY to clear
//! - **transfer**: chunked read/write engine
//! - **registry**: channel discovery, interrupt service, initialization
//! - **identify**: IDENTIFY DEVICE and its parsed result
//!
//! One command is in flight per channel at a time. The channel mutex is
//! held for an entire request, so a multi-chunk transfer never interleaves
//! with another request on the same channel.

use core::fmt;

pub mod channel;
pub mod identify;
pub mod poll;
pub mod protocol;
pub mod pump;
pub mod regs;
pub mod registry;
pub mod transfer;

pub use channel::{AtaDevice, IdeChannel};
pub use identify::{probe, DiskInfo};
pub use registry::{bios_disk_count, ide_init, IdeRegistry};
pub use transfer::{Chunk, Chunks};

/// Direction of a device command, used in failure reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
    Identify,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Read => "read",
            Direction::Write => "write",
            Direction::Identify => "identify",
        })
    }
}
