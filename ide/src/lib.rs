//! IDE/ATA Disk Driver (PIO mode)
//!
//! Interrupt-driven driver for the two legacy IDE channels, transferring
//! sector data by programmed I/O.
//!
//! # Architecture Overview
//!
//! - **hal** - Port I/O and interrupt dispatch abstractions
//! - **ke** - Blocking primitives: channel mutex, completion semaphore, scheduler hooks
//! - **ata** - Register protocol, data pump, ready poll, transfer engine, channel registry
//! - **io** - Block device facade and the boot-time image preload path
//!
//! # Control Flow
//!
//! ```text
//! read/write ──► select/program/issue ──► (IRQ 14/15) ──► on_signal
//!     ▲                                                       │
//!     └──── wait_until_ready ◄── disk_done.wait ◄─────────────┘
//! ```
//!
//! The registry is built once at startup ([`ata::ide_init`]) and is
//! read-only afterwards apart from each channel's synchronization state.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::new_without_default)]
#![allow(clippy::missing_safety_doc)]

pub mod ata;
pub mod config;
pub mod error;
pub mod hal;
pub mod io;
pub mod ke;

#[cfg(test)]
pub(crate) mod testing;

pub use ata::{ide_init, AtaDevice, Direction, IdeChannel, IdeRegistry};
pub use config::IdeConfig;
pub use error::{IdeError, IdeResult};
pub use hal::interrupt::{InterruptDispatcher, InterruptHandler, VectorTable};
pub use hal::port::PortIo;
pub use ke::Scheduler;

/// Bytes per sector
pub const SECTOR_SIZE: usize = 512;
