//! IDE Channels and Devices
//!
//! A channel owns one register bank and everything needed to run a single
//! outstanding command on it: the mutex serializing requests, the
//! outstanding-command flag read by the interrupt path, and the completion
//! semaphore the interrupt path releases.
//!
//! Devices refer back to their channel by index. Both live inside the
//! registry for the lifetime of the system.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Once;

use super::identify::DiskInfo;
use super::regs::{legacy_assignment, DEVICES_PER_CHANNEL};
use crate::ke::{FastMutex, KSemaphore};

const CHANNEL_NAMES: [&str; 2] = ["ide0", "ide1"];
const DEVICE_NAMES: [[&str; DEVICES_PER_CHANNEL]; 2] = [["sda", "sdb"], ["sdc", "sdd"]];

/// IDE channel
pub struct IdeChannel {
    name: &'static str,
    index: usize,
    port_base: u16,
    vector: u8,
    /// A command was issued and its interrupt has not been serviced yet
    pub(crate) expecting_interrupt: AtomicBool,
    /// Held by a request for its whole duration
    pub(crate) lock: FastMutex,
    /// Released by the interrupt handler when a command completes
    pub(crate) disk_done: KSemaphore,
    devices: [AtaDevice; DEVICES_PER_CHANNEL],
}

impl IdeChannel {
    /// Build channel `index` with its legacy port base and vector
    ///
    /// `present` is the number of devices firmware reported on this channel.
    pub(crate) const fn new(index: usize, present: usize) -> Self {
        let (port_base, vector) = legacy_assignment(index);
        Self {
            name: CHANNEL_NAMES[index],
            index,
            port_base,
            vector,
            expecting_interrupt: AtomicBool::new(false),
            lock: FastMutex::new(),
            disk_done: KSemaphore::new(),
            devices: [
                AtaDevice::new(index, 0, present > 0),
                AtaDevice::new(index, 1, present > 1),
            ],
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn port_base(&self) -> u16 {
        self.port_base
    }

    pub fn vector(&self) -> u8 {
        self.vector
    }

    /// Absolute port of a register
    #[inline]
    pub const fn reg(&self, offset: u16) -> u16 {
        self.port_base + offset
    }

    /// Check if a command is outstanding
    #[inline]
    pub fn is_expecting_interrupt(&self) -> bool {
        self.expecting_interrupt.load(Ordering::Acquire)
    }

    /// Check if a request currently owns the channel
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.lock.is_held()
    }

    /// Both device slots, present or not
    pub fn slots(&self) -> &[AtaDevice; DEVICES_PER_CHANNEL] {
        &self.devices
    }

    /// Devices firmware reported on this channel
    pub fn devices(&self) -> impl Iterator<Item = &AtaDevice> {
        self.devices.iter().filter(|device| device.is_present())
    }
}

/// ATA device on a channel
pub struct AtaDevice {
    name: &'static str,
    channel: usize,
    index: u8,
    present: bool,
    info: Once<DiskInfo>,
}

impl AtaDevice {
    const fn new(channel: usize, index: u8, present: bool) -> Self {
        Self {
            name: DEVICE_NAMES[channel][index as usize],
            channel,
            index,
            present,
            info: Once::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Index of the owning channel
    pub fn channel_index(&self) -> usize {
        self.channel
    }

    /// 0 = master, 1 = slave
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn is_slave(&self) -> bool {
        self.index == 1
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// IDENTIFY data, once the device has been identified
    pub fn info(&self) -> Option<&DiskInfo> {
        self.info.get()
    }

    pub(crate) fn record_info(&self, info: DiskInfo) -> &DiskInfo {
        self.info.call_once(|| info)
    }
}
