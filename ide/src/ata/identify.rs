//! IDENTIFY DEVICE
//!
//! Runs once per present device after the registry is up. The 256-word
//! response is parsed into a [`DiskInfo`] and cached on the device.

use core::fmt;
use core::str;

use log::{info, warn};

use super::channel::AtaDevice;
use super::registry::IdeRegistry;
use super::regs::{reg, AtaCommand};
use super::transfer::abandon;
use super::{poll, protocol, pump, Direction};
use crate::error::{IdeError, IdeResult};
use crate::hal::port::PortIo;
use crate::ke::Scheduler;
use crate::SECTOR_SIZE;

/// Parsed IDENTIFY data
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DiskInfo {
    serial: [u8; 20],
    firmware: [u8; 8],
    model: [u8; 40],
    /// LBA28 addressable sectors
    pub total_sectors: u32,
}

impl DiskInfo {
    pub fn serial(&self) -> &str {
        ata_str(&self.serial)
    }

    pub fn firmware(&self) -> &str {
        ata_str(&self.firmware)
    }

    pub fn model(&self) -> &str {
        ata_str(&self.model)
    }

    /// Capacity in bytes
    pub fn capacity_bytes(&self) -> u64 {
        self.total_sectors as u64 * SECTOR_SIZE as u64
    }
}

impl fmt::Debug for DiskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskInfo")
            .field("model", &self.model())
            .field("serial", &self.serial())
            .field("firmware", &self.firmware())
            .field("total_sectors", &self.total_sectors)
            .finish()
    }
}

/// ATA strings are space padded; invalid UTF-8 reads as empty
fn ata_str(bytes: &[u8]) -> &str {
    str::from_utf8(bytes).map(|s| s.trim_end_matches(&[' ', '\0'][..])).unwrap_or("")
}

/// Copy an ATA string field, high byte of each word first
fn copy_swapped(dst: &mut [u8], words: &[u16]) {
    for (pair, word) in dst.chunks_exact_mut(2).zip(words) {
        pair.copy_from_slice(&word.to_be_bytes());
    }
}

/// Decode a raw IDENTIFY response
pub fn parse_identify(data: &[u16; 256]) -> DiskInfo {
    let mut info = DiskInfo {
        serial: [b' '; 20],
        firmware: [b' '; 8],
        model: [b' '; 40],
        total_sectors: 0,
    };

    // Words 10-19: Serial number
    copy_swapped(&mut info.serial, &data[10..20]);
    // Words 23-26: Firmware revision
    copy_swapped(&mut info.firmware, &data[23..27]);
    // Words 27-46: Model number
    copy_swapped(&mut info.model, &data[27..47]);

    // Words 60-61: Total sectors (LBA28)
    info.total_sectors = (data[61] as u32) << 16 | data[60] as u32;
    info
}

impl<P: PortIo, S: Scheduler> IdeRegistry<P, S> {
    /// Issue IDENTIFY DEVICE and cache the result on `device`
    pub fn try_identify(&self, device: &AtaDevice) -> IdeResult<DiskInfo> {
        if let Some(info) = device.info() {
            return Ok(*info);
        }

        let channel = self.channel_of(device)?;
        let _guard = channel.lock.acquire(&self.sched);

        protocol::select_device(&self.io, channel, device);
        protocol::issue_command(&self.io, channel, AtaCommand::Identify);

        // An empty slot floats the bus and will never interrupt. The
        // alternate status register leaves a pending interrupt untouched.
        let status = self.io.inb(channel.reg(reg::ALT_STATUS));
        if status == 0x00 || status == 0xFF {
            abandon(channel);
            return Err(IdeError::NoSuchDevice {
                channel: channel.index(),
                device: device.index(),
            });
        }

        channel.disk_done.wait(&self.sched);

        if !poll::wait_until_ready(&self.io, &self.sched, channel, &self.config) {
            abandon(channel);
            return Err(IdeError::NotReady {
                device: device.name(),
                lba: 0,
                direction: Direction::Identify,
            });
        }

        let mut raw = [0u8; SECTOR_SIZE];
        pump::pull(&self.io, channel, &mut raw, 1);

        let mut words = [0u16; 256];
        for (word, bytes) in words.iter_mut().zip(raw.chunks_exact(2)) {
            *word = u16::from_le_bytes([bytes[0], bytes[1]]);
        }

        Ok(*device.record_info(parse_identify(&words)))
    }
}

/// Identify every present device, returning how many answered
pub fn probe<P: PortIo, S: Scheduler>(registry: &IdeRegistry<P, S>) -> usize {
    let mut found = 0;
    for device in registry.devices() {
        match registry.try_identify(device) {
            Ok(info) => {
                info!(
                    "ide: {}: {} ({} sectors, {} MiB)",
                    device.name(),
                    info.model(),
                    info.total_sectors,
                    info.capacity_bytes() / (1024 * 1024)
                );
                found += 1;
            }
            Err(err) => warn!("ide: {}: {}", device.name(), err),
        }
    }
    found
}
