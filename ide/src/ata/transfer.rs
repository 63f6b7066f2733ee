//! Transfer Engine
//!
//! Public read/write entry points. A request is split into chunks of at most
//! 256 sectors, one device command each, all under a single acquisition of
//! the channel mutex.
//!
//! Per-chunk sequence:
//!
//! ```text
//! read:  select ─► program ─► READ  ─► wait IRQ ─► poll ─► pull
//! write: select ─► program ─► WRITE ─► poll ─► push ─► wait IRQ
//! ```
//!
//! The write order is dictated by the device: DRQ must be seen before the
//! data phase, and the completion interrupt follows the data phase.

use core::ops::Range;
use core::sync::atomic::Ordering;

use log::{debug, error, trace};

use super::channel::{AtaDevice, IdeChannel};
use super::regs::{AtaCommand, MAX_SECTORS_PER_COMMAND};
use super::registry::IdeRegistry;
use super::{poll, protocol, pump, Direction};
use crate::config::IdeConfig;
use crate::error::{IdeError, IdeResult};
use crate::hal::port::PortIo;
use crate::ke::Scheduler;
use crate::SECTOR_SIZE;

/// One device command's share of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// First sector of this chunk
    pub lba: u32,
    /// Sectors in this chunk (1..=256)
    pub sectors: u32,
    /// Byte offset of this chunk in the request buffer
    pub offset: usize,
}

impl Chunk {
    /// Sector-count register value (256 encodes as 0)
    #[inline]
    pub const fn sector_field(&self) -> u8 {
        pump::sector_field(self.sectors)
    }

    /// Bytes of the request buffer this chunk covers
    #[inline]
    pub fn byte_range(&self) -> Range<usize> {
        self.offset..self.offset + self.sectors as usize * SECTOR_SIZE
    }
}

/// Splits a request into per-command chunks
#[derive(Debug, Clone)]
pub struct Chunks {
    lba: u32,
    total: u32,
    done: u32,
}

impl Chunks {
    pub const fn new(lba: u32, sector_count: u32) -> Self {
        Self {
            lba,
            total: sector_count,
            done: 0,
        }
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done >= self.total {
            return None;
        }

        let sectors = (self.total - self.done).min(MAX_SECTORS_PER_COMMAND);
        // Stop at the end of the 32-bit address space
        let lba = self.lba.checked_add(self.done)?;
        let chunk = Chunk {
            lba,
            sectors,
            offset: self.done as usize * SECTOR_SIZE,
        };
        self.done += sectors;
        Some(chunk)
    }
}

/// Reject requests the hardware must never see
fn validate(config: &IdeConfig, lba: u32, sector_count: u32, buf_len: usize) -> IdeResult<()> {
    if sector_count == 0 {
        return Err(IdeError::ZeroSectors);
    }
    if !config.contains(lba, sector_count) {
        return Err(IdeError::LbaOutOfRange {
            lba,
            sector_count,
            max_lba: config.max_lba,
        });
    }

    let needed = sector_count as usize * SECTOR_SIZE;
    if buf_len < needed {
        return Err(IdeError::BufferTooSmall {
            needed,
            actual: buf_len,
        });
    }
    Ok(())
}

impl<P: PortIo, S: Scheduler> IdeRegistry<P, S> {
    /// Read `sector_count` sectors starting at `lba` into `buf`
    ///
    /// Hardware timeouts halt the system; invalid arguments panic before any
    /// register is touched.
    pub fn read(&self, device: &AtaDevice, lba: u32, buf: &mut [u8], sector_count: u32) {
        if let Err(err) = self.try_read(device, lba, buf, sector_count) {
            self.fail(err);
        }
    }

    /// Write `sector_count` sectors from `buf` starting at `lba`
    ///
    /// Hardware timeouts halt the system; invalid arguments panic before any
    /// register is touched.
    pub fn write(&self, device: &AtaDevice, lba: u32, buf: &[u8], sector_count: u32) {
        if let Err(err) = self.try_write(device, lba, buf, sector_count) {
            self.fail(err);
        }
    }

    /// Read, reporting every failure to the caller
    pub fn try_read(
        &self,
        device: &AtaDevice,
        lba: u32,
        buf: &mut [u8],
        sector_count: u32,
    ) -> IdeResult<()> {
        let channel = self.channel_of(device)?;
        validate(&self.config, lba, sector_count, buf.len())?;

        let _guard = channel.lock.acquire(&self.sched);
        debug!("ide: {} read lba {} count {}", device.name(), lba, sector_count);

        for chunk in Chunks::new(lba, sector_count) {
            self.read_chunk(channel, device, &chunk, &mut buf[chunk.byte_range()])?;
        }
        Ok(())
    }

    /// Write, reporting every failure to the caller
    pub fn try_write(
        &self,
        device: &AtaDevice,
        lba: u32,
        buf: &[u8],
        sector_count: u32,
    ) -> IdeResult<()> {
        let channel = self.channel_of(device)?;
        validate(&self.config, lba, sector_count, buf.len())?;

        let _guard = channel.lock.acquire(&self.sched);
        debug!("ide: {} write lba {} count {}", device.name(), lba, sector_count);

        for chunk in Chunks::new(lba, sector_count) {
            self.write_chunk(channel, device, &chunk, &buf[chunk.byte_range()])?;
        }
        Ok(())
    }

    fn read_chunk(
        &self,
        channel: &IdeChannel,
        device: &AtaDevice,
        chunk: &Chunk,
        buf: &mut [u8],
    ) -> IdeResult<()> {
        let field = chunk.sector_field();

        protocol::select_device(&self.io, channel, device);
        protocol::program_transfer(&self.io, channel, device, chunk.lba, field, self.config.max_lba);
        trace!("ide: {} READ lba {} x{}", device.name(), chunk.lba, chunk.sectors);
        protocol::issue_command(&self.io, channel, AtaCommand::ReadSectors);

        // The device is working now; sleep until its interrupt
        channel.disk_done.wait(&self.sched);

        if !poll::wait_until_ready(&self.io, &self.sched, channel, &self.config) {
            return Err(IdeError::NotReady {
                device: device.name(),
                lba: chunk.lba,
                direction: Direction::Read,
            });
        }

        pump::pull(&self.io, channel, buf, field);
        Ok(())
    }

    fn write_chunk(
        &self,
        channel: &IdeChannel,
        device: &AtaDevice,
        chunk: &Chunk,
        buf: &[u8],
    ) -> IdeResult<()> {
        let field = chunk.sector_field();

        protocol::select_device(&self.io, channel, device);
        protocol::program_transfer(&self.io, channel, device, chunk.lba, field, self.config.max_lba);
        trace!("ide: {} WRITE lba {} x{}", device.name(), chunk.lba, chunk.sectors);
        protocol::issue_command(&self.io, channel, AtaCommand::WriteSectors);

        if !poll::wait_until_ready(&self.io, &self.sched, channel, &self.config) {
            abandon(channel);
            return Err(IdeError::NotReady {
                device: device.name(),
                lba: chunk.lba,
                direction: Direction::Write,
            });
        }

        pump::push(&self.io, channel, buf, field);

        // Completion is signaled once the device has consumed the data
        channel.disk_done.wait(&self.sched);
        Ok(())
    }

    /// Terminal handling for the non-recoverable entry points
    fn fail(&self, err: IdeError) -> ! {
        if err.is_hardware_fault() {
            error!("ide: {}", err);
            self.sched.halt(format_args!("{}", err));
        }
        panic!("ide: {}", err);
    }
}

/// Forget a command whose completion will never be waited for
///
/// A late interrupt must not satisfy the next request's wait.
pub(crate) fn abandon(channel: &IdeChannel) {
    channel.expecting_interrupt.store(false, Ordering::SeqCst);
    channel.disk_done.try_wait();
}
