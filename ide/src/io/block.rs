//! Block Device Abstraction
//!
//! A uniform sector-addressed interface for consumers that should not know
//! about channels, registers or chunking.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   preload / file systems     │
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │  BlockDevice (AtaBlockDevice)│
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │  IdeRegistry try_read/write  │
//! └──────────────────────────────┘
//! ```

use crate::ata::{AtaDevice, IdeRegistry};
use crate::error::{IdeError, IdeResult};
use crate::hal::port::PortIo;
use crate::ke::Scheduler;
use crate::SECTOR_SIZE;

/// Disk geometry information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskGeometry {
    /// Total number of sectors
    pub total_sectors: u64,
    /// Bytes per sector
    pub sector_size: u32,
}

impl DiskGeometry {
    /// Get total size in bytes
    pub fn total_bytes(&self) -> u64 {
        self.total_sectors * self.sector_size as u64
    }

    /// Get size in megabytes
    pub fn size_mb(&self) -> u64 {
        self.total_bytes() / (1024 * 1024)
    }
}

/// Sector-addressed storage
pub trait BlockDevice {
    fn name(&self) -> &str;

    /// Fill `buf` from consecutive sectors starting at `lba`
    ///
    /// `buf.len()` must be a non-zero multiple of the sector size.
    fn read_blocks(&self, lba: u32, buf: &mut [u8]) -> IdeResult<()>;

    /// Store `buf` to consecutive sectors starting at `lba`
    fn write_blocks(&self, lba: u32, buf: &[u8]) -> IdeResult<()>;

    fn geometry(&self) -> DiskGeometry;
}

/// Sectors covered by a whole-sector buffer
fn sectors_for(len: usize) -> IdeResult<u32> {
    if len % SECTOR_SIZE != 0 {
        return Err(IdeError::Misaligned { len });
    }
    u32::try_from(len / SECTOR_SIZE).map_err(|_| IdeError::Misaligned { len })
}

/// Block device backed by one ATA device
pub struct AtaBlockDevice<'a, P, S> {
    registry: &'a IdeRegistry<P, S>,
    device: &'a AtaDevice,
}

impl<'a, P: PortIo, S: Scheduler> AtaBlockDevice<'a, P, S> {
    pub fn new(registry: &'a IdeRegistry<P, S>, device: &'a AtaDevice) -> Self {
        Self { registry, device }
    }

    /// Open a device by name ("sda".."sdd")
    pub fn open(registry: &'a IdeRegistry<P, S>, name: &str) -> Option<Self> {
        registry.device_by_name(name).map(|device| Self::new(registry, device))
    }

    pub fn device(&self) -> &AtaDevice {
        self.device
    }
}

impl<P: PortIo, S: Scheduler> BlockDevice for AtaBlockDevice<'_, P, S> {
    fn name(&self) -> &str {
        self.device.name()
    }

    fn read_blocks(&self, lba: u32, buf: &mut [u8]) -> IdeResult<()> {
        let count = sectors_for(buf.len())?;
        self.registry.try_read(self.device, lba, buf, count)
    }

    fn write_blocks(&self, lba: u32, buf: &[u8]) -> IdeResult<()> {
        let count = sectors_for(buf.len())?;
        self.registry.try_write(self.device, lba, buf, count)
    }

    /// Reported capacity, clipped to what the driver can address
    fn geometry(&self) -> DiskGeometry {
        let ceiling = self.registry.config().capacity_sectors();
        let total_sectors = match self.device.info() {
            Some(info) => (info.total_sectors as u64).min(ceiling),
            None => ceiling,
        };
        DiskGeometry {
            total_sectors,
            sector_size: SECTOR_SIZE as u32,
        }
    }
}
