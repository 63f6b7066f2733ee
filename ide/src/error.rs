//! IDE Error Types

use core::fmt;

use crate::ata::Direction;

/// IDE driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeError {
    /// Transfer requested zero sectors
    ZeroSectors,
    /// Transfer would cross the addressable ceiling
    LbaOutOfRange {
        lba: u32,
        sector_count: u32,
        max_lba: u32,
    },
    /// Caller buffer cannot hold the requested sectors
    BufferTooSmall { needed: usize, actual: usize },
    /// Buffer length is not a whole number of sectors
    Misaligned { len: usize },
    /// No device registered at this position
    NoSuchDevice { channel: usize, device: u8 },
    /// Drive stayed busy past the ready budget, or never raised DRQ
    NotReady {
        device: &'static str,
        lba: u32,
        direction: Direction,
    },
}

/// Result type for IDE operations
pub type IdeResult<T> = Result<T, IdeError>;

impl IdeError {
    /// Hardware failures halt the system on the fatal path; everything
    /// else is a caller bug.
    pub fn is_hardware_fault(&self) -> bool {
        matches!(self, IdeError::NotReady { .. })
    }
}

impl fmt::Display for IdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IdeError::ZeroSectors => write!(f, "sector count must be non-zero"),
            IdeError::LbaOutOfRange {
                lba,
                sector_count,
                max_lba,
            } => write!(
                f,
                "lba {} + {} sectors exceeds max lba {}",
                lba, sector_count, max_lba
            ),
            IdeError::BufferTooSmall { needed, actual } => {
                write!(f, "buffer holds {} bytes, transfer needs {}", actual, needed)
            }
            IdeError::Misaligned { len } => {
                write!(f, "buffer length {} is not a multiple of the sector size", len)
            }
            IdeError::NoSuchDevice { channel, device } => {
                write!(f, "no device {} on channel {}", device, channel)
            }
            IdeError::NotReady {
                device,
                lba,
                direction,
            } => write!(f, "{} {} sector {} failed", device, direction, lba),
        }
    }
}
