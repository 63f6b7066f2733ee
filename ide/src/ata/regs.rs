//! ATA Register Layout
//!
//! # I/O Ports
//! Primary channel: 0x1F0-0x1F7, control at 0x3F6
//! Secondary channel: 0x170-0x177, control at 0x376
//!
//! # Commands
//! - IDENTIFY (0xEC): Get device information
//! - READ SECTORS (0x20): Read sectors in PIO mode
//! - WRITE SECTORS (0x30): Write sectors in PIO mode

use bitflags::bitflags;

/// Register offsets from a channel's port base
pub mod reg {
    pub const DATA: u16 = 0x00;
    pub const ERROR: u16 = 0x01; // Read
    pub const FEATURES: u16 = 0x01; // Write
    pub const SECTOR_COUNT: u16 = 0x02;
    pub const LBA_LOW: u16 = 0x03;
    pub const LBA_MID: u16 = 0x04;
    pub const LBA_HIGH: u16 = 0x05;
    pub const DEVICE: u16 = 0x06;
    pub const STATUS: u16 = 0x07; // Read
    pub const COMMAND: u16 = 0x07; // Write
    pub const ALT_STATUS: u16 = 0x206; // Read
    pub const CONTROL: u16 = 0x206; // Write
}

bitflags! {
    /// Status register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AtaStatus: u8 {
        /// Error
        const ERR = 0x01;
        /// Data request
        const DRQ = 0x08;
        /// Drive fault
        const DF = 0x20;
        /// Drive ready
        const DRDY = 0x40;
        /// Busy
        const BSY = 0x80;
    }
}

bitflags! {
    /// Device-select register bits
    ///
    /// Bits 0-3 carry LBA bits 24-27 and are not flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceSelect: u8 {
        /// Bits 7 and 5, always set
        const MBS = 0xA0;
        /// LBA addressing
        const LBA = 0x40;
        /// Slave device
        const DEV = 0x10;
    }
}

impl DeviceSelect {
    /// Device-select value for device `index` (0 = master, 1 = slave)
    pub const fn for_device(index: u8) -> Self {
        let mut bits = Self::MBS.bits() | Self::LBA.bits();
        if index == 1 {
            bits |= Self::DEV.bits();
        }
        Self::from_bits_retain(bits)
    }

    /// Register byte including LBA bits 24-27
    pub const fn with_lba_high(self, lba: u32) -> u8 {
        self.bits() | ((lba >> 24) & 0x0F) as u8
    }
}

/// ATA commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AtaCommand {
    Identify = 0xEC,
    ReadSectors = 0x20,
    WriteSectors = 0x30,
}

impl AtaCommand {
    pub const fn opcode(self) -> u8 {
        self as u8
    }
}

/// Hardware limit on sectors per command; encoded as 0 in the register
pub const MAX_SECTORS_PER_COMMAND: u32 = 256;

/// Channels on a legacy controller
pub const MAX_CHANNELS: usize = 2;

/// Devices per channel (master, slave)
pub const DEVICES_PER_CHANNEL: usize = 2;

/// Vector base the 8259 PICs are remapped to
pub const PIC_VECTOR_BASE: u8 = 0x20;

/// Primary channel port base
pub const PRIMARY_PORT_BASE: u16 = 0x1F0;

/// Secondary channel port base
pub const SECONDARY_PORT_BASE: u16 = 0x170;

/// IRQ 14: second-to-last pin on the slave PIC
pub const PRIMARY_VECTOR: u8 = PIC_VECTOR_BASE + 14;

/// IRQ 15: last pin on the slave PIC
pub const SECONDARY_VECTOR: u8 = PIC_VECTOR_BASE + 15;

/// Fixed legacy (port base, vector) assignment for a channel index
pub const fn legacy_assignment(index: usize) -> (u16, u8) {
    match index {
        0 => (PRIMARY_PORT_BASE, PRIMARY_VECTOR),
        _ => (SECONDARY_PORT_BASE, SECONDARY_VECTOR),
    }
}

/// Channel index a vector belongs to
pub const fn channel_for_vector(vector: u8) -> Option<usize> {
    match vector {
        PRIMARY_VECTOR => Some(0),
        SECONDARY_VECTOR => Some(1),
        _ => None,
    }
}
