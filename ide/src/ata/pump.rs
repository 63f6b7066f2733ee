//! PIO Data Pump
//!
//! Moves sector payloads between a byte buffer and the data register as
//! little-endian 16-bit words.
//!
//! Sizing follows the sector-count register, where 0 encodes 256 sectors.

use super::channel::IdeChannel;
use super::regs::{reg, MAX_SECTORS_PER_COMMAND};
use crate::hal::port::PortIo;
use crate::SECTOR_SIZE;

const WORDS_PER_SECTOR: usize = SECTOR_SIZE / 2;

/// Sector-count register value for a chunk of 1..=256 sectors
#[inline]
pub const fn sector_field(sectors: u32) -> u8 {
    debug_assert!(sectors >= 1 && sectors <= MAX_SECTORS_PER_COMMAND);
    sectors as u8
}

/// Sectors a sector-count register value stands for
#[inline]
pub const fn sectors_in_field(field: u8) -> usize {
    if field == 0 {
        MAX_SECTORS_PER_COMMAND as usize
    } else {
        field as usize
    }
}

/// Bytes moved for a sector-count register value
#[inline]
pub const fn transfer_len(field: u8) -> usize {
    sectors_in_field(field) * SECTOR_SIZE
}

/// Read `transfer_len(field)` bytes from the data register into `buf`
pub fn pull<P: PortIo + ?Sized>(io: &P, channel: &IdeChannel, buf: &mut [u8], field: u8) {
    let buf = &mut buf[..transfer_len(field)];
    let mut words = [0u16; WORDS_PER_SECTOR];

    for sector in buf.chunks_exact_mut(SECTOR_SIZE) {
        io.insw(channel.reg(reg::DATA), &mut words);
        for (bytes, word) in sector.chunks_exact_mut(2).zip(words.iter()) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
    }
}

/// Write `transfer_len(field)` bytes from `buf` to the data register
pub fn push<P: PortIo + ?Sized>(io: &P, channel: &IdeChannel, buf: &[u8], field: u8) {
    let buf = &buf[..transfer_len(field)];
    let mut words = [0u16; WORDS_PER_SECTOR];

    for sector in buf.chunks_exact(SECTOR_SIZE) {
        for (word, bytes) in words.iter_mut().zip(sector.chunks_exact(2)) {
            *word = u16::from_le_bytes([bytes[0], bytes[1]]);
        }
        io.outsw(channel.reg(reg::DATA), &words);
    }
}
