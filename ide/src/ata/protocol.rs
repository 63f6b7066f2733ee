//! ATA Register Protocol
//!
//! Encodes commands onto a channel's register bank. Callers must hold the
//! channel mutex: these functions assume exclusive use of the registers.

use core::sync::atomic::Ordering;

use super::channel::{AtaDevice, IdeChannel};
use super::regs::{reg, AtaCommand, DeviceSelect};
use crate::hal::port::PortIo;

/// Select the device a following command targets
pub fn select_device<P: PortIo + ?Sized>(io: &P, channel: &IdeChannel, device: &AtaDevice) {
    io.outb(
        channel.reg(reg::DEVICE),
        DeviceSelect::for_device(device.index()).bits(),
    );
}

/// Load the start address and sector count
///
/// `sector_field` is the raw register byte: 0 means 256 sectors.
pub fn program_transfer<P: PortIo + ?Sized>(
    io: &P,
    channel: &IdeChannel,
    device: &AtaDevice,
    lba: u32,
    sector_field: u8,
    max_lba: u32,
) {
    assert!(lba <= max_lba, "ide: lba {} beyond max lba {}", lba, max_lba);

    io.outb(channel.reg(reg::SECTOR_COUNT), sector_field);

    io.outb(channel.reg(reg::LBA_LOW), lba as u8);
    io.outb(channel.reg(reg::LBA_MID), (lba >> 8) as u8);
    io.outb(channel.reg(reg::LBA_HIGH), (lba >> 16) as u8);

    // LBA bits 24-27 share the device register, so it is written again whole
    io.outb(
        channel.reg(reg::DEVICE),
        DeviceSelect::for_device(device.index()).with_lba_high(lba),
    );
}

/// Issue a command
///
/// The outstanding-command flag is raised before the opcode reaches the
/// device: the completion interrupt may fire as soon as it does.
pub fn issue_command<P: PortIo + ?Sized>(io: &P, channel: &IdeChannel, command: AtaCommand) {
    channel.expecting_interrupt.store(true, Ordering::SeqCst);
    io.outb(channel.reg(reg::COMMAND), command.opcode());
}
