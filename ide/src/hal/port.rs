//! Port I/O
//!
//! The driver never touches `in`/`out` directly; every register access goes
//! through [`PortIo`] so a simulated controller can stand in for hardware.

/// Port-mapped I/O access
///
/// Word transfers move little-endian 16-bit words, matching `REP INSW` /
/// `REP OUTSW` against the ATA data register.
pub trait PortIo: Sync {
    /// Read a byte from an I/O port
    fn inb(&self, port: u16) -> u8;

    /// Write a byte to an I/O port
    fn outb(&self, port: u16, value: u8);

    /// Read `buf.len()` words from an I/O port
    fn insw(&self, port: u16, buf: &mut [u16]);

    /// Write every word of `buf` to an I/O port
    fn outsw(&self, port: u16, buf: &[u16]);
}

impl<T: PortIo + ?Sized> PortIo for &T {
    #[inline]
    fn inb(&self, port: u16) -> u8 {
        (**self).inb(port)
    }

    #[inline]
    fn outb(&self, port: u16, value: u8) {
        (**self).outb(port, value)
    }

    #[inline]
    fn insw(&self, port: u16, buf: &mut [u16]) {
        (**self).insw(port, buf)
    }

    #[inline]
    fn outsw(&self, port: u16, buf: &[u16]) {
        (**self).outsw(port, buf)
    }
}

#[cfg(target_arch = "x86_64")]
pub use self::x86::X86PortIo;

#[cfg(target_arch = "x86_64")]
mod x86 {
    use x86_64::instructions::port::{PortReadOnly, PortWriteOnly};

    use super::PortIo;

    /// Real port I/O on x86_64
    pub struct X86PortIo {
        _private: (),
    }

    impl X86PortIo {
        /// # Safety
        /// The caller must own the legacy IDE port ranges (0x1F0-0x1F7,
        /// 0x3F6, 0x170-0x177, 0x376) and be running at a privilege level
        /// that permits port I/O.
        pub const unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl PortIo for X86PortIo {
        #[inline]
        fn inb(&self, port: u16) -> u8 {
            let mut port: PortReadOnly<u8> = PortReadOnly::new(port);
            unsafe { port.read() }
        }

        #[inline]
        fn outb(&self, port: u16, value: u8) {
            let mut port: PortWriteOnly<u8> = PortWriteOnly::new(port);
            unsafe { port.write(value) }
        }

        #[inline]
        fn insw(&self, port: u16, buf: &mut [u16]) {
            let mut port: PortReadOnly<u16> = PortReadOnly::new(port);
            for word in buf.iter_mut() {
                *word = unsafe { port.read() };
            }
        }

        #[inline]
        fn outsw(&self, port: u16, buf: &[u16]) {
            let mut port: PortWriteOnly<u16> = PortWriteOnly::new(port);
            for &word in buf.iter() {
                unsafe { port.write(word) };
            }
        }
    }
}
