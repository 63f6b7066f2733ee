//! IDE Channel Registry
//!
//! Built once at startup from the firmware disk count, then read-only for
//! addressing. The registry is also the interrupt handler for both legacy
//! vectors: it resolves the firing channel, retires the outstanding command
//! and wakes the waiting request.

use core::sync::atomic::Ordering;

use log::{info, trace, warn};
use spin::Once;

use super::channel::{AtaDevice, IdeChannel};
use super::regs::{channel_for_vector, reg, DEVICES_PER_CHANNEL, MAX_CHANNELS};
use crate::config::IdeConfig;
use crate::error::{IdeError, IdeResult};
use crate::hal::interrupt::{InterruptDispatcher, InterruptHandler};
use crate::hal::port::PortIo;
use crate::ke::Scheduler;

/// BIOS data area byte holding the number of fixed disks
pub const BDA_DISK_COUNT: usize = 0x475;

/// Read the fixed-disk count the BIOS left in its data area
///
/// # Safety
/// Physical address 0x475 must be identity-mapped and readable, and the BIOS
/// data area must not have been overwritten.
pub unsafe fn bios_disk_count() -> u8 {
    core::ptr::read_volatile(BDA_DISK_COUNT as *const u8)
}

/// Channels needed for `disk_count` disks, two per channel
pub const fn channel_count(disk_count: u8) -> usize {
    let needed = (disk_count as usize).div_ceil(DEVICES_PER_CHANNEL);
    if needed > MAX_CHANNELS {
        MAX_CHANNELS
    } else {
        needed
    }
}

/// IDE channel registry
pub struct IdeRegistry<P, S> {
    pub(crate) io: P,
    pub(crate) sched: S,
    pub(crate) config: IdeConfig,
    disk_count: u8,
    channels: [IdeChannel; MAX_CHANNELS],
    channel_count: usize,
}

impl<P: PortIo, S: Scheduler> IdeRegistry<P, S> {
    /// Build the registry for `disk_count` firmware-reported disks
    ///
    /// Every channel starts unlocked, unsignaled and not expecting an
    /// interrupt. Interrupts are not connected yet; see
    /// [`connect_interrupts`](Self::connect_interrupts).
    pub fn new(io: P, sched: S, config: IdeConfig, disk_count: u8) -> Self {
        info!("ide: init start, {} disk(s) reported by firmware", disk_count);

        let channel_count = channel_count(disk_count);
        if channel_count == 0 {
            warn!("ide: no disks reported, no channels initialized");
        }

        let disks = disk_count as usize;
        let present = |index: usize| disks.saturating_sub(index * DEVICES_PER_CHANNEL);

        Self {
            io,
            sched,
            config,
            disk_count,
            channels: [IdeChannel::new(0, present(0)), IdeChannel::new(1, present(1))],
            channel_count,
        }
    }

    /// Register the interrupt handler on every initialized channel's vector
    pub fn connect_interrupts<D>(&'static self, dispatcher: &D)
    where
        P: 'static,
        S: 'static,
        D: InterruptDispatcher + ?Sized,
    {
        for channel in self.channels() {
            dispatcher.connect(channel.vector(), self);
            info!(
                "ide: {} port {:#x} vector {:#x} ({} device(s))",
                channel.name(),
                channel.port_base(),
                channel.vector(),
                channel.devices().count()
            );
        }
        info!("ide: init done, {} channel(s)", self.channel_count);
    }
}

impl<P, S> IdeRegistry<P, S> {
    /// Initialized channels
    pub fn channels(&self) -> &[IdeChannel] {
        &self.channels[..self.channel_count]
    }

    pub fn channel(&self, index: usize) -> Option<&IdeChannel> {
        self.channels().get(index)
    }

    /// Every present device, in channel order
    pub fn devices(&self) -> impl Iterator<Item = &AtaDevice> {
        self.channels().iter().flat_map(|channel| channel.devices())
    }

    /// Look up a present device
    pub fn device(&self, channel: usize, device: u8) -> IdeResult<&AtaDevice> {
        self.channel(channel)
            .and_then(|ch| ch.slots().get(device as usize))
            .filter(|dev| dev.is_present())
            .ok_or(IdeError::NoSuchDevice { channel, device })
    }

    /// Look up a present device by name ("sda".."sdd")
    pub fn device_by_name(&self, name: &str) -> Option<&AtaDevice> {
        self.devices().find(|device| device.name() == name)
    }

    pub fn disk_count(&self) -> u8 {
        self.disk_count
    }

    pub fn config(&self) -> &IdeConfig {
        &self.config
    }

    /// Channel a request for `device` runs on
    ///
    /// Absent slots and slots on uninitialized channels never raise a
    /// completion interrupt, so they are refused before the lock is taken.
    pub(crate) fn channel_of(&self, device: &AtaDevice) -> IdeResult<&IdeChannel> {
        let channel = device.channel_index();
        self.channel(channel)
            .filter(|_| device.is_present())
            .ok_or(IdeError::NoSuchDevice {
                channel,
                device: device.index(),
            })
    }
}

impl<P: PortIo, S: Scheduler> InterruptHandler for IdeRegistry<P, S> {
    fn on_signal(&self, vector: u8) {
        let channel = match channel_for_vector(vector).and_then(|index| self.channel(index)) {
            Some(channel) => channel,
            None => panic!("ide: interrupt on unowned vector {:#x}", vector),
        };
        assert_eq!(channel.vector(), vector);

        // Every request holds the channel lock, so a set flag always belongs
        // to the command currently in flight.
        if channel.expecting_interrupt.swap(false, Ordering::AcqRel) {
            channel.disk_done.release();
            // Reading status acknowledges the interrupt so the controller
            // can raise the next one.
            let _ = self.io.inb(channel.reg(reg::STATUS));
        } else {
            trace!("ide: {} ignored interrupt, no command outstanding", channel.name());
        }
    }
}

/// Build the registry into `cell` and connect its interrupts
///
/// Runs once; later calls return the existing registry untouched.
pub fn ide_init<P, S, D>(
    cell: &'static Once<IdeRegistry<P, S>>,
    io: P,
    sched: S,
    config: IdeConfig,
    disk_count: u8,
    dispatcher: &D,
) -> &'static IdeRegistry<P, S>
where
    P: PortIo + 'static,
    S: Scheduler + 'static,
    D: InterruptDispatcher + ?Sized,
{
    let mut fresh = false;
    let registry = cell.call_once(|| {
        fresh = true;
        IdeRegistry::new(io, sched, config, disk_count)
    });

    if fresh {
        registry.connect_interrupts(dispatcher);
    } else {
        warn!("ide: already initialized");
    }
    registry
}
