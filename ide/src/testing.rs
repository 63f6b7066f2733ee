//! Simulated IDE controller and platform for unit tests
//!
//! [`SimController`] decodes both legacy register banks, keeps a sparse
//! sector store per device and records every port access together with the
//! thread that made it. Interrupts are edge-triggered: a completed command
//! marks its channel's line pending, and [`SimPlatform`] delivers pending
//! lines through its [`VectorTable`] whenever a blocked thread yields or
//! sleeps, the way a real interrupt preempts whatever is running.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use crate::ata::regs::{reg, AtaCommand, AtaStatus, MAX_CHANNELS, PRIMARY_VECTOR, SECONDARY_VECTOR};
use crate::ata::IdeRegistry;
use crate::config::IdeConfig;
use crate::hal::interrupt::VectorTable;
use crate::hal::port::PortIo;
use crate::ke::Scheduler;
use crate::SECTOR_SIZE;

const WORDS_PER_SECTOR: usize = SECTOR_SIZE / 2;
const DEFAULT_CAPACITY: u32 = 163_840;
const SIM_NAMES: [[&str; 2]; 2] = [["sda", "sdb"], ["sdc", "sdd"]];

/// One observed port access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    Out(u16, u8),
    In(u16, u8),
    /// Word-string write: port, word count
    OutWords(u16, usize),
    /// Word-string read: port, word count
    InWords(u16, usize),
}

impl PortEvent {
    fn is_write(&self) -> bool {
        matches!(self, PortEvent::Out(..) | PortEvent::OutWords(..))
    }
}

/// Injected drive misbehavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// BSY never clears
    StuckBusy,
    /// BSY reads set until the simulated clock reaches `ms`
    BusyUntil { ms: u64 },
    /// BSY never clears once more than `commands` commands were issued
    StuckAfter { commands: usize },
    /// DRQ never raised
    NoDrq,
    /// Nothing attached at slot `device`: the bus floats and reads 0
    Absent { device: u8 },
}

/// A command as the device saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimCommand {
    pub opcode: u8,
    pub lba: u32,
    /// Raw sector-count register
    pub field: u8,
}

impl SimCommand {
    pub fn new(opcode: u8, lba: u32, field: u8) -> Self {
        Self { opcode, lba, field }
    }
}

enum Phase {
    Idle,
    DataIn(VecDeque<u16>),
    DataOut {
        device: u8,
        lba: u32,
        sectors: usize,
        words: Vec<u16>,
    },
}

struct SimChannel {
    sector_count: u8,
    lba: [u8; 3],
    device: u8,
    status: AtaStatus,
    phase: Phase,
    irq_due: bool,
    fault: Fault,
    commands: Vec<SimCommand>,
}

impl SimChannel {
    fn new() -> Self {
        Self {
            sector_count: 0,
            lba: [0; 3],
            device: 0,
            status: AtaStatus::DRDY,
            phase: Phase::Idle,
            irq_due: false,
            fault: Fault::None,
            commands: Vec::new(),
        }
    }

    fn selected(&self) -> u8 {
        (self.device >> 4) & 1
    }

    fn current_lba(&self) -> u32 {
        u32::from_le_bytes([self.lba[0], self.lba[1], self.lba[2], self.device & 0x0F])
    }

    fn visible_status(&self, now: u64) -> AtaStatus {
        let busy = AtaStatus::BSY | AtaStatus::DRDY;
        match self.fault {
            Fault::Absent { device } if self.selected() == device => AtaStatus::empty(),
            Fault::StuckBusy => busy,
            Fault::BusyUntil { ms } if now < ms => busy,
            Fault::StuckAfter { commands } if self.commands.len() > commands => busy,
            Fault::NoDrq => self.status - AtaStatus::DRQ,
            _ => self.status,
        }
    }
}

struct SimState {
    channels: [SimChannel; MAX_CHANNELS],
    disks: HashMap<(usize, u8, u32), [u8; SECTOR_SIZE]>,
    log: Vec<(ThreadId, PortEvent)>,
    capacity: u32,
}

impl SimState {
    fn load_sector(&self, ch: usize, dev: u8, lba: u32) -> [u8; SECTOR_SIZE] {
        self.disks.get(&(ch, dev, lba)).copied().unwrap_or([0; SECTOR_SIZE])
    }

    fn command(&mut self, ch: usize, opcode: u8) {
        let capacity = self.capacity;
        let chan = &self.channels[ch];
        let dev = chan.selected();
        let lba = chan.current_lba();
        let field = chan.sector_count;
        let sectors = if field == 0 { 256 } else { field as usize };

        if matches!(chan.fault, Fault::Absent { device } if device == dev) {
            // No drive latches the command; nothing will ever interrupt
            self.channels[ch].commands.push(SimCommand::new(opcode, lba, field));
            return;
        }

        let phase = if opcode == AtaCommand::ReadSectors.opcode() {
            let mut words = VecDeque::with_capacity(sectors * WORDS_PER_SECTOR);
            for sector in 0..sectors as u32 {
                let data = self.load_sector(ch, dev, lba + sector);
                words.extend(data.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]])));
            }
            Phase::DataIn(words)
        } else if opcode == AtaCommand::WriteSectors.opcode() {
            Phase::DataOut {
                device: dev,
                lba,
                sectors,
                words: Vec::with_capacity(sectors * WORDS_PER_SECTOR),
            }
        } else if opcode == AtaCommand::Identify.opcode() {
            let model = format!("SIM DISK {}", SIM_NAMES[ch][dev as usize]);
            Phase::DataIn(identify_block(&model, capacity).into_iter().collect())
        } else {
            panic!("sim: unknown opcode {:#x}", opcode);
        };

        let chan = &mut self.channels[ch];
        chan.commands.push(SimCommand::new(opcode, lba, field));
        chan.status = AtaStatus::DRDY | AtaStatus::DRQ;
        // Reads and IDENTIFY interrupt once data is ready; writes interrupt
        // after the data phase.
        chan.irq_due = !matches!(phase, Phase::DataOut { .. });
        chan.phase = phase;
    }

    fn data_in(&mut self, ch: usize, buf: &mut [u16]) {
        let chan = &mut self.channels[ch];
        let mut drained = false;
        if let Phase::DataIn(words) = &mut chan.phase {
            for word in buf.iter_mut() {
                *word = words.pop_front().unwrap_or(0);
            }
            drained = words.is_empty();
        } else {
            buf.fill(0);
        }
        if drained {
            chan.phase = Phase::Idle;
            chan.status = AtaStatus::DRDY;
        }
    }

    fn data_out(&mut self, ch: usize, buf: &[u16]) {
        let chan = &mut self.channels[ch];
        let Phase::DataOut {
            device,
            lba,
            sectors,
            words,
        } = &mut chan.phase
        else {
            return;
        };

        words.extend_from_slice(buf);
        if words.len() < *sectors * WORDS_PER_SECTOR {
            return;
        }

        let (device, lba) = (*device, *lba);
        let words = std::mem::take(words);
        chan.phase = Phase::Idle;
        chan.status = AtaStatus::DRDY;
        chan.irq_due = true;

        for (i, sector) in words.chunks_exact(WORDS_PER_SECTOR).enumerate() {
            let mut data = [0u8; SECTOR_SIZE];
            for (bytes, word) in data.chunks_exact_mut(2).zip(sector) {
                bytes.copy_from_slice(&word.to_le_bytes());
            }
            self.disks.insert((ch, device, lba + i as u32), data);
        }
    }
}

/// Decode a port into (channel, register offset)
fn decode(port: u16) -> (usize, u16) {
    match port {
        0x1F0..=0x1F7 => (0, port - 0x1F0),
        0x3F6 => (0, reg::CONTROL),
        0x170..=0x177 => (1, port - 0x170),
        0x376 => (1, reg::CONTROL),
        _ => panic!("sim: access to unowned port {:#x}", port),
    }
}

/// Simulated two-channel IDE controller
pub struct SimController {
    state: Mutex<SimState>,
    clock_ms: AtomicU64,
}

impl SimController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                channels: [SimChannel::new(), SimChannel::new()],
                disks: HashMap::new(),
                log: Vec::new(),
                capacity: DEFAULT_CAPACITY,
            }),
            clock_ms: AtomicU64::new(0),
        }
    }

    pub fn leak() -> &'static Self {
        Box::leak(Box::new(Self::new()))
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn set_fault(&self, ch: usize, fault: Fault) {
        self.state().channels[ch].fault = fault;
    }

    /// Force the status register (before faults are applied)
    pub fn set_status(&self, ch: usize, status: AtaStatus) {
        self.state().channels[ch].status = status;
    }

    /// Sector count every device reports through IDENTIFY
    pub fn set_capacity(&self, sectors: u32) {
        self.state().capacity = sectors;
    }

    /// Every port access in order
    pub fn events(&self) -> Vec<PortEvent> {
        self.state().log.iter().map(|(_, event)| *event).collect()
    }

    /// Port writes only
    pub fn writes(&self) -> Vec<PortEvent> {
        self.events().into_iter().filter(PortEvent::is_write).collect()
    }

    /// Port writes with the thread that made them
    pub fn writes_by_thread(&self) -> Vec<(ThreadId, PortEvent)> {
        self.state()
            .log
            .iter()
            .filter(|(_, event)| event.is_write())
            .copied()
            .collect()
    }

    /// Commands issued on a channel
    pub fn commands(&self, ch: usize) -> Vec<SimCommand> {
        self.state().channels[ch].commands.clone()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    /// Seed consecutive sectors of a device
    pub fn store(&self, ch: usize, dev: u8, lba: u32, data: &[u8]) {
        let mut state = self.state();
        for (i, chunk) in data.chunks(SECTOR_SIZE).enumerate() {
            let mut sector = [0u8; SECTOR_SIZE];
            sector[..chunk.len()].copy_from_slice(chunk);
            state.disks.insert((ch, dev, lba + i as u32), sector);
        }
    }

    /// Contents of consecutive sectors of a device
    pub fn load(&self, ch: usize, dev: u8, lba: u32, count: u32) -> Vec<u8> {
        let state = self.state();
        (lba..lba + count)
            .flat_map(|sector| state.load_sector(ch, dev, sector))
            .collect()
    }

    /// Consume a pending interrupt on a channel
    pub fn take_irq(&self, ch: usize) -> bool {
        std::mem::take(&mut self.state().channels[ch].irq_due)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock_ms.load(Ordering::SeqCst)
    }

    pub fn advance(&self, ms: u32) {
        self.clock_ms.fetch_add(ms as u64, Ordering::SeqCst);
    }

    fn record(state: &mut SimState, event: PortEvent) {
        state.log.push((thread::current().id(), event));
    }
}

impl PortIo for SimController {
    fn inb(&self, port: u16) -> u8 {
        let now = self.now_ms();
        let mut state = self.state();
        let (ch, offset) = decode(port);

        let chan = &state.channels[ch];
        let value = match offset {
            reg::STATUS | reg::ALT_STATUS => chan.visible_status(now).bits(),
            reg::SECTOR_COUNT => chan.sector_count,
            reg::LBA_LOW => chan.lba[0],
            reg::LBA_MID => chan.lba[1],
            reg::LBA_HIGH => chan.lba[2],
            reg::DEVICE => chan.device,
            _ => 0,
        };
        Self::record(&mut state, PortEvent::In(port, value));
        value
    }

    fn outb(&self, port: u16, value: u8) {
        let mut state = self.state();
        Self::record(&mut state, PortEvent::Out(port, value));
        let (ch, offset) = decode(port);
        if offset == reg::COMMAND {
            state.command(ch, value);
            return;
        }

        let chan = &mut state.channels[ch];
        match offset {
            reg::SECTOR_COUNT => chan.sector_count = value,
            reg::LBA_LOW => chan.lba[0] = value,
            reg::LBA_MID => chan.lba[1] = value,
            reg::LBA_HIGH => chan.lba[2] = value,
            reg::DEVICE => chan.device = value,
            _ => {}
        }
    }

    fn insw(&self, port: u16, buf: &mut [u16]) {
        let mut state = self.state();
        Self::record(&mut state, PortEvent::InWords(port, buf.len()));
        let (ch, offset) = decode(port);
        assert_eq!(offset, reg::DATA, "sim: word read from non-data port");
        state.data_in(ch, buf);
    }

    fn outsw(&self, port: u16, buf: &[u16]) {
        let mut state = self.state();
        Self::record(&mut state, PortEvent::OutWords(port, buf.len()));
        let (ch, offset) = decode(port);
        assert_eq!(offset, reg::DATA, "sim: word write to non-data port");
        state.data_out(ch, buf);
    }
}

/// Scheduler and interrupt controller for the simulated machine
pub struct SimPlatform {
    ctrl: &'static SimController,
    vectors: VectorTable,
    sleeps: AtomicUsize,
}

impl SimPlatform {
    pub fn leak(ctrl: &'static SimController) -> &'static Self {
        Box::leak(Box::new(Self {
            ctrl,
            vectors: VectorTable::new(),
            sleeps: AtomicUsize::new(0),
        }))
    }

    pub fn vectors(&self) -> &VectorTable {
        &self.vectors
    }

    /// Simulated time spent sleeping
    pub fn elapsed_ms(&self) -> u64 {
        self.ctrl.now_ms()
    }

    pub fn sleeps(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }

    fn deliver(&self) {
        for (ch, vector) in [(0, PRIMARY_VECTOR), (1, SECONDARY_VECTOR)] {
            if self.ctrl.take_irq(ch) {
                self.vectors.dispatch(vector);
            }
        }
    }
}

impl Scheduler for SimPlatform {
    fn yield_now(&self) {
        self.deliver();
        thread::yield_now();
    }

    fn sleep_ms(&self, ms: u32) {
        self.ctrl.advance(ms);
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.deliver();
        thread::yield_now();
    }
}

pub type SimRegistry = IdeRegistry<&'static SimController, &'static SimPlatform>;

/// A connected registry over a fresh simulated machine
pub struct Rig {
    pub ctrl: &'static SimController,
    pub platform: &'static SimPlatform,
    pub registry: &'static SimRegistry,
}

pub fn rig(disk_count: u8) -> Rig {
    rig_with(disk_count, IdeConfig::DEFAULT)
}

pub fn rig_with(disk_count: u8, config: IdeConfig) -> Rig {
    let ctrl = SimController::leak();
    let platform = SimPlatform::leak(ctrl);
    let registry: &'static SimRegistry =
        Box::leak(Box::new(IdeRegistry::new(ctrl, platform, config, disk_count)));
    registry.connect_interrupts(platform.vectors());
    Rig {
        ctrl,
        platform,
        registry,
    }
}

/// Deterministic contents for `count` sectors starting at `lba`
pub fn pattern(lba: u32, count: u32) -> Vec<u8> {
    (lba..lba + count)
        .flat_map(|sector| {
            (0..SECTOR_SIZE).map(move |i| (sector as u8).wrapping_mul(31) ^ (sector >> 8) as u8 ^ i as u8)
        })
        .collect()
}

/// IDENTIFY response for a drive with the given model and capacity
pub fn identify_block(model: &str, sectors: u32) -> [u16; 256] {
    fn put(words: &mut [u16], text: &str) {
        let mut bytes = vec![b' '; words.len() * 2];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        for (word, pair) in words.iter_mut().zip(bytes.chunks_exact(2)) {
            *word = u16::from_be_bytes([pair[0], pair[1]]);
        }
    }

    let mut data = [0u16; 256];
    data[0] = 0x0040;
    put(&mut data[10..20], "QM00001");
    put(&mut data[23..27], "2.5+");
    put(&mut data[27..47], model);
    data[60] = sectors as u16;
    data[61] = (sectors >> 16) as u16;
    data
}
