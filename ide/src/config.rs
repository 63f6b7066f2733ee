//! Driver Configuration
//!
//! Tunables that are not part of the hardware wire protocol. The legacy
//! channel assignments live in [`crate::ata::regs`] because they are fixed
//! by the platform, not chosen by the kernel.

/// Addressable ceiling: only disks up to 80 MiB are driven
pub const DEFAULT_MAX_LBA: u32 = (80 * 1024 * 1024 / 512) - 1;

/// Ready-poll budget in milliseconds
pub const DEFAULT_READY_TIMEOUT_MS: u32 = 30 * 1000;

/// Ready-poll sleep granularity in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// IDE driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdeConfig {
    /// Last addressable sector (inclusive)
    pub max_lba: u32,
    /// Total time the ready poll may wait for BSY to clear
    pub ready_timeout_ms: u32,
    /// Sleep between two status reads while BSY is set
    pub poll_interval_ms: u32,
}

impl IdeConfig {
    pub const DEFAULT: Self = Self {
        max_lba: DEFAULT_MAX_LBA,
        ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
        poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
    };

    /// Override the addressable ceiling
    pub const fn with_max_lba(mut self, max_lba: u32) -> Self {
        self.max_lba = max_lba;
        self
    }

    /// Override the ready-poll budget
    pub const fn with_ready_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.ready_timeout_ms = timeout_ms;
        self
    }

    /// Number of addressable sectors
    #[inline]
    pub const fn capacity_sectors(&self) -> u64 {
        self.max_lba as u64 + 1
    }

    /// Check that `sector_count` sectors starting at `lba` fit under the ceiling
    #[inline]
    pub const fn contains(&self, lba: u32, sector_count: u32) -> bool {
        lba as u64 + sector_count as u64 <= self.capacity_sectors()
    }
}

impl Default for IdeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
