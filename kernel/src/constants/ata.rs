//! ATA protocol constants for PIO mode disk access.

/// IDENTIFY DEVICE
pub const CMD_IDENTIFY: u8 = 0xEC;

/// READ SECTORS (LBA28, PIO)
pub const CMD_READ_SECTORS: u8 = 0x20;

/// WRITE SECTORS (LBA28, PIO)
pub const CMD_WRITE_SECTORS: u8 = 0x30;

/// FLUSH CACHE
pub const CMD_CACHE_FLUSH: u8 = 0xE7;

/// Drive/head value selecting the master device in LBA mode.
/// The low nibble carries LBA bits 24..28.
pub const DRIVE_MASTER: u8 = 0xE0;

/// Device control: software reset bit.
pub const CONTROL_SOFT_RESET: u8 = 0x04;

/// Device control: normal operation, interrupts left as configured.
pub const CONTROL_CLEAR: u8 = 0x00;

/// Number of status polls before a wait is declared timed out.
/// Iteration based since no timer is assumed at this layer.
pub const POLL_ITERATIONS: usize = 100_000;

/// Alternate status reads issued after a command (~400ns).
pub const DELAY_READS: usize = 4;

/// Bytes in one ATA sector.
pub const SECTOR_SIZE: usize = 512;

/// 16-bit words transferred per sector.
pub const WORDS_PER_SECTOR: usize = SECTOR_SIZE / 2;

/// Highest addressable sector + 1 with 28-bit LBA.
pub const LBA28_LIMIT: u64 = 1 << 28;
