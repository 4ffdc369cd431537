//! I/O port definitions.

/// Base I/O port address for the first serial port (COM1).
pub const SERIAL_PORT: u16 = 0x3F8;

/// Command block base of the primary ATA bus (data register).
pub const ATA_PRIMARY_BASE: u16 = 0x1F0;

/// Device control / alternate status register of the primary ATA bus.
pub const ATA_PRIMARY_CONTROL: u16 = 0x3F6;

/// Register offsets from the command block base.
pub mod ata_reg {
    pub const DATA: u16 = 0;
    pub const ERROR: u16 = 1;
    pub const SECTOR_COUNT: u16 = 2;
    pub const LBA_LO: u16 = 3;
    pub const LBA_MID: u16 = 4;
    pub const LBA_HI: u16 = 5;
    pub const DRIVE_HEAD: u16 = 6;
    /// Status on read, command on write.
    pub const STATUS: u16 = 7;
    pub const COMMAND: u16 = 7;
}
