//! ATA/IDE disk driver.
//!
//! Drives the master device on the primary bus in PIO mode with 28-bit LBA
//! addressing. Every wait is a status poll bounded by
//! [`POLL_ITERATIONS`], so a dead controller surfaces as
//! [`AtaError::Timeout`] instead of hanging the caller.
//!
//! # I/O Ports
//! Primary channel: 0x1F0-0x1F7, control/alternate status at 0x3F6
//!
//! # Commands
//! - IDENTIFY (0xEC): detect the device
//! - READ SECTORS (0x20) / WRITE SECTORS (0x30): PIO transfers
//! - FLUSH CACHE (0xE7): issued after every write

use core::fmt;

use bitflags::bitflags;
use log::{debug, info, warn};

use super::port::{HardwarePorts, PortIo};
use crate::constants::ata::*;
use crate::constants::ports::{ata_reg, ATA_PRIMARY_BASE, ATA_PRIMARY_CONTROL};
use crate::filesys::{BlockDevice, FsError};

#[cfg(test)]
pub mod emulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtaError {
    /// A bounded status poll ran out of iterations
    Timeout,
    /// The controller raised its error or device-fault flag
    DeviceError,
    /// Status read back as zero after IDENTIFY
    NoDevice,
    /// The device answered with a packet (ATAPI) signature
    UnsupportedDevice,
    /// Zero sector count, short buffer or LBA out of the 28-bit range
    InvalidArgument,
}

impl fmt::Display for AtaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AtaError::Timeout => write!(f, "ATA timeout"),
            AtaError::DeviceError => write!(f, "ATA device error"),
            AtaError::NoDevice => write!(f, "no ATA device present"),
            AtaError::UnsupportedDevice => write!(f, "unsupported (ATAPI) device"),
            AtaError::InvalidArgument => write!(f, "invalid ATA request"),
        }
    }
}

bitflags! {
    /// Status register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AtaStatus: u8 {
        const BSY = 1 << 7;
        const DRDY = 1 << 6;
        const DF = 1 << 5;
        const DRQ = 1 << 3;
        const ERR = 1;
        const _ = !0;
    }
}

/// A single ATA device reached through one command block and control port.
pub struct AtaDrive<P: PortIo = HardwarePorts> {
    ports: P,
    base: u16,
    control: u16,
}

impl AtaDrive<HardwarePorts> {
    /// Master device on the primary bus.
    pub const fn primary() -> Self {
        Self::new(HardwarePorts, ATA_PRIMARY_BASE, ATA_PRIMARY_CONTROL)
    }
}

impl<P: PortIo> AtaDrive<P> {
    pub const fn new(ports: P, base: u16, control: u16) -> Self {
        Self {
            ports,
            base,
            control,
        }
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    /// Resets the controller and checks that a usable disk answers.
    pub fn open(mut self) -> Result<Self, AtaError> {
        self.initialize()?;
        self.identify()?;
        Ok(self)
    }

    /// Issues a soft reset and waits for BSY to clear.
    pub fn initialize(&mut self) -> Result<(), AtaError> {
        self.ports.write_u8(self.control, CONTROL_SOFT_RESET);
        self.delay();
        self.ports.write_u8(self.control, CONTROL_CLEAR);
        self.delay();

        if let Err(err) = self.wait_not_busy() {
            warn!("[ATA] Timeout waiting for drive after reset");
            return Err(err);
        }

        info!("[ATA] ATA driver initialized");
        Ok(())
    }

    /// Detects the master device.
    ///
    /// The 256-word IDENTIFY payload is drained and discarded.
    pub fn identify(&mut self) -> Result<(), AtaError> {
        self.write_reg(ata_reg::DRIVE_HEAD, DRIVE_MASTER);
        self.delay();

        self.write_reg(ata_reg::SECTOR_COUNT, 0);
        self.write_reg(ata_reg::LBA_LO, 0);
        self.write_reg(ata_reg::LBA_MID, 0);
        self.write_reg(ata_reg::LBA_HI, 0);

        self.write_reg(ata_reg::COMMAND, CMD_IDENTIFY);
        self.delay();

        if self.status().is_empty() {
            info!("[ATA] No drive detected");
            return Err(AtaError::NoDevice);
        }

        self.wait_not_busy()?;

        // Packet devices leave a nonzero signature in the LBA mid/high registers
        if self.read_reg(ata_reg::LBA_MID) != 0 || self.read_reg(ata_reg::LBA_HI) != 0 {
            warn!("[ATA] ATAPI device (not supported)");
            return Err(AtaError::UnsupportedDevice);
        }

        self.wait_data_request()?;

        for _ in 0..WORDS_PER_SECTOR {
            let _ = self.ports.read_u16(self.base + ata_reg::DATA);
        }

        info!("[ATA] Drive detected and ready");
        Ok(())
    }

    /// Reads `count` sectors starting at `lba` into `buffer`.
    pub fn read_sectors(&mut self, lba: u32, count: u8, buffer: &mut [u8]) -> Result<(), AtaError> {
        let len = Self::transfer_len(lba, count, buffer.len())?;
        self.start_transfer(lba, count, CMD_READ_SECTORS)?;

        for sector in buffer[..len].chunks_exact_mut(SECTOR_SIZE) {
            self.wait_not_busy()?;
            self.wait_data_request()?;
            for word in sector.chunks_exact_mut(2) {
                let value = self.ports.read_u16(self.base + ata_reg::DATA);
                word.copy_from_slice(&value.to_le_bytes());
            }
            self.delay();
        }

        debug!("[ATA] Read {} sector(s) at LBA {}", count, lba);
        Ok(())
    }

    /// Writes `count` sectors from `buffer` starting at `lba`, then flushes
    /// the drive's write cache.
    pub fn write_sectors(&mut self, lba: u32, count: u8, buffer: &[u8]) -> Result<(), AtaError> {
        let len = Self::transfer_len(lba, count, buffer.len())?;
        self.start_transfer(lba, count, CMD_WRITE_SECTORS)?;

        for sector in buffer[..len].chunks_exact(SECTOR_SIZE) {
            self.wait_not_busy()?;
            self.wait_data_request()?;
            for word in sector.chunks_exact(2) {
                let value = u16::from_le_bytes([word[0], word[1]]);
                self.ports.write_u16(self.base + ata_reg::DATA, value);
            }
            self.delay();
        }

        self.write_reg(ata_reg::COMMAND, CMD_CACHE_FLUSH);
        self.delay();
        let status = self.wait_not_busy()?;
        if status.intersects(AtaStatus::ERR | AtaStatus::DF) {
            return Err(AtaError::DeviceError);
        }

        debug!("[ATA] Wrote {} sector(s) at LBA {}", count, lba);
        Ok(())
    }

    /// Zero-fills `count` sectors starting at `start`, one write per sector.
    pub fn erase_sectors(&mut self, start: u32, count: u32) -> Result<(), AtaError> {
        let zero = [0u8; SECTOR_SIZE];
        for i in 0..count {
            let lba = start.checked_add(i).ok_or(AtaError::InvalidArgument)?;
            self.write_sectors(lba, 1, &zero)?;
        }
        Ok(())
    }

    fn transfer_len(lba: u32, count: u8, buffer_len: usize) -> Result<usize, AtaError> {
        let len = count as usize * SECTOR_SIZE;
        if count == 0 || lba as u64 + count as u64 > LBA28_LIMIT || buffer_len < len {
            return Err(AtaError::InvalidArgument);
        }
        Ok(len)
    }

    fn start_transfer(&mut self, lba: u32, count: u8, command: u8) -> Result<(), AtaError> {
        self.wait_not_busy()?;

        self.write_reg(ata_reg::DRIVE_HEAD, DRIVE_MASTER | ((lba >> 24) & 0x0F) as u8);
        self.delay();

        self.write_reg(ata_reg::SECTOR_COUNT, count);
        self.write_reg(ata_reg::LBA_LO, (lba & 0xFF) as u8);
        self.write_reg(ata_reg::LBA_MID, ((lba >> 8) & 0xFF) as u8);
        self.write_reg(ata_reg::LBA_HI, ((lba >> 16) & 0xFF) as u8);

        self.write_reg(ata_reg::COMMAND, command);
        self.delay();
        Ok(())
    }

    fn status(&mut self) -> AtaStatus {
        AtaStatus::from_bits_retain(self.read_reg(ata_reg::STATUS))
    }

    fn wait_not_busy(&mut self) -> Result<AtaStatus, AtaError> {
        for _ in 0..POLL_ITERATIONS {
            let status = self.status();
            if !status.contains(AtaStatus::BSY) {
                return Ok(status);
            }
            core::hint::spin_loop();
        }
        Err(AtaError::Timeout)
    }

    fn wait_data_request(&mut self) -> Result<(), AtaError> {
        for _ in 0..POLL_ITERATIONS {
            let status = self.status();
            if status.intersects(AtaStatus::ERR | AtaStatus::DF) {
                return Err(AtaError::DeviceError);
            }
            if status.contains(AtaStatus::DRQ) {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(AtaError::Timeout)
    }

    /// ~400ns settle time: reads of the alternate status register.
    fn delay(&mut self) {
        for _ in 0..DELAY_READS {
            let _ = self.ports.read_u8(self.control);
        }
    }

    fn read_reg(&mut self, offset: u16) -> u8 {
        self.ports.read_u8(self.base + offset)
    }

    fn write_reg(&mut self, offset: u16, value: u8) {
        self.ports.write_u8(self.base + offset, value);
    }
}

fn lba28(block_num: u64) -> Result<u32, FsError> {
    if block_num >= LBA28_LIMIT {
        return Err(FsError::InvalidArgument);
    }
    Ok(block_num as u32)
}

impl<P: PortIo + Send + Sync> BlockDevice for AtaDrive<P> {
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError> {
        self.read_sectors(lba28(block_num)?, 1, buf)?;
        Ok(())
    }

    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError> {
        self.write_sectors(lba28(block_num)?, 1, buf)?;
        Ok(())
    }

    fn erase_blocks(&mut self, start: u64, count: u64) -> Result<(), FsError> {
        let count = u32::try_from(count).map_err(|_| FsError::InvalidArgument)?;
        self.erase_sectors(lba28(start)?, count)?;
        Ok(())
    }

    fn block_size(&self) -> usize {
        SECTOR_SIZE
    }

    /// IDENTIFY data is not kept, so the whole LBA28 range is reported.
    fn total_blocks(&self) -> u64 {
        LBA28_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::emulator::{Fault, IdeEmulator};
    use super::*;
    use alloc::vec;

    fn drive(fault: Fault) -> AtaDrive<IdeEmulator> {
        AtaDrive::new(
            IdeEmulator::with_fault(fault),
            ATA_PRIMARY_BASE,
            ATA_PRIMARY_CONTROL,
        )
    }

    fn pattern(len: usize) -> alloc::vec::Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_open_ready_disk() {
        let drive = drive(Fault::None).open().expect("disk should open");
        assert!(drive.ports().is_idle(), "identify payload must be drained");
        assert!(drive.ports().commands().contains(&CMD_IDENTIFY));
    }

    #[test]
    fn test_identify_without_device() {
        let mut drive = drive(Fault::Absent);
        drive.initialize().unwrap();
        assert_eq!(drive.identify(), Err(AtaError::NoDevice));
    }

    #[test]
    fn test_identify_atapi_device() {
        let mut drive = drive(Fault::Atapi);
        drive.initialize().unwrap();
        assert_eq!(drive.identify(), Err(AtaError::UnsupportedDevice));
    }

    #[test]
    fn test_read_write_multiple_sectors() {
        let mut drive = drive(Fault::None).open().unwrap();
        let data = pattern(3 * SECTOR_SIZE);

        drive.write_sectors(100, 3, &data).unwrap();
        assert_eq!(drive.ports().flushes(), 1);
        assert_eq!(
            drive.ports().commands().last().copied(),
            Some(CMD_CACHE_FLUSH)
        );

        let mut back = vec![0u8; 3 * SECTOR_SIZE];
        drive.read_sectors(100, 3, &mut back).unwrap();
        assert_eq!(back, data);
        assert_eq!(&drive.ports().sector(101)[..], &data[SECTOR_SIZE..2 * SECTOR_SIZE]);
    }

    #[test]
    fn test_high_lba_bits_use_drive_register() {
        let mut drive = drive(Fault::None).open().unwrap();
        let lba = 0x0ABC_DEF0;
        let data = pattern(SECTOR_SIZE);

        drive.write_sectors(lba, 1, &data).unwrap();
        assert_eq!(&drive.ports().sector(lba)[..], &data[..]);
        assert_eq!(drive.ports().sector(lba & 0x00FF_FFFF), [0u8; SECTOR_SIZE]);
    }

    #[test]
    fn test_invalid_transfers_rejected() {
        let mut drive = drive(Fault::None).open().unwrap();
        let mut buf = [0u8; SECTOR_SIZE];

        assert_eq!(drive.read_sectors(0, 0, &mut buf), Err(AtaError::InvalidArgument));
        assert_eq!(drive.write_sectors(0, 0, &buf), Err(AtaError::InvalidArgument));
        assert_eq!(drive.read_sectors(0, 2, &mut buf), Err(AtaError::InvalidArgument));
        assert_eq!(
            drive.read_sectors(0x0FFF_FFFF, 2, &mut [0u8; 2 * SECTOR_SIZE]),
            Err(AtaError::InvalidArgument)
        );
        assert_eq!(
            drive.read_block(LBA28_LIMIT, &mut buf),
            Err(FsError::InvalidArgument)
        );
    }

    #[test]
    fn test_stuck_busy_times_out_everywhere() {
        let mut drive = drive(Fault::StuckBusy);
        let mut buf = [0u8; SECTOR_SIZE];

        assert_eq!(drive.initialize(), Err(AtaError::Timeout));
        assert_eq!(drive.identify(), Err(AtaError::Timeout));
        assert_eq!(drive.read_sectors(5, 1, &mut buf), Err(AtaError::Timeout));
        assert_eq!(drive.write_sectors(5, 1, &buf), Err(AtaError::Timeout));
        assert_eq!(drive.erase_sectors(5, 4), Err(AtaError::Timeout));

        // Each failed operation gives up after a single poll budget.
        let per_op = POLL_ITERATIONS + 4 * DELAY_READS;
        assert!(drive.ports().status_reads() <= 5 * per_op);
    }

    #[test]
    fn test_error_flag_reports_device_error() {
        let mut drive = drive(Fault::ErrorOnTransfer);
        drive.initialize().unwrap();
        let mut buf = [0u8; SECTOR_SIZE];

        assert_eq!(drive.read_sectors(1, 1, &mut buf), Err(AtaError::DeviceError));
        assert_eq!(drive.write_sectors(1, 1, &buf), Err(AtaError::DeviceError));
        assert_eq!(drive.read_block(1, &mut buf), Err(FsError::DeviceError));
    }

    #[test]
    fn test_missing_data_request_times_out() {
        let mut drive = drive(Fault::NoDataRequest).open().unwrap();
        let mut buf = [0u8; SECTOR_SIZE];

        let before = drive.ports().status_reads();
        assert_eq!(drive.read_sectors(7, 1, &mut buf), Err(AtaError::Timeout));
        let read_polls = drive.ports().status_reads() - before;
        assert!(read_polls >= POLL_ITERATIONS);
        assert!(read_polls <= POLL_ITERATIONS + 2 + 4 * DELAY_READS);

        let before = drive.ports().status_reads();
        assert_eq!(drive.write_sectors(7, 1, &buf), Err(AtaError::Timeout));
        let write_polls = drive.ports().status_reads() - before;
        assert!(write_polls <= POLL_ITERATIONS + 2 + 4 * DELAY_READS);
        assert_eq!(drive.ports().flushes(), 0);
    }

    #[test]
    fn test_failed_flush_reports_device_error() {
        let mut drive = drive(Fault::FlushError).open().unwrap();
        let data = pattern(SECTOR_SIZE);

        assert_eq!(drive.write_sectors(9, 1, &data), Err(AtaError::DeviceError));
        assert_eq!(drive.ports().flushes(), 1);
        assert_eq!(&drive.ports().sector(9)[..], &data[..]);
    }

    #[test]
    fn test_erase_zeroes_range_only() {
        let mut drive = drive(Fault::None).open().unwrap();
        let data = pattern(4 * SECTOR_SIZE);
        drive.write_sectors(10, 4, &data).unwrap();

        drive.erase_sectors(10, 3).unwrap();

        for lba in 10..13 {
            assert_eq!(drive.ports().sector(lba), [0u8; SECTOR_SIZE]);
        }
        assert_eq!(&drive.ports().sector(13)[..], &data[3 * SECTOR_SIZE..]);
    }
}
