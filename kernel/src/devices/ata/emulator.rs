//! Register-level emulation of the primary IDE bus with one master disk.
//!
//! Only what the driver touches is modelled: soft reset, IDENTIFY, PIO
//! READ/WRITE SECTORS and CACHE FLUSH. Sectors live in a sparse map, so
//! unwritten sectors read back as zeros.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::AtaStatus;
use crate::constants::ata::*;
use crate::constants::ports::{ata_reg, ATA_PRIMARY_BASE, ATA_PRIMARY_CONTROL};
use crate::devices::port::PortIo;

/// Misbehaviour injected into the emulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// Nothing on the bus: every status read returns zero
    Absent,
    /// A packet device that aborts IDENTIFY with its signature
    Atapi,
    /// BSY never clears
    StuckBusy,
    /// Data commands fail with ERR set
    ErrorOnTransfer,
    /// Data commands clear BSY but never raise DRQ
    NoDataRequest,
    /// Writes land, then CACHE FLUSH fails with ERR set
    FlushError,
}

enum Phase {
    Idle,
    DataIn {
        words: Vec<u16>,
        pos: usize,
        next_lba: u32,
        remaining: u32,
    },
    DataOut {
        words: Vec<u16>,
        lba: u32,
        remaining: u32,
    },
}

pub struct IdeEmulator {
    sectors: BTreeMap<u32, [u8; SECTOR_SIZE]>,
    fault: Fault,
    status: AtaStatus,
    phase: Phase,
    sector_count: u8,
    lba: [u8; 3],
    drive_head: u8,
    commands: Vec<u8>,
    status_reads: usize,
    flushes: usize,
}

impl Default for IdeEmulator {
    fn default() -> Self {
        Self::with_fault(Fault::None)
    }
}

impl IdeEmulator {
    pub fn with_fault(fault: Fault) -> Self {
        Self {
            sectors: BTreeMap::new(),
            fault,
            status: AtaStatus::DRDY,
            phase: Phase::Idle,
            sector_count: 0,
            lba: [0; 3],
            drive_head: 0,
            commands: Vec::new(),
            status_reads: 0,
            flushes: 0,
        }
    }

    /// Contents of one sector as stored on the emulated platter.
    pub fn sector(&self, lba: u32) -> [u8; SECTOR_SIZE] {
        self.sectors.get(&lba).copied().unwrap_or([0; SECTOR_SIZE])
    }

    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// True when no data phase is pending.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    fn current_status(&self) -> u8 {
        match self.fault {
            Fault::Absent => 0,
            Fault::StuckBusy => AtaStatus::BSY.bits(),
            _ => self.status.bits(),
        }
    }

    fn current_lba(&self) -> u32 {
        ((self.drive_head as u32 & 0x0F) << 24)
            | ((self.lba[2] as u32) << 16)
            | ((self.lba[1] as u32) << 8)
            | self.lba[0] as u32
    }

    fn transfer_count(&self) -> u32 {
        if self.sector_count == 0 {
            256
        } else {
            self.sector_count as u32
        }
    }

    fn execute(&mut self, command: u8) {
        self.commands.push(command);
        if matches!(self.fault, Fault::Absent | Fault::StuckBusy) {
            return;
        }

        match command {
            CMD_IDENTIFY => {
                if self.fault == Fault::Atapi {
                    self.lba[1] = 0x14;
                    self.lba[2] = 0xEB;
                    self.status = AtaStatus::DRDY | AtaStatus::ERR;
                    return;
                }
                let mut words = alloc::vec![0u16; WORDS_PER_SECTOR];
                words[0] = 0x0040;
                self.phase = Phase::DataIn {
                    words,
                    pos: 0,
                    next_lba: 0,
                    remaining: 0,
                };
                self.status = AtaStatus::DRDY | AtaStatus::DRQ;
            }
            CMD_READ_SECTORS | CMD_WRITE_SECTORS if self.fault == Fault::ErrorOnTransfer => {
                self.status = AtaStatus::DRDY | AtaStatus::ERR;
            }
            CMD_READ_SECTORS | CMD_WRITE_SECTORS if self.fault == Fault::NoDataRequest => {
                self.status = AtaStatus::DRDY;
            }
            CMD_CACHE_FLUSH if self.fault == Fault::FlushError => {
                self.flushes += 1;
                self.status = AtaStatus::DRDY | AtaStatus::ERR;
            }
            CMD_READ_SECTORS => {
                let lba = self.current_lba();
                self.phase = Phase::DataIn {
                    words: load_words(&self.sectors, lba),
                    pos: 0,
                    next_lba: lba + 1,
                    remaining: self.transfer_count() - 1,
                };
                self.status = AtaStatus::DRDY | AtaStatus::DRQ;
            }
            CMD_WRITE_SECTORS => {
                self.phase = Phase::DataOut {
                    words: Vec::with_capacity(WORDS_PER_SECTOR),
                    lba: self.current_lba(),
                    remaining: self.transfer_count(),
                };
                self.status = AtaStatus::DRDY | AtaStatus::DRQ;
            }
            CMD_CACHE_FLUSH => {
                self.flushes += 1;
                self.status = AtaStatus::DRDY;
            }
            _ => self.status = AtaStatus::DRDY | AtaStatus::ERR,
        }
    }

    fn read_data(&mut self) -> u16 {
        let Phase::DataIn {
            words,
            pos,
            next_lba,
            remaining,
        } = &mut self.phase
        else {
            return 0;
        };

        let word = words[*pos];
        *pos += 1;
        if *pos < words.len() {
            return word;
        }

        if *remaining > 0 {
            let lba = *next_lba;
            *remaining -= 1;
            *next_lba += 1;
            *words = load_words(&self.sectors, lba);
            *pos = 0;
        } else {
            self.phase = Phase::Idle;
            self.status = AtaStatus::DRDY;
        }
        word
    }

    fn write_data(&mut self, value: u16) {
        let Phase::DataOut {
            words,
            lba,
            remaining,
        } = &mut self.phase
        else {
            return;
        };

        words.push(value);
        if words.len() < WORDS_PER_SECTOR {
            return;
        }

        let mut sector = [0u8; SECTOR_SIZE];
        for (bytes, word) in sector.chunks_exact_mut(2).zip(words.iter()) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
        words.clear();
        let target = *lba;
        *lba += 1;
        *remaining -= 1;
        let done = *remaining == 0;

        self.sectors.insert(target, sector);
        if done {
            self.phase = Phase::Idle;
            self.status = AtaStatus::DRDY;
        }
    }
}

fn load_words(sectors: &BTreeMap<u32, [u8; SECTOR_SIZE]>, lba: u32) -> Vec<u16> {
    let sector = sectors.get(&lba).copied().unwrap_or([0; SECTOR_SIZE]);
    sector
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

impl PortIo for IdeEmulator {
    fn read_u8(&mut self, port: u16) -> u8 {
        if port == ATA_PRIMARY_CONTROL {
            self.status_reads += 1;
            return self.current_status();
        }
        match port.wrapping_sub(ATA_PRIMARY_BASE) {
            ata_reg::STATUS => {
                self.status_reads += 1;
                self.current_status()
            }
            ata_reg::ERROR if self.status.contains(AtaStatus::ERR) => 0x04,
            ata_reg::SECTOR_COUNT => self.sector_count,
            ata_reg::LBA_LO => self.lba[0],
            ata_reg::LBA_MID => self.lba[1],
            ata_reg::LBA_HI => self.lba[2],
            ata_reg::DRIVE_HEAD => self.drive_head,
            _ => 0,
        }
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        if port == ATA_PRIMARY_CONTROL {
            if value & CONTROL_SOFT_RESET != 0 {
                self.phase = Phase::Idle;
                self.status = AtaStatus::BSY;
            } else if self.status.contains(AtaStatus::BSY) {
                self.status = AtaStatus::DRDY;
            }
            return;
        }
        match port.wrapping_sub(ATA_PRIMARY_BASE) {
            ata_reg::SECTOR_COUNT => self.sector_count = value,
            ata_reg::LBA_LO => self.lba[0] = value,
            ata_reg::LBA_MID => self.lba[1] = value,
            ata_reg::LBA_HI => self.lba[2] = value,
            ata_reg::DRIVE_HEAD => self.drive_head = value,
            ata_reg::COMMAND => self.execute(value),
            _ => {}
        }
    }

    fn read_u16(&mut self, port: u16) -> u16 {
        if port == ATA_PRIMARY_BASE + ata_reg::DATA {
            self.read_data()
        } else {
            0
        }
    }

    fn write_u16(&mut self, port: u16, value: u16) {
        if port == ATA_PRIMARY_BASE + ata_reg::DATA {
            self.write_data(value);
        }
    }
}
