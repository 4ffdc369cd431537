//! Root directory scanning and in-place entry updates.

use alloc::vec::Vec;
use log::debug;

use super::constants::*;
use super::{DirEntry83, Fat16, ShortName};
use crate::filesys::FsError;

/// Location of one 32-byte entry in the root directory region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirSlot {
    /// Absolute disk sector holding the entry
    pub sector: u64,
    /// Entry index within that sector
    pub index: usize,
}

impl DirSlot {
    fn byte_range(&self) -> core::ops::Range<usize> {
        let start = self.index * DIR_ENTRY_SIZE;
        start..start + DIR_ENTRY_SIZE
    }
}

/// What a scan callback wants next
enum Scan<T> {
    Continue,
    Stop(T),
}

impl Fat16<'_> {
    /// Visits root directory entries in disk order until `visit` stops or
    /// every slot was seen.
    fn scan_root<T>(
        &mut self,
        mut visit: impl FnMut(DirSlot, &DirEntry83) -> Scan<T>,
    ) -> Result<Option<T>, FsError> {
        let capacity = self.volume.root_dir_entries();
        let mut sector_data = [0u8; SECTOR_SIZE];

        for sector_offset in 0..self.volume.root_dir_sectors {
            let sector = self.volume.root_dir_start + sector_offset;
            self.device.read_block(sector, &mut sector_data)?;

            for (index, raw) in sector_data.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
                if sector_offset as usize * DIR_ENTRIES_PER_SECTOR + index >= capacity {
                    return Ok(None);
                }
                let entry = DirEntry83::from_bytes(raw);
                if let Scan::Stop(found) = visit(DirSlot { sector, index }, &entry) {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    /// First never-used or deleted slot, in disk order.
    pub fn find_free_slot(&mut self) -> Result<DirSlot, FsError> {
        self.scan_root(|slot, entry| {
            if entry.is_free() || entry.is_deleted() {
                Scan::Stop(slot)
            } else {
                Scan::Continue
            }
        })?
        .ok_or(FsError::DirectoryFull)
    }

    /// Finds the live entry named `name`.
    ///
    /// Deleted entries and volume labels are skipped; a never-used slot ends
    /// the search.
    pub fn lookup(&mut self, name: &ShortName) -> Result<Option<(DirSlot, DirEntry83)>, FsError> {
        self.scan_root(|slot, entry| {
            if entry.is_free() {
                Scan::Stop(None)
            } else if entry.is_live() && entry.short_name() == *name {
                Scan::Stop(Some((slot, *entry)))
            } else {
                Scan::Continue
            }
        })
        .map(Option::flatten)
    }

    /// Every live entry up to the first never-used slot.
    pub fn live_entries(&mut self) -> Result<Vec<(DirSlot, DirEntry83)>, FsError> {
        let mut entries = Vec::new();
        self.scan_root(|slot, entry| {
            if entry.is_free() {
                return Scan::Stop(());
            }
            if entry.is_live() {
                entries.push((slot, *entry));
            }
            Scan::Continue
        })?;
        Ok(entries)
    }

    /// Overwrites the entry at `slot`, leaving the rest of its sector as is.
    pub fn write_dir_entry(&mut self, slot: DirSlot, entry: &DirEntry83) -> Result<(), FsError> {
        let mut sector_data = [0u8; SECTOR_SIZE];
        self.device.read_block(slot.sector, &mut sector_data)?;
        entry.write_to(&mut sector_data[slot.byte_range()]);
        self.device.write_block(slot.sector, &sector_data)
    }

    /// Soft-deletes the entry at `slot`: only the first name byte changes.
    pub fn mark_deleted(&mut self, slot: DirSlot) -> Result<(), FsError> {
        let mut sector_data = [0u8; SECTOR_SIZE];
        self.device.read_block(slot.sector, &mut sector_data)?;
        sector_data[slot.byte_range().start] = DELETED_ENTRY_MARKER;
        self.device.write_block(slot.sector, &sector_data)?;
        debug!("[FAT16] Entry {} of sector {} deleted", slot.index, slot.sector);
        Ok(())
    }
}
