//! File allocation table access: entry reads and writes across all FAT
//! copies, free cluster search, chain allocation and release.

use log::{debug, warn};

use super::constants::*;
use super::{Fat16, FatEntry};
use crate::filesys::FsError;

impl Fat16<'_> {
    /// Reads the entry for `cluster` from the first FAT copy.
    ///
    /// A device failure reads as [`FatEntry::Bad`] so chain walks stop
    /// there instead of erroring.
    pub fn read_fat_entry(&mut self, cluster: u16) -> FatEntry {
        let (sector, offset) = self.volume.fat_position(cluster, 0);
        let mut sector_data = [0u8; SECTOR_SIZE];
        match self.device.read_block(sector, &mut sector_data) {
            Ok(()) => FatEntry::from_raw(u16::from_le_bytes([
                sector_data[offset],
                sector_data[offset + 1],
            ])),
            Err(err) => {
                warn!("[FAT16] FAT read failed for cluster {}: {}", cluster, err);
                FatEntry::Bad
            }
        }
    }

    /// Stores `entry` for `cluster` in every FAT copy.
    pub fn write_fat_entry(&mut self, cluster: u16, entry: FatEntry) -> Result<(), FsError> {
        let (sector, offset) = self.volume.fat_position(cluster, 0);
        let mut sector_data = [0u8; SECTOR_SIZE];
        self.device.read_block(sector, &mut sector_data)?;

        sector_data[offset..offset + FAT_ENTRY_SIZE].copy_from_slice(&entry.raw().to_le_bytes());

        for copy in 0..self.volume.fat_count() {
            let (copy_sector, _) = self.volume.fat_position(cluster, copy);
            self.device.write_block(copy_sector, &sector_data)?;
        }
        Ok(())
    }

    /// Lowest free data cluster, or `None` when the volume is full.
    ///
    /// FAT sectors that fail to read are skipped.
    pub fn find_free_cluster(&mut self) -> Option<u16> {
        let bound = self.volume.cluster_bound();
        let mut sector_data = [0u8; SECTOR_SIZE];
        let mut loaded = None;
        let mut readable = false;

        for cluster in FIRST_DATA_CLUSTER..bound {
            let (sector, offset) = self.volume.fat_position(cluster, 0);
            if loaded != Some(sector) {
                loaded = Some(sector);
                readable = match self.device.read_block(sector, &mut sector_data) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!("[FAT16] Skipping unreadable FAT sector {}: {}", sector, err);
                        false
                    }
                };
            }
            if !readable {
                continue;
            }
            let raw = u16::from_le_bytes([sector_data[offset], sector_data[offset + 1]]);
            if FatEntry::from_raw(raw).is_free() {
                return Some(cluster);
            }
        }
        None
    }

    /// Counts free data clusters by scanning the first FAT copy.
    pub fn count_free_clusters(&mut self) -> Result<usize, FsError> {
        let bound = self.volume.cluster_bound();
        let mut sector_data = [0u8; SECTOR_SIZE];
        let mut loaded = None;
        let mut free = 0;

        for cluster in FIRST_DATA_CLUSTER..bound {
            let (sector, offset) = self.volume.fat_position(cluster, 0);
            if loaded != Some(sector) {
                self.device.read_block(sector, &mut sector_data)?;
                loaded = Some(sector);
            }
            if sector_data[offset] == 0 && sector_data[offset + 1] == 0 {
                free += 1;
            }
        }
        Ok(free)
    }

    /// Releases the chain starting at `first`, returning how many clusters
    /// were freed.
    ///
    /// Stops at the first value that is not a data cluster, and after
    /// visiting as many clusters as the volume has, so a looped chain ends.
    pub fn free_chain(&mut self, first: u16) -> Result<usize, FsError> {
        let limit = self.volume.cluster_count();
        let mut cluster = first;
        let mut freed = 0;

        while self.volume.is_data_cluster(cluster) {
            if freed == limit {
                warn!("[FAT16] Chain from cluster {} does not terminate", first);
                break;
            }
            let next = self.read_fat_entry(cluster);
            if next.is_free() {
                break;
            }
            self.write_fat_entry(cluster, FatEntry::Free)?;
            freed += 1;

            match next {
                FatEntry::Next(next) => cluster = next,
                _ => break,
            }
        }

        debug!("[FAT16] Freed {} cluster(s) from {}", freed, first);
        Ok(freed)
    }

    /// Allocates and links `count` clusters, returning the first one.
    ///
    /// `count == 0` yields cluster 0, the empty chain. On failure nothing
    /// stays allocated.
    pub fn allocate_chain(&mut self, count: usize) -> Result<u16, FsError> {
        let mut first = 0;
        match self.link_new_clusters(count, &mut first) {
            Ok(()) => Ok(first),
            Err(err) => {
                if first != 0 {
                    if let Err(rollback) = self.free_chain(first) {
                        warn!("[FAT16] Could not release partial chain at {}: {}", first, rollback);
                    }
                }
                Err(err)
            }
        }
    }

    fn link_new_clusters(&mut self, count: usize, first: &mut u16) -> Result<(), FsError> {
        let mut prev = 0;
        for _ in 0..count {
            let cluster = self.find_free_cluster().ok_or(FsError::DiskFull)?;
            self.write_fat_entry(cluster, FatEntry::EndOfChain)?;
            if prev == 0 {
                *first = cluster;
            } else {
                self.write_fat_entry(prev, FatEntry::Next(cluster))?;
            }
            prev = cluster;
        }
        Ok(())
    }
}
