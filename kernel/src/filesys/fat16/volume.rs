//! Volume geometry derived from the boot sector, and the parameters used to
//! lay out a fresh volume.

use super::boot_sector::BootSector;
use super::constants::*;
use crate::filesys::FsError;

/// Region boundaries of a mounted volume, in absolute disk sectors.
///
/// Computed once at mount and fixed until the volume is reformatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    pub boot_sector: BootSector,
    /// Disk sector holding the boot sector
    pub partition_start: u64,
    /// First sector of the first FAT copy
    pub fat_start: u64,
    pub root_dir_start: u64,
    pub root_dir_sectors: u64,
    /// First sector of cluster 2
    pub data_start: u64,
    /// One past the highest allocatable cluster
    cluster_bound: u16,
}

impl Volume {
    /// Derives the layout of the volume whose boot sector sits at
    /// `partition_start`.
    pub fn from_boot_sector(boot_sector: BootSector, partition_start: u64) -> Result<Self, FsError> {
        if boot_sector.bytes_per_sector as usize != SECTOR_SIZE
            || boot_sector.sectors_per_cluster == 0
            || boot_sector.fat_count == 0
        {
            return Err(FsError::InvalidFilesystem);
        }

        let fat_start = partition_start + boot_sector.reserved_sectors as u64;
        let root_dir_sectors =
            (boot_sector.root_dir_entries as u64 * DIR_ENTRY_SIZE as u64).div_ceil(SECTOR_SIZE as u64);
        let root_dir_start =
            fat_start + boot_sector.fat_count as u64 * boot_sector.sectors_per_fat as u64;
        let data_start = root_dir_start + root_dir_sectors;

        let data_offset = data_start - partition_start;
        let data_sectors = (boot_sector.total_sectors() as u64).saturating_sub(data_offset);
        let by_area = FIRST_DATA_CLUSTER as u64 + data_sectors / boot_sector.sectors_per_cluster as u64;
        let by_fat = boot_sector.sectors_per_fat as u64 * FAT_ENTRIES_PER_SECTOR as u64;
        let cluster_bound = by_area.min(by_fat).min(CLUSTER_LIMIT as u64) as u16;

        Ok(Self {
            boot_sector,
            partition_start,
            fat_start,
            root_dir_start,
            root_dir_sectors,
            data_start,
            cluster_bound: cluster_bound.max(FIRST_DATA_CLUSTER),
        })
    }

    pub fn sectors_per_cluster(&self) -> u64 {
        self.boot_sector.sectors_per_cluster as u64
    }

    /// Size of each cluster in bytes
    pub fn cluster_size(&self) -> usize {
        self.boot_sector.sectors_per_cluster as usize * SECTOR_SIZE
    }

    pub fn fat_count(&self) -> u8 {
        self.boot_sector.fat_count
    }

    pub fn root_dir_entries(&self) -> usize {
        self.boot_sector.root_dir_entries as usize
    }

    /// Allocatable clusters are `FIRST_DATA_CLUSTER..cluster_bound()`.
    pub fn cluster_bound(&self) -> u16 {
        self.cluster_bound
    }

    /// Number of allocatable data clusters
    pub fn cluster_count(&self) -> usize {
        (self.cluster_bound - FIRST_DATA_CLUSTER) as usize
    }

    pub fn is_data_cluster(&self, cluster: u16) -> bool {
        (FIRST_DATA_CLUSTER..self.cluster_bound).contains(&cluster)
    }

    pub fn cluster_to_sector(&self, cluster: u16) -> u64 {
        self.data_start + (cluster as u64 - FIRST_DATA_CLUSTER as u64) * self.sectors_per_cluster()
    }

    /// Sector and byte offset of `cluster`'s entry within FAT copy `copy`.
    pub fn fat_position(&self, cluster: u16, copy: u8) -> (u64, usize) {
        let offset = cluster as usize * FAT_ENTRY_SIZE;
        let copy_start = self.fat_start + copy as u64 * self.boot_sector.sectors_per_fat as u64;
        (
            copy_start + (offset / SECTOR_SIZE) as u64,
            offset % SECTOR_SIZE,
        )
    }
}

/// Parameters used by [`Fat16::format_with`](super::Fat16::format_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPolicy {
    pub partition_start: u64,
    pub sectors_per_cluster: u8,
    pub fat_count: u8,
    pub root_dir_entries: u16,
    pub sectors_per_fat: u16,
    pub media_type: u8,
    /// Upper bound on the volume size; shrunk to fit the device
    pub total_sectors: u32,
    pub oem_name: [u8; 8],
    pub volume_label: [u8; 11],
    pub volume_id: u32,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            partition_start: PARTITION_START_LBA,
            sectors_per_cluster: 4,
            fat_count: 2,
            root_dir_entries: ROOT_DIR_ENTRIES,
            sectors_per_fat: 256,
            media_type: 0xF8, // Fixed disk
            total_sectors: 65535,
            oem_name: *b"ATAFAT16",
            volume_label: *b"NO NAME    ",
            volume_id: 0x1234_5678,
        }
    }
}

impl FormatPolicy {
    /// Builds the parameter block for a device of `device_blocks` sectors.
    ///
    /// Fails `InvalidArgument` when the policy is degenerate or the metadata
    /// regions alone do not fit on the device.
    pub fn boot_sector(&self, device_blocks: u64) -> Result<BootSector, FsError> {
        if self.sectors_per_cluster == 0
            || self.fat_count == 0
            || self.root_dir_entries == 0
            || self.sectors_per_fat == 0
        {
            return Err(FsError::InvalidArgument);
        }

        let available = device_blocks.saturating_sub(self.partition_start);
        let total_sectors = (self.total_sectors as u64).min(available);
        let root_dir_sectors =
            (self.root_dir_entries as u64 * DIR_ENTRY_SIZE as u64).div_ceil(SECTOR_SIZE as u64);
        let metadata = 1 + self.fat_count as u64 * self.sectors_per_fat as u64 + root_dir_sectors;
        if total_sectors <= metadata {
            return Err(FsError::InvalidArgument);
        }

        let (total_sectors_16, total_sectors_32) = match u16::try_from(total_sectors) {
            Ok(small) => (small, 0),
            Err(_) => (0, total_sectors as u32),
        };

        Ok(BootSector {
            jump_boot: [0xEB, 0x3C, 0x90], // Standard boot jump
            oem_name: self.oem_name,
            bytes_per_sector: SECTOR_SIZE as u16,
            sectors_per_cluster: self.sectors_per_cluster,
            reserved_sectors: 1,
            fat_count: self.fat_count,
            root_dir_entries: self.root_dir_entries,
            total_sectors_16,
            media_type: self.media_type,
            sectors_per_fat: self.sectors_per_fat,
            sectors_per_track: 63,
            head_count: 16,
            hidden_sectors: self.partition_start as u32,
            total_sectors_32,
            drive_number: 0x80, // Hard disk
            reserved1: 0,
            boot_signature: EXTENDED_BOOT_SIGNATURE,
            volume_id: self.volume_id,
            volume_label: self.volume_label,
            fs_type: *b"FAT16   ",
        })
    }
}
