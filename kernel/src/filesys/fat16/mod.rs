//! FAT16 filesystem implementation
//!
//! A single flat root directory on a volume whose boot sector sits at a
//! fixed disk sector. All state lives in a [`Fat16`] session that owns the
//! block device; nothing is global.

use super::*;
use arrayvec::ArrayString;
use log::{info, warn};

mod boot_sector;
mod constants;
mod dir_entry;
mod directory;
mod fat_entry;
mod file;
mod table;
mod volume;

pub use boot_sector::BootSector;
pub use constants::*;
pub use dir_entry::{DirEntry83, ShortName};
pub use directory::DirSlot;
pub use fat_entry::FatEntry;
pub use volume::{FormatPolicy, Volume};

/// Usage summary returned by [`Fat16::statistics`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeStats {
    pub label: ArrayString<11>,
    pub serial: u32,
    /// Bytes per cluster
    pub cluster_size: usize,
    pub total_clusters: usize,
    pub free_clusters: usize,
}

/// FAT16 filesystem driver
pub struct Fat16<'a> {
    /// Underlying block device
    pub device: Box<dyn BlockDevice + 'a>,
    /// Geometry read from the boot sector at mount
    volume: Volume,
}

impl<'a> Fat16<'a> {
    /// Mounts the volume at the standard partition start.
    pub fn mount(device: Box<dyn BlockDevice + 'a>) -> Result<Self, FsError> {
        Self::mount_at(device, PARTITION_START_LBA)
    }

    /// Reads the boot sector at `partition_start` and derives the layout.
    ///
    /// Only the sector size and cluster size are checked.
    pub fn mount_at(mut device: Box<dyn BlockDevice + 'a>, partition_start: u64) -> Result<Self, FsError> {
        if device.block_size() != SECTOR_SIZE {
            return Err(FsError::InvalidArgument);
        }

        let mut sector_data = [0u8; SECTOR_SIZE];
        device.read_block(partition_start, &mut sector_data)?;
        let boot_sector = BootSector::parse(&sector_data);

        let volume = match Volume::from_boot_sector(boot_sector, partition_start) {
            Ok(volume) => volume,
            Err(err) => {
                warn!("[FAT16] Invalid sector size or not formatted");
                return Err(err);
            }
        };

        info!(
            "[FAT16] Filesystem mounted: {} sector(s) per cluster, data at sector {}",
            boot_sector.sectors_per_cluster, volume.data_start
        );
        Ok(Fat16 { device, volume })
    }

    /// Formats with [`FormatPolicy::default`] and mounts the result.
    pub fn format(device: Box<dyn BlockDevice + 'a>) -> Result<Self, FsError> {
        Self::format_with(device, FormatPolicy::default())
    }

    /// Writes a fresh boot sector, clears every FAT copy and the root
    /// directory, then mounts the new volume.
    pub fn format_with(mut device: Box<dyn BlockDevice + 'a>, policy: FormatPolicy) -> Result<Self, FsError> {
        info!("[FAT16] Formatting disk...");
        let boot_sector = policy.boot_sector(device.total_blocks())?;

        let mut sector_data = [0u8; SECTOR_SIZE];
        boot_sector.write_to(&mut sector_data);
        device.write_block(policy.partition_start, &sector_data)?;

        // Clusters 0 and 1 are reserved: media byte, then end of chain
        let mut fat_head = [0u8; SECTOR_SIZE];
        fat_head[0] = boot_sector.media_type;
        fat_head[1..4].fill(0xFF);

        let fat_start = policy.partition_start + boot_sector.reserved_sectors as u64;
        let sectors_per_fat = boot_sector.sectors_per_fat as u64;
        for copy in 0..boot_sector.fat_count as u64 {
            let copy_start = fat_start + copy * sectors_per_fat;
            device.write_block(copy_start, &fat_head)?;
            device.erase_blocks(copy_start + 1, sectors_per_fat - 1)?;
        }
        info!("[FAT16] FAT tables initialized");

        let root_dir_start = fat_start + boot_sector.fat_count as u64 * sectors_per_fat;
        let root_dir_sectors =
            (boot_sector.root_dir_entries as u64 * DIR_ENTRY_SIZE as u64).div_ceil(SECTOR_SIZE as u64);
        device.erase_blocks(root_dir_start, root_dir_sectors)?;

        info!("[FAT16] Format complete");
        Self::mount_at(device, policy.partition_start)
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.volume.boot_sector
    }
}

impl FileSystem for Fat16<'_> {
    fn create_file(&mut self, name: &str, content: &[u8]) -> Result<(), FsError> {
        self.create(name, content)
    }

    fn read_file(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, FsError> {
        self.read(name, buf)
    }

    fn remove_file(&mut self, name: &str) -> Result<(), FsError> {
        self.delete(name)
    }

    fn read_dir(&mut self) -> Result<Vec<DirEntry>, FsError> {
        self.list()
    }

    fn exists(&mut self, name: &str) -> Result<bool, FsError> {
        Fat16::exists(self, name)
    }

    fn metadata(&mut self, name: &str) -> Result<FileMetadata, FsError> {
        Fat16::metadata(self, name)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        Fat16::rename(self, from, to)
    }
}
