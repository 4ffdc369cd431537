//! Whole-file operations on the root directory.

use alloc::vec::Vec;
use arrayvec::ArrayString;
use log::{debug, info, warn};

use super::constants::*;
use super::{DirEntry83, Fat16, FatEntry, ShortName, VolumeStats};
use crate::filesys::{DirEntry, FileMetadata, FsError};

impl Fat16<'_> {
    /// Creates `name` holding `content`.
    ///
    /// The directory slot is claimed only after the data is on disk, and the
    /// cluster chain is released again if anything fails.
    pub fn create(&mut self, name: &str, content: &[u8]) -> Result<(), FsError> {
        let short = ShortName::parse(name)?;
        if self.lookup(&short)?.is_some() {
            debug!("[FAT16] File already exists: {}", name);
            return Err(FsError::AlreadyExists);
        }
        let size = u32::try_from(content.len()).map_err(|_| FsError::InvalidArgument)?;

        let slot = self.find_free_slot()?;
        let clusters = content.len().div_ceil(self.volume.cluster_size());
        let first = self.allocate_chain(clusters)?;

        let entry = DirEntry83::new_file(short, first, size);
        let written = self
            .write_chain(first, content)
            .and_then(|()| self.write_dir_entry(slot, &entry));
        if let Err(err) = written {
            if let Err(rollback) = self.free_chain(first) {
                warn!("[FAT16] Could not release chain at {}: {}", first, rollback);
            }
            return Err(err);
        }

        info!("[FAT16] Created: {} ({} bytes)", entry.get_name(), size);
        Ok(())
    }

    /// Copies `name` into `buf`, stopping at the recorded size or the end of
    /// `buf`, whichever comes first. Returns the number of bytes copied.
    pub fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, FsError> {
        let short = ShortName::parse(name)?;
        let (_, entry) = self.lookup(&short)?.ok_or(FsError::NotFound)?;

        let limit = buf.len().min(entry.file_size as usize);
        let mut cluster = entry.start_cluster;
        let mut steps = 0;
        let mut bytes_read = 0;
        let mut sector_data = [0u8; SECTOR_SIZE];

        while bytes_read < limit && self.volume.is_data_cluster(cluster) {
            if steps == self.volume.cluster_count() {
                warn!("[FAT16] Chain of {} does not terminate", entry.get_name());
                break;
            }
            steps += 1;

            let base = self.volume.cluster_to_sector(cluster);
            for sector in base..base + self.volume.sectors_per_cluster() {
                if bytes_read == limit {
                    break;
                }
                self.device.read_block(sector, &mut sector_data)?;
                let chunk = (limit - bytes_read).min(SECTOR_SIZE);
                buf[bytes_read..bytes_read + chunk].copy_from_slice(&sector_data[..chunk]);
                bytes_read += chunk;
            }

            match self.read_fat_entry(cluster) {
                FatEntry::Next(next) => cluster = next,
                _ => break,
            }
        }

        debug!("[FAT16] Read {} byte(s) from {}", bytes_read, entry.get_name());
        Ok(bytes_read)
    }

    /// Frees the chain of `name`, then marks its entry deleted.
    pub fn delete(&mut self, name: &str) -> Result<(), FsError> {
        let short = ShortName::parse(name)?;
        let (slot, entry) = self.lookup(&short)?.ok_or(FsError::NotFound)?;

        self.free_chain(entry.start_cluster)?;
        self.mark_deleted(slot)?;

        info!("[FAT16] Deleted: {}", entry.get_name());
        Ok(())
    }

    /// Live root directory entries in disk order.
    pub fn list(&mut self) -> Result<Vec<DirEntry>, FsError> {
        Ok(self
            .live_entries()?
            .iter()
            .map(|(_, entry)| entry.to_dir_entry())
            .collect())
    }

    pub fn exists(&mut self, name: &str) -> Result<bool, FsError> {
        let short = ShortName::parse(name)?;
        Ok(self.lookup(&short)?.is_some())
    }

    pub fn metadata(&mut self, name: &str) -> Result<FileMetadata, FsError> {
        let short = ShortName::parse(name)?;
        let (_, entry) = self.lookup(&short)?.ok_or(FsError::NotFound)?;
        Ok(entry.metadata())
    }

    /// Gives an existing entry a new name in place.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        let from_short = ShortName::parse(from)?;
        let to_short = ShortName::parse(to)?;
        let (slot, mut entry) = self.lookup(&from_short)?.ok_or(FsError::NotFound)?;

        if from_short == to_short {
            return Ok(());
        }
        if self.lookup(&to_short)?.is_some() {
            return Err(FsError::AlreadyExists);
        }

        let old_name = entry.get_name();
        entry.set_short_name(to_short);
        self.write_dir_entry(slot, &entry)?;

        info!("[FAT16] Renamed: {} -> {}", old_name, entry.get_name());
        Ok(())
    }

    /// Label, serial and cluster usage of the mounted volume.
    pub fn statistics(&mut self) -> Result<VolumeStats, FsError> {
        let free_clusters = self.count_free_clusters()?;
        let boot_sector = &self.volume.boot_sector;

        let mut label = ArrayString::new();
        let trimmed = boot_sector
            .volume_label
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |last| last + 1);
        for &byte in &boot_sector.volume_label[..trimmed] {
            label.push(if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            });
        }

        Ok(VolumeStats {
            label,
            serial: boot_sector.volume_id,
            cluster_size: self.volume.cluster_size(),
            total_clusters: self.volume.cluster_count(),
            free_clusters,
        })
    }

    /// Writes `content` across the chain starting at `first`, zero-padding
    /// the final sector.
    fn write_chain(&mut self, first: u16, content: &[u8]) -> Result<(), FsError> {
        let mut cluster = first;
        let mut chunks = content.chunks(self.volume.cluster_size()).peekable();

        while let Some(chunk) = chunks.next() {
            let base = self.volume.cluster_to_sector(cluster);
            for (sector, piece) in (base..).zip(chunk.chunks(SECTOR_SIZE)) {
                let mut sector_data = [0u8; SECTOR_SIZE];
                sector_data[..piece.len()].copy_from_slice(piece);
                self.device.write_block(sector, &sector_data)?;
            }

            if chunks.peek().is_some() {
                cluster = match self.read_fat_entry(cluster) {
                    FatEntry::Next(next) => next,
                    _ => return Err(FsError::DeviceError),
                };
            }
        }
        Ok(())
    }
}
