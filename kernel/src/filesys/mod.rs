use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use arrayvec::ArrayString;
use core::fmt;

use crate::devices::ata::{AtaDrive, AtaError};

pub mod block;
pub mod fat16;

/// Errors surfaced by the storage stack. None of them is fatal to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Disk controller poll budget exhausted
    Timeout,
    /// Disk controller reported an error
    DeviceError,
    NoDevice,
    UnsupportedDevice,
    /// Boot sector failed its sanity check
    InvalidFilesystem,
    /// No free cluster left
    DiskFull,
    /// No free root directory slot left
    DirectoryFull,
    AlreadyExists,
    NotFound,
    InvalidArgument,
    /// Name has no usable 8.3 form
    InvalidName,
}

impl From<AtaError> for FsError {
    fn from(err: AtaError) -> Self {
        match err {
            AtaError::Timeout => FsError::Timeout,
            AtaError::DeviceError => FsError::DeviceError,
            AtaError::NoDevice => FsError::NoDevice,
            AtaError::UnsupportedDevice => FsError::UnsupportedDevice,
            AtaError::InvalidArgument => FsError::InvalidArgument,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            FsError::Timeout => "disk timeout",
            FsError::DeviceError => "disk error",
            FsError::NoDevice => "no disk present",
            FsError::UnsupportedDevice => "unsupported disk",
            FsError::InvalidFilesystem => "invalid sector size or not formatted",
            FsError::DiskFull => "disk full",
            FsError::DirectoryFull => "root directory full",
            FsError::AlreadyExists => "file already exists",
            FsError::NotFound => "file not found",
            FsError::InvalidArgument => "invalid argument",
            FsError::InvalidName => "invalid file name",
        };
        f.write_str(msg)
    }
}

// Core traits for filesystem abstraction

/// Represents a block device that can be read from and written to
pub trait BlockDevice: Send + Sync {
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError>;
    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError>;
    fn block_size(&self) -> usize;
    fn total_blocks(&self) -> u64;

    /// Zero-fills `count` blocks starting at `start`.
    fn erase_blocks(&mut self, start: u64, count: u64) -> Result<(), FsError> {
        let end = start.checked_add(count).ok_or(FsError::InvalidArgument)?;
        let zero = vec![0u8; self.block_size()];
        for block_num in start..end {
            self.write_block(block_num, &zero)?;
        }
        Ok(())
    }
}

/// Attribute bits of a directory entry that callers care about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub read_only: bool,
    pub hidden: bool,
    pub system: bool,
    pub archive: bool,
}

/// File metadata information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// Authoritative size in bytes
    pub size: u32,
    /// Zero for an empty file
    pub first_cluster: u16,
    pub is_dir: bool,
    pub attributes: FileAttributes,
}

/// One live entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Stored 8.3 name, e.g. `README.TXT`
    pub name: ArrayString<12>,
    /// Lowercase form for display, e.g. `readme.txt`
    pub display_name: ArrayString<12>,
    /// Stored extension without the dot, possibly empty
    pub extension: ArrayString<3>,
    pub metadata: FileMetadata,
}

/// Flat, root-only filesystem operations offered to the shell
pub trait FileSystem {
    fn create_file(&mut self, name: &str, content: &[u8]) -> Result<(), FsError>;
    /// Returns the number of bytes copied into `buf`
    fn read_file(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, FsError>;
    fn remove_file(&mut self, name: &str) -> Result<(), FsError>;
    fn read_dir(&mut self) -> Result<Vec<DirEntry>, FsError>;
    fn exists(&mut self, name: &str) -> Result<bool, FsError>;
    fn metadata(&mut self, name: &str) -> Result<FileMetadata, FsError>;
    fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError>;
}

/// Brings up the primary master disk and mounts its FAT16 volume.
pub fn init() -> Result<fat16::Fat16<'static>, FsError> {
    let drive = AtaDrive::primary().open()?;
    fat16::Fat16::mount(Box::new(drive))
}
