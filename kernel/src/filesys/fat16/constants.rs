//! FAT16 filesystem constants

/// Size of a disk sector in bytes
pub const SECTOR_SIZE: usize = 512;

/// Disk sector where the volume's boot sector lives (1 MiB in)
pub const PARTITION_START_LBA: u64 = 2048;

/// Size of FAT entry in bytes (16-bit)
pub const FAT_ENTRY_SIZE: usize = 2;

/// FAT entries held by one sector
pub const FAT_ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / FAT_ENTRY_SIZE;

/// Size of one directory entry in bytes
pub const DIR_ENTRY_SIZE: usize = 32;

/// Directory entries held by one sector
pub const DIR_ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;

/// Maximum number of root directory entries
pub const ROOT_DIR_ENTRIES: u16 = 512;

/// Maximum length of filename excluding extension
pub const MAX_FILENAME_LENGTH: usize = 8;

/// Maximum length of file extension
pub const MAX_EXTENSION_LENGTH: usize = 3;

/// File attribute: Read-only
pub const ATTR_READ_ONLY: u8 = 0x01;

/// File attribute: Hidden
pub const ATTR_HIDDEN: u8 = 0x02;

/// File attribute: System
pub const ATTR_SYSTEM: u8 = 0x04;

/// File attribute: Volume label
pub const ATTR_VOLUME_ID: u8 = 0x08;

/// File attribute: Directory
pub const ATTR_DIRECTORY: u8 = 0x10;

/// File attribute: Archive
pub const ATTR_ARCHIVE: u8 = 0x20;

/// First name byte of a slot that was never used; nothing follows it
pub const UNUSED_ENTRY_MARKER: u8 = 0x00;

/// Marker for deleted directory entries
pub const DELETED_ENTRY_MARKER: u8 = 0xE5;

/// FAT value of an unallocated cluster
pub const FAT_FREE: u16 = 0x0000;

/// FAT value of a reserved cluster
pub const FAT_RESERVED: u16 = 0x0001;

/// FAT value of a cluster with a media defect
pub const FAT_BAD: u16 = 0xFFF7;

/// Smallest FAT value ending a chain
pub const FAT_END_OF_CHAIN: u16 = 0xFFF8;

/// End-of-chain value written when a chain is terminated
pub const FAT_EOC_WRITE: u16 = 0xFFFF;

/// First data cluster number
pub const FIRST_DATA_CLUSTER: u16 = 2;

/// Clusters from here upward collide with the reserved FAT values
pub const CLUSTER_LIMIT: u16 = 0xFFF0;

/// Boot sector trailer bytes at offsets 510 and 511
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// Extended boot record signature
pub const EXTENDED_BOOT_SIGNATURE: u8 = 0x29;
