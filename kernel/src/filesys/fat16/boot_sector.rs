//! FAT16 Boot Sector Structure

use super::constants::*;

/// Represents the boot sector of a FAT16 filesystem
///
/// Decoded field by field from little-endian bytes; see [`BootSector::parse`]
/// for the offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSector {
    /// Jump instruction to boot code
    pub jump_boot: [u8; 3],

    /// Name of the system that formatted the volume
    pub oem_name: [u8; 8],

    /// Number of bytes per sector
    pub bytes_per_sector: u16,

    /// Number of sectors per cluster
    pub sectors_per_cluster: u8,

    /// Number of reserved sectors at start of volume
    /// Including the boot sector. Typically 1 for FAT16
    pub reserved_sectors: u16,

    /// Number of FAT copies
    pub fat_count: u8,

    /// Maximum number of root directory entries
    pub root_dir_entries: u16,

    /// Total number of sectors (16-bit)
    /// Zero when the count only fits `total_sectors_32`
    pub total_sectors_16: u16,

    /// Media type descriptor
    pub media_type: u8,

    /// Sectors per FAT
    /// Size of each FAT copy in sectors
    pub sectors_per_fat: u16,

    /// Sectors per track for interrupt 0x13
    pub sectors_per_track: u16,

    /// Number of heads for interrupt 0x13
    pub head_count: u16,

    /// Number of hidden sectors preceding the partition
    pub hidden_sectors: u32,

    /// Total number of sectors (32-bit)
    pub total_sectors_32: u32,

    /// INT 13h drive number
    pub drive_number: u8,

    /// Reserved byte
    pub reserved1: u8,

    /// Extended boot signature
    pub boot_signature: u8,

    /// Volume serial number
    pub volume_id: u32,

    /// Volume label
    pub volume_label: [u8; 11],

    /// Filesystem type string
    pub fs_type: [u8; 8],
}

fn le16(sector: &[u8; SECTOR_SIZE], offset: usize) -> u16 {
    u16::from_le_bytes([sector[offset], sector[offset + 1]])
}

fn le32(sector: &[u8; SECTOR_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes([
        sector[offset],
        sector[offset + 1],
        sector[offset + 2],
        sector[offset + 3],
    ])
}

fn array<const N: usize>(sector: &[u8; SECTOR_SIZE], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&sector[offset..offset + N]);
    out
}

impl BootSector {
    /// Decodes the parameter block from a raw boot sector.
    pub fn parse(sector: &[u8; SECTOR_SIZE]) -> Self {
        Self {
            jump_boot: array(sector, 0),
            oem_name: array(sector, 3),
            bytes_per_sector: le16(sector, 11),
            sectors_per_cluster: sector[13],
            reserved_sectors: le16(sector, 14),
            fat_count: sector[16],
            root_dir_entries: le16(sector, 17),
            total_sectors_16: le16(sector, 19),
            media_type: sector[21],
            sectors_per_fat: le16(sector, 22),
            sectors_per_track: le16(sector, 24),
            head_count: le16(sector, 26),
            hidden_sectors: le32(sector, 28),
            total_sectors_32: le32(sector, 32),
            drive_number: sector[36],
            reserved1: sector[37],
            boot_signature: sector[38],
            volume_id: le32(sector, 39),
            volume_label: array(sector, 43),
            fs_type: array(sector, 54),
        }
    }

    /// Encodes the parameter block into `sector`, including the 0x55AA
    /// trailer. Boot code bytes are zeroed.
    pub fn write_to(&self, sector: &mut [u8; SECTOR_SIZE]) {
        sector.fill(0);
        sector[0..3].copy_from_slice(&self.jump_boot);
        sector[3..11].copy_from_slice(&self.oem_name);
        sector[11..13].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        sector[13] = self.sectors_per_cluster;
        sector[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        sector[16] = self.fat_count;
        sector[17..19].copy_from_slice(&self.root_dir_entries.to_le_bytes());
        sector[19..21].copy_from_slice(&self.total_sectors_16.to_le_bytes());
        sector[21] = self.media_type;
        sector[22..24].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        sector[24..26].copy_from_slice(&self.sectors_per_track.to_le_bytes());
        sector[26..28].copy_from_slice(&self.head_count.to_le_bytes());
        sector[28..32].copy_from_slice(&self.hidden_sectors.to_le_bytes());
        sector[32..36].copy_from_slice(&self.total_sectors_32.to_le_bytes());
        sector[36] = self.drive_number;
        sector[37] = self.reserved1;
        sector[38] = self.boot_signature;
        sector[39..43].copy_from_slice(&self.volume_id.to_le_bytes());
        sector[43..54].copy_from_slice(&self.volume_label);
        sector[54..62].copy_from_slice(&self.fs_type);
        sector[510..512].copy_from_slice(&BOOT_SIGNATURE);
    }

    /// Sector count from whichever of the two fields is in use.
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }
}
