//! FAT16 directory entry structure and operations

use arrayvec::ArrayString;

use super::constants::*;
use crate::filesys::{DirEntry, FileAttributes, FileMetadata, FsError};

/// Space-padded, uppercase 8.3 name as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    pub name: [u8; MAX_FILENAME_LENGTH],
    pub ext: [u8; MAX_EXTENSION_LENGTH],
}

impl ShortName {
    /// Normalizes a user-supplied name.
    ///
    /// Up to 8 characters before the first '.' form the name and up to 3
    /// after it the extension; the rest is dropped. Letters are uppercased.
    pub fn parse(name: &str) -> Result<Self, FsError> {
        let mut short = ShortName {
            name: [b' '; MAX_FILENAME_LENGTH],
            ext: [b' '; MAX_EXTENSION_LENGTH],
        };

        let (base, ext) = match name.split_once('.') {
            Some((base, ext)) => (base, ext),
            None => (name, ""),
        };

        for (slot, byte) in short.name.iter_mut().zip(base.bytes()) {
            *slot = byte.to_ascii_uppercase();
        }
        for (slot, byte) in short.ext.iter_mut().zip(ext.bytes()) {
            *slot = byte.to_ascii_uppercase();
        }

        let bytes = short.name.iter().chain(short.ext.iter());
        if bytes.clone().all(|&b| b == b' ') || bytes.clone().any(|&b| !is_name_byte(b)) {
            return Err(FsError::InvalidName);
        }
        Ok(short)
    }
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_graphic() || byte == b' '
}

fn push_trimmed<const N: usize>(out: &mut ArrayString<N>, field: &[u8], lowercase: bool) {
    for &byte in field.iter().take_while(|&&b| b != b' ') {
        let ch = if byte.is_ascii_graphic() {
            byte as char
        } else {
            '?'
        };
        out.push(if lowercase { ch.to_ascii_lowercase() } else { ch });
    }
}

/// 8.3 format directory entry (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry83 {
    /// 8 character filename
    pub name: [u8; 8],

    /// 3 character extension
    pub ext: [u8; 3],

    /// File attributes (read-only, directory, etc)
    pub attributes: u8,

    /// Reserved and creation time fields, written as zero
    pub reserved: [u8; 10],

    /// Modification time
    pub time: u16,

    /// Modification date
    pub date: u16,

    /// First cluster number
    pub start_cluster: u16,

    /// File size in bytes
    pub file_size: u32,
}

impl DirEntry83 {
    /// Creates a new file entry with given name and starting cluster
    pub fn new_file(name: ShortName, start_cluster: u16, file_size: u32) -> Self {
        Self {
            name: name.name,
            ext: name.ext,
            attributes: ATTR_ARCHIVE,
            reserved: [0; 10],
            time: 0,
            date: 0,
            start_cluster,
            file_size,
        }
    }

    /// Decodes the entry at the start of `raw` (at least 32 bytes).
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut entry = Self {
            name: [0; 8],
            ext: [0; 3],
            attributes: raw[11],
            reserved: [0; 10],
            time: u16::from_le_bytes([raw[22], raw[23]]),
            date: u16::from_le_bytes([raw[24], raw[25]]),
            start_cluster: u16::from_le_bytes([raw[26], raw[27]]),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        };
        entry.name.copy_from_slice(&raw[0..8]);
        entry.ext.copy_from_slice(&raw[8..11]);
        entry.reserved.copy_from_slice(&raw[12..22]);
        entry
    }

    /// Encodes the entry into the first 32 bytes of `raw`.
    pub fn write_to(&self, raw: &mut [u8]) {
        raw[0..8].copy_from_slice(&self.name);
        raw[8..11].copy_from_slice(&self.ext);
        raw[11] = self.attributes;
        raw[12..22].copy_from_slice(&self.reserved);
        raw[22..24].copy_from_slice(&self.time.to_le_bytes());
        raw[24..26].copy_from_slice(&self.date.to_le_bytes());
        raw[26..28].copy_from_slice(&self.start_cluster.to_le_bytes());
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
    }

    /// Returns true if entry is marked as deleted
    pub fn is_deleted(&self) -> bool {
        self.name[0] == DELETED_ENTRY_MARKER
    }

    /// Returns true if entry is empty/unused
    pub fn is_free(&self) -> bool {
        self.name[0] == UNUSED_ENTRY_MARKER
    }

    /// Returns true if entry is a directory
    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes & ATTR_VOLUME_ID != 0
    }

    /// A file or directory a caller can see: not free, deleted, or a label.
    pub fn is_live(&self) -> bool {
        !self.is_free() && !self.is_deleted() && !self.is_volume_label()
    }

    pub fn short_name(&self) -> ShortName {
        ShortName {
            name: self.name,
            ext: self.ext,
        }
    }

    pub fn set_short_name(&mut self, name: ShortName) {
        self.name = name.name;
        self.ext = name.ext;
    }

    /// Returns the filename as stored, e.g. `README.TXT`
    pub fn get_name(&self) -> ArrayString<12> {
        self.format_name(false)
    }

    /// Lowercase name for listings, e.g. `readme.txt`
    pub fn display_name(&self) -> ArrayString<12> {
        self.format_name(true)
    }

    pub fn extension(&self) -> ArrayString<3> {
        let mut ext = ArrayString::new();
        push_trimmed(&mut ext, &self.ext, false);
        ext
    }

    fn format_name(&self, lowercase: bool) -> ArrayString<12> {
        let mut out = ArrayString::new();
        push_trimmed(&mut out, &self.name, lowercase);
        if self.ext[0] != b' ' {
            out.push('.');
            push_trimmed(&mut out, &self.ext, lowercase);
        }
        out
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: self.file_size,
            first_cluster: self.start_cluster,
            is_dir: self.is_directory(),
            attributes: FileAttributes {
                read_only: self.attributes & ATTR_READ_ONLY != 0,
                hidden: self.attributes & ATTR_HIDDEN != 0,
                system: self.attributes & ATTR_SYSTEM != 0,
                archive: self.attributes & ATTR_ARCHIVE != 0,
            },
        }
    }

    pub fn to_dir_entry(&self) -> DirEntry {
        DirEntry {
            name: self.get_name(),
            display_name: self.display_name(),
            extension: self.extension(),
            metadata: self.metadata(),
        }
    }
}
