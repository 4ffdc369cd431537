//! FAT16 file allocation table entry

use super::constants::*;

/// Decoded meaning of a 16-bit FAT entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    Reserved,
    /// Next cluster of the chain
    Next(u16),
    Bad,
    EndOfChain,
}

impl FatEntry {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            FAT_FREE => FatEntry::Free,
            FAT_RESERVED => FatEntry::Reserved,
            FAT_BAD => FatEntry::Bad,
            raw if raw >= FAT_END_OF_CHAIN => FatEntry::EndOfChain,
            next => FatEntry::Next(next),
        }
    }

    /// Value stored on disk. End of chain is always written as 0xFFFF.
    pub fn raw(self) -> u16 {
        match self {
            FatEntry::Free => FAT_FREE,
            FatEntry::Reserved => FAT_RESERVED,
            FatEntry::Next(next) => next,
            FatEntry::Bad => FAT_BAD,
            FatEntry::EndOfChain => FAT_EOC_WRITE,
        }
    }

    /// Returns true if this entry marks the end of a cluster chain
    pub fn is_end_of_chain(self) -> bool {
        self == FatEntry::EndOfChain
    }

    /// Returns true if this cluster is unused/free
    pub fn is_free(self) -> bool {
        self == FatEntry::Free
    }
}
