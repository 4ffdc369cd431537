//! In-memory block device implementation

use crate::filesys::{BlockDevice, FsError};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// Block device that stores data in memory
///
/// Storage is sparse: blocks that were never written read back as zeros and
/// cost nothing, so a full-size volume can be held in a test.
pub struct MemoryBlockDevice {
    /// Written blocks, keyed by block number
    blocks: BTreeMap<u64, Vec<u8>>,

    /// Size of each block in bytes
    block_size: usize,

    /// Number of addressable blocks
    total_blocks: u64,

    /// Block writes served so far
    writes: usize,
}

impl MemoryBlockDevice {
    /// Creates a new memory block device with given size
    pub fn new(total_blocks: u64, block_size: usize) -> Self {
        Self {
            blocks: BTreeMap::new(),
            block_size,
            total_blocks,
            writes: 0,
        }
    }

    /// Number of `write_block` calls served
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Validates block number is within bounds
    fn validate_block(&self, block_num: u64) -> Result<(), FsError> {
        if block_num >= self.total_blocks {
            return Err(FsError::InvalidArgument);
        }
        Ok(())
    }

    /// Validates buffer is correct block size
    fn validate_buffer(&self, buf: &[u8]) -> Result<(), FsError> {
        if buf.len() != self.block_size {
            return Err(FsError::InvalidArgument);
        }
        Ok(())
    }
}

impl BlockDevice for MemoryBlockDevice {
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError> {
        self.validate_block(block_num)?;
        self.validate_buffer(buf)?;
        match self.blocks.get(&block_num) {
            Some(block) => buf.copy_from_slice(block),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError> {
        self.validate_block(block_num)?;
        self.validate_buffer(buf)?;
        self.writes += 1;
        if buf.iter().all(|&b| b == 0) {
            self.blocks.remove(&block_num);
        } else {
            self.blocks.insert(block_num, buf.to_vec());
        }
        Ok(())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn total_blocks(&self) -> u64 {
        self.total_blocks
    }
}
