//! Block device implementations

pub mod memory;
