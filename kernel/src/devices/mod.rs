//! Device drivers used by the storage stack.
//!
//! This module holds the hardware-facing pieces:
//! - ATA/IDE disk driver (polling, PIO, LBA28)
//! - Port I/O seam the drivers are written against
//! - Serial port used as the log sink

pub mod ata;
pub mod port;
pub mod serial;
