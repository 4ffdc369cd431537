//! System-wide constants and hardware-specific values.

pub mod ata;
pub mod ports;
