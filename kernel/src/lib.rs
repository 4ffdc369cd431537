#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
extern crate alloc;

pub mod constants;
pub mod devices;
pub mod filesys;
pub mod logging;

pub use devices::serial;

pub mod prelude {
    pub use crate::devices::ata::{AtaDrive, AtaError};
    pub use crate::filesys::fat16::Fat16;
    pub use crate::filesys::{BlockDevice, FileSystem, FsError};
    pub use crate::serial_print;
    pub use crate::serial_println;
}
