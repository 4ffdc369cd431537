//! Port I/O access used by the polling drivers.
//!
//! Drivers talk to hardware through [`PortIo`] so that a register-level
//! emulator can stand in for the real bus.

use x86_64::instructions::port::Port;

/// Byte and word granularity access to I/O ports.
pub trait PortIo {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, value: u8);
    fn read_u16(&mut self, port: u16) -> u16;
    fn write_u16(&mut self, port: u16, value: u16);
}

/// Direct `in`/`out` instructions on the x86 I/O bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwarePorts;

impl PortIo for HardwarePorts {
    fn read_u8(&mut self, port: u16) -> u8 {
        unsafe { Port::<u8>::new(port).read() }
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        unsafe { Port::<u8>::new(port).write(value) }
    }

    fn read_u16(&mut self, port: u16) -> u16 {
        unsafe { Port::<u16>::new(port).read() }
    }

    fn write_u16(&mut self, port: u16, value: u16) {
        unsafe { Port::<u16>::new(port).write(value) }
    }
}
