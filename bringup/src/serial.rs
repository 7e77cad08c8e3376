//! Serial port (COM1 @ 0x3F8) for debug output. Primary diagnostic channel.
//!
//! The port is stateless: every write builds its own `Port` handles, so there
//! is no lock a fault handler could find already held.

use x86_64::instructions::port::{Port, PortReadOnly, PortWriteOnly};

const COM1: u16 = 0x3F8;

const IER_OFF: u16 = 1;
const FCR_OFF: u16 = 2;
const LCR_OFF: u16 = 3;
const MCR_OFF: u16 = 4;
const LSR_OFF: u16 = 5;

const LCR_DLAB: u8 = 0x80;
const LCR_8N1: u8 = 0x03;
const FCR_ENABLE_CLEAR_14: u8 = 0xC7;
const MCR_DTR_RTS: u8 = 0x03;
const LSR_THRE: u8 = 0x20;

/// 115200 / 3 = 38400 baud.
const DIVISOR: u16 = 3;

/// Initialize COM1 (38400 8n1, FIFO on, no interrupts). Call once at boot.
pub fn init() {
    let mut ier = PortWriteOnly::<u8>::new(COM1 + IER_OFF);
    let mut lcr = PortWriteOnly::<u8>::new(COM1 + LCR_OFF);
    let mut fcr = PortWriteOnly::<u8>::new(COM1 + FCR_OFF);
    let mut mcr = PortWriteOnly::<u8>::new(COM1 + MCR_OFF);
    let mut dll = PortWriteOnly::<u8>::new(COM1);
    let mut dlm = PortWriteOnly::<u8>::new(COM1 + IER_OFF);

    unsafe {
        ier.write(0x00);
        lcr.write(LCR_DLAB);
        dll.write((DIVISOR & 0xFF) as u8);
        dlm.write((DIVISOR >> 8) as u8);
        lcr.write(LCR_8N1);
        fcr.write(FCR_ENABLE_CLEAR_14);
        mcr.write(MCR_DTR_RTS);
    }
}

fn is_transmit_empty() -> bool {
    let mut lsr = PortReadOnly::<u8>::new(COM1 + LSR_OFF);
    unsafe { (lsr.read() & LSR_THRE) != 0 }
}

/// Write one byte to serial. Blocks until THR empty.
pub fn write_byte(b: u8) {
    while !is_transmit_empty() {
        core::hint::spin_loop();
    }
    let mut data = Port::<u8>::new(COM1);
    unsafe { data.write(b) }
}

/// Write raw bytes. Fire-and-forget: a missing port is not detected.
pub fn write_text(bytes: &[u8]) {
    for &b in bytes {
        write_byte(b);
    }
}

/// Write a string to serial. Newlines not translated.
pub fn write_str(s: &str) {
    write_text(s.as_bytes());
}

/// Writer struct for use with core::fmt::Write
pub struct Writer;

impl core::fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        write_text(s.as_bytes());
        Ok(())
    }
}

/// Write formatted text to serial (via Writer)
pub fn write_fmt(args: core::fmt::Arguments) {
    use core::fmt::Write;
    let _ = Writer.write_fmt(args);
}
