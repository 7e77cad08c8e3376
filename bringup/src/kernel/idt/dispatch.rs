//! Shared fault handler.
//!
//! Every trap ends here and nothing returns: the report goes to serial, a
//! short tag goes to the screen, then the CPU halts with interrupts off.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};

use x86_64::structures::idt::InterruptStackFrame;

use super::vectors::{exception, DOUBLE_FAULT, PAGE_FAULT};
use crate::arch::x86::cpu;
use crate::config::FAULT_TAG_ATTRIBUTE;
use crate::kernel::gdt::stack;
use crate::{screen, serial};

/// "EXC" plus two decimal digits.
pub const TAG_LEN: usize = 5;

/// Set on entry; a second trap while reporting skips straight to the halt.
static REPORTING: AtomicBool = AtomicBool::new(false);

/// Interrupted context, copied out of the hardware frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSnapshot {
    pub instruction_pointer: u64,
    pub code_segment: u16,
    pub cpu_flags: u64,
    pub stack_pointer: u64,
    pub stack_segment: u16,
}

impl From<&InterruptStackFrame> for FrameSnapshot {
    fn from(frame: &InterruptStackFrame) -> Self {
        Self {
            instruction_pointer: frame.instruction_pointer.as_u64(),
            code_segment: frame.code_segment.0,
            cpu_flags: frame.cpu_flags.bits(),
            stack_pointer: frame.stack_pointer.as_u64(),
            stack_segment: frame.stack_segment.0,
        }
    }
}

/// Stack the handler itself is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerStack {
    pub stack_pointer: u64,
    pub on_fault_stack: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultReport {
    pub vector: u8,
    pub error_code: u64,
    /// CR2, page faults only.
    pub fault_address: Option<u64>,
    pub frame: Option<FrameSnapshot>,
    /// Double faults only.
    pub handler_stack: Option<HandlerStack>,
}

impl FaultReport {
    pub fn new(vector: u8, error_code: u64) -> Self {
        Self {
            vector,
            error_code,
            fault_address: None,
            frame: None,
            handler_stack: None,
        }
    }

    /// Serial report: vector in decimal, everything else in hex.
    pub fn write_to<W: Write>(&self, out: &mut W) -> fmt::Result {
        let (mnemonic, name) = match exception(self.vector) {
            Some(exc) => (exc.mnemonic, exc.name),
            None => ("--", "unknown"),
        };

        write!(
            out,
            "\n!!! FAULT vector={} {} ({}) error={:#x}\n",
            self.vector, mnemonic, name, self.error_code
        )?;
        if let Some(addr) = self.fault_address {
            write!(out, "    fault address={:#x}\n", addr)?;
        }
        if let Some(frame) = &self.frame {
            write!(
                out,
                "    rip={:#x} cs={:#x} rflags={:#x} rsp={:#x} ss={:#x}\n",
                frame.instruction_pointer,
                frame.code_segment,
                frame.cpu_flags,
                frame.stack_pointer,
                frame.stack_segment
            )?;
        }
        if let Some(stack) = &self.handler_stack {
            let which = if stack.on_fault_stack {
                "alternate fault stack"
            } else {
                "NOT on alternate fault stack"
            };
            write!(out, "    handler rsp={:#x} ({})\n", stack.stack_pointer, which)?;
        }
        out.write_str("    system halted\n")
    }
}

/// Fixed-width screen tag, e.g. `EXC14`.
pub fn screen_tag(vector: u8) -> [u8; TAG_LEN] {
    let vector = vector % 100;
    [b'E', b'X', b'C', b'0' + vector / 10, b'0' + vector % 10]
}

/// Report the trap and halt. Called by every entry stub.
pub fn dispatch(vector: u8, error_code: u64, frame: &InterruptStackFrame) -> ! {
    // CR2 and RSP first: anything that faults while reporting would clobber them.
    let fault_address = (vector == PAGE_FAULT).then(cpu::fault_address);
    let handler_stack = (vector == DOUBLE_FAULT).then(|| {
        let rsp = cpu::stack_pointer();
        HandlerStack {
            stack_pointer: rsp,
            on_fault_stack: stack::fault_stack().contains(rsp),
        }
    });

    if REPORTING.swap(true, Ordering::Relaxed) {
        serial::write_str("\n!!! nested fault while reporting; halting\n");
        cpu::halt_forever();
    }

    let report = FaultReport {
        vector,
        error_code,
        fault_address,
        frame: Some(FrameSnapshot::from(frame)),
        handler_stack,
    };

    let _ = report.write_to(&mut serial::Writer);
    screen::write_at(0, 0, &screen_tag(vector), FAULT_TAG_ATTRIBUTE);

    cpu::halt_forever()
}
