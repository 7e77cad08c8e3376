//! Privileged instruction wrappers.
//!
//! None of these report failure. A bad operand shows up as #GP, or as a
//! triple fault when no IDT is loaded yet; the preconditions below are the
//! whole contract.

use x86_64::instructions::segmentation::{Segment, CS, DS, ES, FS, GS, SS};
use x86_64::instructions::{hlt, interrupts, tables};
use x86_64::registers::control::Cr2;
use x86_64::registers::segmentation::SegmentSelector;
use x86_64::structures::DescriptorTablePointer;
use x86_64::VirtAddr;

/// `lgdt` with a base/limit pair; limit is `size_bytes - 1`.
///
/// # Safety
/// The table must stay valid and unmodified for as long as it is loaded.
pub unsafe fn load_gdt(base: VirtAddr, size_bytes: usize) {
    let pointer = DescriptorTablePointer {
        limit: (size_bytes - 1) as u16,
        base,
    };
    tables::lgdt(&pointer);
}

/// `lidt` with a base/limit pair; limit is `size_bytes - 1`.
///
/// # Safety
/// The table must stay valid and unmodified for as long as it is loaded.
pub unsafe fn load_idt(base: VirtAddr, size_bytes: usize) {
    let pointer = DescriptorTablePointer {
        limit: (size_bytes - 1) as u16,
        base,
    };
    tables::lidt(&pointer);
}

/// Reload SS, DS, ES, FS and GS from the current GDT.
///
/// # Safety
/// `selector` must name a present, writable data descriptor in the loaded GDT.
pub unsafe fn reload_data_segments(selector: SegmentSelector) {
    SS::set_reg(selector);
    DS::set_reg(selector);
    ES::set_reg(selector);
    FS::set_reg(selector);
    GS::set_reg(selector);
}

/// Force CS to `selector` with a far return to the next instruction.
///
/// CS cannot be written by `mov`; pushing the selector and return address and
/// executing `retfq` makes the CPU fetch the descriptor from the new table.
///
/// # Safety
/// `selector` must name a present 64-bit code descriptor in the loaded GDT.
pub unsafe fn reload_code_segment(selector: SegmentSelector) {
    CS::set_reg(selector);
}

/// `ltr`. Marks the referenced TSS descriptor busy.
///
/// # Safety
/// `selector` must name an available 64-bit TSS descriptor in the loaded GDT.
pub unsafe fn load_task_register(selector: SegmentSelector) {
    tables::load_tss(selector);
}

pub fn code_segment() -> SegmentSelector {
    CS::get_reg()
}

pub fn data_segment() -> SegmentSelector {
    DS::get_reg()
}

pub fn stack_segment() -> SegmentSelector {
    SS::get_reg()
}

/// `str`: selector currently held in the task register.
pub fn task_register() -> SegmentSelector {
    let selector: u16;
    unsafe {
        core::arch::asm!("str {0:x}", out(reg) selector, options(nomem, nostack, preserves_flags));
    }
    SegmentSelector(selector)
}

/// `sgdt`.
pub fn loaded_gdt() -> DescriptorTablePointer {
    tables::sgdt()
}

/// `sidt`.
pub fn loaded_idt() -> DescriptorTablePointer {
    tables::sidt()
}

/// Faulting linear address of the most recent page fault.
///
/// Read raw: a non-canonical address is reported as-is.
pub fn fault_address() -> u64 {
    Cr2::read_raw()
}

pub fn stack_pointer() -> u64 {
    let rsp: u64;
    unsafe {
        core::arch::asm!("mov {}, rsp", out(reg) rsp, options(nomem, nostack, preserves_flags));
    }
    rsp
}

/// Disable interrupts and halt forever.
pub fn halt_forever() -> ! {
    interrupts::disable();
    loop {
        hlt();
    }
}

/// `cli`. Nothing routes vectors 32..256, so IF stays clear for good.
pub fn disable_interrupts() {
    interrupts::disable();
}
