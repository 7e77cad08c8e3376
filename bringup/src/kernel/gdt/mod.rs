//! Global Descriptor Table (GDT) subsystem
//!
//! Builds the flat-model GDT with kernel and user segments plus the TSS, then
//! runs the activation sequence:
//!
//! 1. `lgdt`
//! 2. reload SS/DS/ES/FS/GS with the kernel data selector
//! 3. far return to reload CS with the kernel code selector
//! 4. `ltr` with the TSS selector
//!
//! # Safety
//!
//! A wrong descriptor or a step out of order is not reported: the CPU raises
//! #GP, or triple-faults if no IDT is loaded yet.

pub mod descriptor;
pub mod stack;
pub mod table;
pub mod tss;

#[cfg(test)]
mod tests;

use core::sync::atomic::AtomicBool;

use spin::Once;
use x86_64::registers::segmentation::SegmentSelector;
use x86_64::structures::tss::TaskStateSegment;
use x86_64::VirtAddr;

use crate::arch::x86::cpu;
use crate::kernel::{claim_once, InitError, InitResult};

pub use table::{
    GdtTable, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR, TSS_SELECTOR, USER_CODE_SELECTOR,
    USER_DATA_SELECTOR,
};

/// The process-wide GDT. Built once, then only read.
static GDT: Once<GdtTable> = Once::new();

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Proof that the GDT is loaded and CS/TR refer to it.
///
/// The IDT builder takes one of these, so gates can only be written after the
/// kernel code selector they reference is live.
pub struct ActiveGdt {
    table: &'static GdtTable,
    tss: &'static TaskStateSegment,
}

impl ActiveGdt {
    pub fn table(&self) -> &'static GdtTable {
        self.table
    }

    pub fn tss(&self) -> &'static TaskStateSegment {
        self.tss
    }

    pub fn code_selector(&self) -> SegmentSelector {
        KERNEL_CODE_SELECTOR
    }
}

/// Populate the TSS, then build and activate the GDT.
///
/// `kernel_stack_top` becomes RSP0, the stack the CPU switches to on a
/// ring 3 -> ring 0 transition. The caller owns that stack; bring-up uses
/// [`stack::kernel_stack`]. Must be called before the IDT is set up.
pub fn init(kernel_stack_top: VirtAddr) -> InitResult<ActiveGdt> {
    let tss = tss::init(kernel_stack_top)?;
    build_and_activate(tss)
}

/// Build the GDT around `tss` and load it. Runs at most once.
pub fn build_and_activate(tss: &'static TaskStateSegment) -> InitResult<ActiveGdt> {
    claim_once(&ACTIVE, InitError::GdtAlreadyActive)?;

    let table = GDT.call_once(|| GdtTable::build(VirtAddr::from_ptr(tss)));
    log::debug!("loading GDT at {:#x}", VirtAddr::from_ptr(table).as_u64());

    unsafe {
        cpu::load_gdt(VirtAddr::from_ptr(table), GdtTable::SIZE);
        cpu::reload_data_segments(KERNEL_DATA_SELECTOR);
        cpu::reload_code_segment(KERNEL_CODE_SELECTOR);
        cpu::load_task_register(TSS_SELECTOR);
    }

    log_gdt_info();
    Ok(ActiveGdt { table, tss })
}

fn log_gdt_info() {
    log::info!(
        "GDT loaded: code={:#x} data={:#x} user code={:#x} user data={:#x} tss={:#x}",
        KERNEL_CODE_SELECTOR.0,
        KERNEL_DATA_SELECTOR.0,
        USER_CODE_SELECTOR.0,
        USER_DATA_SELECTOR.0,
        TSS_SELECTOR.0
    );
}
