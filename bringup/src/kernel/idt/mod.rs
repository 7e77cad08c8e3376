//! Interrupt Descriptor Table (IDT)
//!
//! 256 gates: vectors 0..32 point at per-vector entry stubs that all land in
//! [`dispatch::dispatch`]; vectors 32..256 are left missing. The table is
//! built once and loaded once; there is no way back to the unloaded state.

pub mod dispatch;
pub mod gate;
pub mod stubs;
pub mod table;
pub mod vectors;

#[cfg(test)]
mod tests;

use core::sync::atomic::AtomicBool;

use spin::Once;
use x86_64::VirtAddr;

use crate::arch::x86::cpu;
use crate::kernel::gdt::ActiveGdt;
use crate::kernel::{claim_once, InitError, InitResult};

pub use table::InterruptTable;

static IDT: Once<InterruptTable> = Once::new();

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Build the IDT against the active GDT's code selector and load it.
pub fn build_and_activate(gdt: &ActiveGdt) -> InitResult<&'static InterruptTable> {
    claim_once(&ACTIVE, InitError::IdtAlreadyActive)?;

    let table = IDT.call_once(|| InterruptTable::build(&stubs::entry_points(), gdt.code_selector()));

    unsafe {
        cpu::load_idt(VirtAddr::from_ptr(table), InterruptTable::SIZE);
    }

    log::info!(
        "IDT loaded at {:#x}: {} exception gates, #DF on IST{}",
        VirtAddr::from_ptr(table).as_u64(),
        vectors::EXCEPTION_VECTORS,
        table.gate(vectors::DOUBLE_FAULT).ist_index()
    );
    Ok(table)
}
