//! Bring-up sequence: TSS, then GDT, then IDT.

pub mod error;
pub mod gdt;
pub mod idt;
pub mod selftest;

use core::sync::atomic::{AtomicBool, Ordering};

use bootloader_api::info::Optional;
use bootloader_api::BootInfo;
use x86_64::VirtAddr;

use crate::arch::x86::{cpu, long_mode};
use crate::{config, logger, screen, serial};

pub use error::{InitError, InitResult};

/// Everything bring-up produced. Only shared references: the tables are
/// frozen once loaded.
pub struct KernelState {
    pub gdt: gdt::ActiveGdt,
    pub idt: &'static idt::InterruptTable,
}

/// Boot glue: diagnostics channels, precondition checks, then [`init`].
pub fn early_init(boot_info: &'static BootInfo) -> InitResult<KernelState> {
    cpu::disable_interrupts();
    serial::init();
    logger::init(config::LOG_LEVEL)?;
    log::info!("bring-up: kernel running");

    if !long_mode::is_long_mode() {
        return Err(InitError::NotInLongMode);
    }
    log::info!("64-bit long mode");

    screen::init(physical_memory_offset(boot_info));

    let state = init(gdt::stack::kernel_stack().top)?;

    match selftest::verify(&state) {
        0 => {
            log::info!("bring-up complete");
            screen::write_screen_text(b"bring-up complete: GDT, TSS and IDT active\n");
        }
        n => {
            log::warn!("bring-up complete with {} mismatches", n);
            screen::write_screen_text(b"bring-up complete: CPU state differs, see serial\n");
        }
    }
    Ok(state)
}

/// Populate the TSS with `kernel_stack_top` as RSP0, activate the GDT, then
/// the IDT. Runs once; a second call fails without touching the CPU.
///
/// [`early_init`] passes the dedicated static ring 0 stack, not the stack it
/// is running on: the bootloader does not report where its entry stack ends.
pub fn init(kernel_stack_top: VirtAddr) -> InitResult<KernelState> {
    let gdt = gdt::init(kernel_stack_top)?;
    let idt = idt::build_and_activate(&gdt)?;
    Ok(KernelState { gdt, idt })
}

/// Run the configured fault scenario, if any, then halt.
pub fn kernel_loop(_state: KernelState) -> ! {
    selftest::run_scenario();
    cpu::halt_forever()
}

/// Set a one-way flag. Fails with `err` if it was already set.
pub(crate) fn claim_once(flag: &AtomicBool, err: InitError) -> InitResult<()> {
    if flag.swap(true, Ordering::AcqRel) {
        Err(err)
    } else {
        Ok(())
    }
}

fn physical_memory_offset(boot_info: &BootInfo) -> Option<u64> {
    match boot_info.physical_memory_offset {
        Optional::Some(addr) => {
            log::debug!("physical memory offset: {:#x}", addr);
            Some(addr)
        }
        Optional::None => {
            log::warn!("no physical memory offset (using identity mapping)");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_once_succeeds_only_the_first_time() {
        let flag = AtomicBool::new(false);
        assert_eq!(claim_once(&flag, InitError::GdtAlreadyActive), Ok(()));
        assert_eq!(
            claim_once(&flag, InitError::GdtAlreadyActive),
            Err(InitError::GdtAlreadyActive)
        );
        assert!(flag.load(Ordering::Acquire));
    }

    #[test]
    fn claim_once_reports_the_given_error() {
        let flag = AtomicBool::new(true);
        assert_eq!(
            claim_once(&flag, InitError::IdtAlreadyActive),
            Err(InitError::IdtAlreadyActive)
        );
    }
}
