//! Runtime checks, run on the CPU (or an emulator) after bring-up.
//!
//! `verify` reads back what the processor actually loaded. The fault
//! scenarios are selected with the `selftest-*` features and never return.

use x86_64::structures::tss::TaskStateSegment;
use x86_64::VirtAddr;

use super::gdt::descriptor::{decode_system_type, decode_tss_base, TSS_AVAILABLE_64, TSS_BUSY_64};
use super::gdt::table::TSS_SLOT;
use super::gdt::{GdtTable, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR, TSS_SELECTOR};
use super::idt::InterruptTable;
use super::KernelState;
use crate::arch::x86::cpu;

/// Canonical, never mapped by the bootloader.
pub const UNMAPPED_ADDRESS: u64 = 0x0000_0dea_dbee_f000;

/// Descriptor-table state as the CPU reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTables {
    pub code_segment: u16,
    pub data_segment: u16,
    pub stack_segment: u16,
    pub task_register: u16,
    pub gdt_base: u64,
    pub gdt_limit: u16,
    pub idt_base: u64,
    pub idt_limit: u16,
}

impl CpuTables {
    pub fn capture() -> Self {
        let gdtr = cpu::loaded_gdt();
        let idtr = cpu::loaded_idt();
        Self {
            code_segment: cpu::code_segment().0,
            data_segment: cpu::data_segment().0,
            stack_segment: cpu::stack_segment().0,
            task_register: cpu::task_register().0,
            gdt_base: gdtr.base.as_u64(),
            gdt_limit: gdtr.limit,
            idt_base: idtr.base.as_u64(),
            idt_limit: idtr.limit,
        }
    }

    /// What a correct bring-up leaves behind for these tables.
    pub fn expected(gdt: &GdtTable, idt: &InterruptTable) -> Self {
        Self {
            code_segment: KERNEL_CODE_SELECTOR.0,
            data_segment: KERNEL_DATA_SELECTOR.0,
            stack_segment: KERNEL_DATA_SELECTOR.0,
            task_register: TSS_SELECTOR.0,
            gdt_base: VirtAddr::from_ptr(gdt).as_u64(),
            gdt_limit: (GdtTable::SIZE - 1) as u16,
            idt_base: VirtAddr::from_ptr(idt).as_u64(),
            idt_limit: (InterruptTable::SIZE - 1) as u16,
        }
    }

    /// Log each field that differs from `expected`; returns how many did.
    pub fn mismatches(&self, expected: &Self) -> usize {
        let fields = [
            ("CS", self.code_segment as u64, expected.code_segment as u64),
            ("DS", self.data_segment as u64, expected.data_segment as u64),
            ("SS", self.stack_segment as u64, expected.stack_segment as u64),
            ("TR", self.task_register as u64, expected.task_register as u64),
            ("GDTR base", self.gdt_base, expected.gdt_base),
            ("GDTR limit", self.gdt_limit as u64, expected.gdt_limit as u64),
            ("IDTR base", self.idt_base, expected.idt_base),
            ("IDTR limit", self.idt_limit as u64, expected.idt_limit as u64),
        ];

        let mut count = 0;
        for (name, observed, wanted) in fields {
            if observed != wanted {
                log::error!("{}: {:#x}, expected {:#x}", name, observed, wanted);
                count += 1;
            }
        }
        count
    }
}

/// Check that the TSS descriptor in `table` still points at `tss` and is
/// marked busy, which `ltr` does. Returns how many checks failed.
pub fn tss_descriptor_mismatches(
    table: &GdtTable,
    tss: &TaskStateSegment,
    loaded: bool,
) -> usize {
    let low = table.slot(TSS_SLOT);
    let high = table.slot(TSS_SLOT + 1);
    let mut count = 0;

    let base = decode_tss_base(low, high);
    let wanted = VirtAddr::from_ptr(tss).as_u64();
    if base != wanted {
        log::error!("TSS descriptor base: {:#x}, expected {:#x}", base, wanted);
        count += 1;
    }

    let wanted_type = if loaded { TSS_BUSY_64 } else { TSS_AVAILABLE_64 };
    let system_type = decode_system_type(low);
    if system_type != wanted_type {
        log::error!("TSS descriptor type: {:#x}, expected {:#x}", system_type, wanted_type);
        count += 1;
    }
    count
}

/// Compare the live CPU state against the tables just loaded. Returns the
/// number of mismatches.
pub fn verify(state: &KernelState) -> usize {
    let observed = CpuTables::capture();
    let expected = CpuTables::expected(state.gdt.table(), state.idt);
    log::debug!("{:x?}", observed);

    let count = observed.mismatches(&expected)
        + tss_descriptor_mismatches(state.gdt.table(), state.gdt.tss(), true);
    if count == 0 {
        log::info!("verification passed: CS/DS/SS/TR, GDTR, IDTR and TSS descriptor as built");
    } else {
        log::error!("verification failed: {} mismatches", count);
    }
    count
}

/// Trigger the fault scenario selected at build time, if any.
pub fn run_scenario() {
    #[cfg(feature = "selftest-divide-error")]
    divide_error();

    #[cfg(feature = "selftest-page-fault")]
    page_fault();

    #[cfg(feature = "selftest-double-fault")]
    double_fault();
}

/// Expect `vector=0` on serial.
pub fn divide_error() -> ! {
    log::info!("self-test: divide by zero");
    unsafe {
        core::arch::asm!(
            "div {divisor:e}",
            divisor = in(reg) 0u32,
            inout("eax") 1u32 => _,
            inout("edx") 0u32 => _,
            options(nomem, nostack),
        );
    }
    cpu::halt_forever()
}

/// Expect `vector=14` and `fault address=0xdeadbeef000` on serial.
pub fn page_fault() -> ! {
    log::info!("self-test: reading {:#x}", UNMAPPED_ADDRESS);
    unsafe {
        core::ptr::read_volatile(UNMAPPED_ADDRESS as *const u64);
    }
    cpu::halt_forever()
}

/// Overflow the boot stack into its guard page. The page fault cannot push
/// its frame, so the CPU raises #DF, which runs on IST1.
///
/// Expect `vector=8` and `(alternate fault stack)` on serial.
pub fn double_fault() -> ! {
    #[allow(unconditional_recursion)]
    fn recurse(depth: u64) -> u64 {
        let frame = core::hint::black_box([depth; 32]);
        recurse(frame[0] + 1) + frame[31]
    }

    log::info!("self-test: stack overflow");
    core::hint::black_box(recurse(0));
    cpu::halt_forever()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CpuTables {
        CpuTables {
            code_segment: 0x08,
            data_segment: 0x10,
            stack_segment: 0x10,
            task_register: 0x28,
            gdt_base: 0x1000,
            gdt_limit: 55,
            idt_base: 0x2000,
            idt_limit: 4095,
        }
    }

    #[test]
    fn identical_state_has_no_mismatches() {
        assert_eq!(sample().mismatches(&sample()), 0);
    }

    #[test]
    fn each_differing_field_is_counted() {
        let mut observed = sample();
        observed.task_register = 0;
        observed.idt_limit = 0x0FFF - 1;
        assert_eq!(observed.mismatches(&sample()), 2);
    }

    #[test]
    fn expected_limits_are_size_minus_one() {
        let gdt = GdtTable::empty();
        let idt = InterruptTable::empty();
        let expected = CpuTables::expected(&gdt, &idt);
        assert_eq!(expected.gdt_limit, 55);
        assert_eq!(expected.idt_limit, 4095);
        assert_eq!(expected.code_segment, 0x08);
        assert_eq!(expected.task_register, 0x28);
    }

    #[test]
    fn fresh_tss_descriptor_matches_available_tss() {
        let tss = TaskStateSegment::new();
        let table = GdtTable::build(VirtAddr::from_ptr(&tss));
        assert_eq!(tss_descriptor_mismatches(&table, &tss, false), 0);
        // Not loaded, so the busy type is absent.
        assert_eq!(tss_descriptor_mismatches(&table, &tss, true), 1);
    }

    #[test]
    fn tss_descriptor_for_another_tss_is_flagged() {
        let tss = TaskStateSegment::new();
        let other = TaskStateSegment::new();
        let table = GdtTable::build(VirtAddr::from_ptr(&other));
        assert_eq!(tss_descriptor_mismatches(&table, &tss, false), 1);
    }

    #[test]
    fn unmapped_address_is_canonical() {
        assert!(VirtAddr::try_new(UNMAPPED_ADDRESS).is_ok());
    }
}
