//! GDT subsystem tests
//!
//! Bit layouts are checked against the architecture's published encodings.

use core::mem::{offset_of, size_of};

use x86_64::structures::tss::TaskStateSegment;
use x86_64::VirtAddr;

use super::descriptor::*;
use super::stack;
use super::table::*;
use super::tss::{TssBuilder, TSS_LIMIT, TSS_SIZE};
use crate::kernel::InitError;

const FLAT_SLOTS: [u16; 4] = [KERNEL_CODE_SLOT, KERNEL_DATA_SLOT, USER_CODE_SLOT, USER_DATA_SLOT];

fn sample_table() -> GdtTable {
    GdtTable::build(VirtAddr::new(0xFFFF_8000_1234_5670))
}

#[test]
fn access_bytes_match_architectural_values() {
    assert_eq!(Access::KERNEL_CODE.bits(), 0x9A);
    assert_eq!(Access::KERNEL_DATA.bits(), 0x92);
    assert_eq!(Access::USER_CODE.bits(), 0xFA);
    assert_eq!(Access::USER_DATA.bits(), 0xF2);
    assert_eq!(TSS_ACCESS, 0x89);
}

#[test]
fn flat_descriptors_encode_to_known_words() {
    let table = sample_table();
    assert_eq!(table.slot(KERNEL_CODE_SLOT), 0x0020_9A00_0000_0000);
    assert_eq!(table.slot(KERNEL_DATA_SLOT), 0x0000_9200_0000_0000);
    assert_eq!(table.slot(USER_CODE_SLOT), 0x0020_FA00_0000_0000);
    assert_eq!(table.slot(USER_DATA_SLOT), 0x0000_F200_0000_0000);
}

#[test]
fn flat_descriptors_have_zero_base_and_limit() {
    let table = sample_table();
    for slot in FLAT_SLOTS {
        let descriptor = table.slot(slot);
        assert_eq!(decode_base(descriptor), 0, "slot {}", slot);
        assert_eq!(decode_limit(descriptor), 0, "slot {}", slot);
    }
}

#[test]
fn null_slot_is_zero() {
    assert_eq!(sample_table().slot(NULL_SLOT), 0);
}

#[test]
fn encode_decode_preserves_access_and_flags() {
    for access in 0..=u8::MAX {
        for flags in 0..16u8 {
            let descriptor = encode_segment(
                Access::from_bits_retain(access),
                Flags::from_bits_retain(flags),
            );
            assert_eq!(decode_access(descriptor), access);
            assert_eq!(decode_flags(descriptor), flags);
        }
    }
}

#[test]
fn flags_above_the_nibble_are_dropped() {
    let descriptor = encode_segment(Access::KERNEL_DATA, Flags::from_bits_retain(0xF2));
    assert_eq!(decode_flags(descriptor), 0x2);
    assert_eq!(decode_base(descriptor), 0);
}

#[test]
fn selectors_are_slot_times_eight() {
    for slot in 0..GDT_SLOTS as u16 {
        assert_eq!(selector(slot).0, slot * 8);
    }
    assert_eq!(KERNEL_CODE_SELECTOR.0, 0x08);
    assert_eq!(KERNEL_DATA_SELECTOR.0, 0x10);
    assert_eq!(USER_CODE_SELECTOR.0, 0x18);
    assert_eq!(USER_DATA_SELECTOR.0, 0x20);
    assert_eq!(TSS_SELECTOR.0, 0x28);
}

#[test]
fn tss_descriptor_decodes_to_tss_address_and_size() {
    let tss = TaskStateSegment::new();
    let base = VirtAddr::from_ptr(&tss);
    let table = GdtTable::build(base);

    let low = table.slot(TSS_SLOT);
    let high = table.slot(TSS_SLOT + 1);
    assert_eq!(decode_tss_base(low, high), base.as_u64());
    assert_eq!(decode_limit(low), (size_of::<TaskStateSegment>() - 1) as u32);
    assert_eq!(decode_system_type(low), TSS_AVAILABLE_64);
    assert_eq!(decode_access(low), 0x89);
}

#[test]
fn tss_descriptor_spreads_base_across_both_slots() {
    let (low, high) = encode_tss_descriptor(0x1122_3344_5566_7788, 0x67);
    assert_eq!(low, 0x5500_8966_7788_0067);
    assert_eq!(high, 0x1122_3344);
}

#[test]
fn tss_limit_is_truncated_to_twenty_bits() {
    let (low, _) = encode_tss_descriptor(0, 0xFFF_FFFF);
    assert_eq!(decode_limit(low), 0xF_FFFF);
    assert_eq!(decode_access(low), TSS_ACCESS);
}

#[test]
fn table_build_is_idempotent() {
    assert_eq!(sample_table(), sample_table());
    assert_eq!(sample_table().slots(), sample_table().slots());
}

#[test]
fn table_size_covers_seven_slots() {
    assert_eq!(GdtTable::SIZE, 56);
    assert_eq!(size_of::<GdtTable>(), 56);
}

#[test]
fn tss_layout_matches_architecture() {
    assert_eq!(TSS_SIZE, 104);
    assert_eq!(TSS_LIMIT, 103);
    assert_eq!(offset_of!(TaskStateSegment, privilege_stack_table), 4);
    assert_eq!(offset_of!(TaskStateSegment, interrupt_stack_table), 36);
    assert_eq!(offset_of!(TaskStateSegment, iomap_base), 102);
}

#[test]
fn builder_populates_only_requested_stacks() {
    let kernel_top = VirtAddr::new(0x20_0000);
    let fault_top = VirtAddr::new(0x30_0000);

    let mut builder = TssBuilder::new();
    builder
        .set_privileged_stack(0, kernel_top)
        .set_interrupt_stack(1, fault_top);

    assert_eq!(builder.privileged_stack(0), kernel_top);
    assert_eq!(builder.interrupt_stack(1), fault_top);
    for level in 1..=2 {
        assert_eq!(builder.privileged_stack(level).as_u64(), 0);
    }
    for ist in 2..=7 {
        assert_eq!(builder.interrupt_stack(ist).as_u64(), 0);
    }
}

#[test]
fn builder_reset_clears_stacks() {
    let mut builder = TssBuilder::new();
    builder.set_interrupt_stack(1, VirtAddr::new(0x4000));
    builder.reset();
    assert_eq!(builder.interrupt_stack(1).as_u64(), 0);
}

#[test]
fn fault_stack_is_aligned_and_sized() {
    let region = stack::fault_stack();
    assert_eq!(region.size(), 8192);
    assert_eq!(region.top.as_u64() % 16, 0);
    assert!(region.contains(region.top.as_u64()));
    assert!(!region.contains(region.top.as_u64() + 1));
}

#[test]
fn kernel_stack_is_separate_from_fault_stack() {
    let kernel = stack::kernel_stack();
    let fault = stack::fault_stack();
    assert_eq!(kernel.top.as_u64() % 16, 0);
    assert!(!fault.contains(kernel.top.as_u64() - 8));
}

// The only test that touches the process-wide TSS slot.
#[test]
fn second_freeze_is_rejected() {
    let mut first = TssBuilder::new();
    first.set_interrupt_stack(1, VirtAddr::new(0x4000));
    let tss = first.freeze().expect("first freeze");
    let ist = tss.interrupt_stack_table;
    assert_eq!(ist[0].as_u64(), 0x4000);

    let mut second = TssBuilder::new();
    second.set_interrupt_stack(1, VirtAddr::new(0x8000));
    assert_eq!(second.freeze().err(), Some(InitError::TssAlreadyFrozen));
}
