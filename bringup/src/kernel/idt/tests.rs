//! IDT subsystem tests

use core::mem::size_of;

use super::dispatch::{screen_tag, FaultReport, FrameSnapshot, HandlerStack};
use super::gate::{Gate, GateAttributes};
use super::stubs::entry_points;
use super::table::{InterruptTable, IDT_ENTRIES};
use super::vectors::*;
use crate::kernel::gdt::KERNEL_CODE_SELECTOR;

fn fake_entry_points() -> [u64; EXCEPTION_VECTORS] {
    let mut points = [0u64; EXCEPTION_VECTORS];
    for (vector, point) in points.iter_mut().enumerate() {
        *point = 0xFFFF_FFFF_8012_3400 + (vector as u64) * 0x40;
    }
    points
}

fn sample_table() -> InterruptTable {
    InterruptTable::build(&fake_entry_points(), KERNEL_CODE_SELECTOR)
}

#[test]
fn gate_is_sixteen_bytes() {
    assert_eq!(size_of::<Gate>(), 16);
    assert_eq!(InterruptTable::SIZE, 4096);
    assert_eq!(size_of::<InterruptTable>(), InterruptTable::SIZE);
}

#[test]
fn gate_encodes_known_layout() {
    let gate = Gate::interrupt(0x1122_3344_5566_7788, KERNEL_CODE_SELECTOR, 1);
    assert_eq!(gate.handler_address(), 0x1122_3344_5566_7788);
    assert_eq!(gate.selector().0, 0x08);
    assert_eq!(gate.ist_index(), 1);
    assert_eq!(gate.attributes().bits(), 0x8E);
    assert!(gate.is_present());
}

#[test]
fn kernel_interrupt_attributes_are_0x8e() {
    assert_eq!(GateAttributes::KERNEL_INTERRUPT.bits(), 0x8E);
}

#[test]
fn exception_gates_point_at_their_entries() {
    let points = fake_entry_points();
    let table = sample_table();
    for vector in 0..EXCEPTION_VECTORS as u8 {
        let gate = table.gate(vector);
        assert!(gate.is_present(), "vector {}", vector);
        assert_eq!(gate.handler_address(), points[vector as usize]);
        assert_eq!(gate.selector(), KERNEL_CODE_SELECTOR);
        assert_eq!(gate.attributes(), GateAttributes::KERNEL_INTERRUPT);
    }
}

#[test]
fn only_double_fault_uses_an_ist() {
    let table = sample_table();
    for vector in 0..EXCEPTION_VECTORS as u8 {
        let expected = if vector == DOUBLE_FAULT { 1 } else { 0 };
        assert_eq!(table.gate(vector).ist_index(), expected, "vector {}", vector);
    }
}

#[test]
fn vectors_above_31_are_missing() {
    let table = sample_table();
    for vector in EXCEPTION_VECTORS..IDT_ENTRIES {
        let gate = table.gate(vector as u8);
        assert!(!gate.is_present(), "vector {}", vector);
        assert_eq!(*gate, Gate::MISSING);
    }
}

#[test]
fn table_build_is_idempotent() {
    assert_eq!(sample_table(), sample_table());
}

#[test]
fn stub_addresses_are_distinct() {
    let points = entry_points();
    for (i, a) in points.iter().enumerate() {
        assert_ne!(*a, 0);
        for b in &points[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn error_code_vectors_match_architecture() {
    let with_code: Vec<u8> = (0..EXCEPTION_VECTORS as u8)
        .filter(|&v| exception(v).map_or(false, |e| e.error_code))
        .collect();
    assert_eq!(with_code, vec![8u8, 10, 11, 12, 13, 14, 17, 21, 29, 30]);
    assert!(exception(32).is_none());
}

#[test]
fn divide_error_report_shows_vector_zero() {
    let mut out = String::new();
    FaultReport::new(DIVIDE_ERROR, 0).write_to(&mut out).unwrap();
    assert!(out.contains("vector=0 #DE (divide error) error=0x0"), "{}", out);
    assert!(out.ends_with("system halted\n"));
    assert!(!out.contains("fault address"));
}

#[test]
fn page_fault_report_includes_faulting_address() {
    let mut report = FaultReport::new(PAGE_FAULT, 0x2);
    report.fault_address = Some(0xdead_beef_000);

    let mut out = String::new();
    report.write_to(&mut out).unwrap();
    assert!(out.contains("vector=14 #PF"));
    assert!(out.contains("error=0x2"));
    assert!(out.contains("fault address=0xdeadbeef000"), "{}", out);
}

#[test]
fn report_includes_interrupted_frame() {
    let mut report = FaultReport::new(GENERAL_PROTECTION, 0x28);
    report.frame = Some(FrameSnapshot {
        instruction_pointer: 0x20_1000,
        code_segment: 0x08,
        cpu_flags: 0x202,
        stack_pointer: 0x7000,
        stack_segment: 0x10,
    });

    let mut out = String::new();
    report.write_to(&mut out).unwrap();
    assert!(out.contains("rip=0x201000 cs=0x8 rflags=0x202 rsp=0x7000 ss=0x10"), "{}", out);
}

#[test]
fn double_fault_report_names_the_stack() {
    let mut report = FaultReport::new(DOUBLE_FAULT, 0);
    report.handler_stack = Some(HandlerStack {
        stack_pointer: 0x9F80,
        on_fault_stack: true,
    });

    let mut out = String::new();
    report.write_to(&mut out).unwrap();
    assert!(out.contains("handler rsp=0x9f80 (alternate fault stack)"), "{}", out);
}

#[test]
fn screen_tag_is_fixed_width() {
    assert_eq!(&screen_tag(0), b"EXC00");
    assert_eq!(&screen_tag(8), b"EXC08");
    assert_eq!(&screen_tag(14), b"EXC14");
    assert_eq!(&screen_tag(31), b"EXC31");
}
