//! The 256-gate interrupt table.

use x86_64::registers::segmentation::SegmentSelector;

use super::gate::Gate;
use super::vectors::{DOUBLE_FAULT, EXCEPTION_VECTORS};
use crate::config::DOUBLE_FAULT_IST_INDEX;

pub const IDT_ENTRIES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C, align(16))]
pub struct InterruptTable {
    gates: [Gate; IDT_ENTRIES],
}

impl InterruptTable {
    /// Table size in bytes. `lidt` takes this minus one.
    pub const SIZE: usize = IDT_ENTRIES * 16;

    pub const fn empty() -> Self {
        Self {
            gates: [Gate::MISSING; IDT_ENTRIES],
        }
    }

    /// Gates for the 32 exception vectors, each pointing at its entry stub.
    ///
    /// Only the double fault gate switches stacks. Vectors 32..256 stay
    /// missing: nothing here routes hardware interrupts.
    pub fn build(entry_points: &[u64; EXCEPTION_VECTORS], code_selector: SegmentSelector) -> Self {
        let mut table = Self::empty();
        for (vector, &handler) in entry_points.iter().enumerate() {
            let ist_index = if vector == DOUBLE_FAULT as usize {
                DOUBLE_FAULT_IST_INDEX
            } else {
                0
            };
            table.gates[vector] = Gate::interrupt(handler, code_selector, ist_index);
        }
        table
    }

    pub fn gate(&self, vector: u8) -> &Gate {
        &self.gates[vector as usize]
    }

    pub fn gates(&self) -> &[Gate; IDT_ENTRIES] {
        &self.gates
    }
}
