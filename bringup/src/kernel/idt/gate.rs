//! 64-bit interrupt gate encoding.
//!
//! ```text
//! low:   63     48 47    40 39  35 34 32 31      16 15      0
//!       | off mid | attrs  | 0    | IST  | selector | off lo  |
//! high:  63             32 31                               0
//!       | reserved        | offset high                     |
//! ```

use bitflags::bitflags;
use x86_64::registers::segmentation::SegmentSelector;

bitflags! {
    /// Type/attribute byte (bits 40..48 of the low word).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GateAttributes: u8 {
        /// 64-bit interrupt gate: IF is cleared on entry.
        const INTERRUPT_GATE = 0x0E;
        const PRESENT = 1 << 7;

        /// Present, ring 0 interrupt gate (0x8E).
        const KERNEL_INTERRUPT = Self::PRESENT.bits() | Self::INTERRUPT_GATE.bits();
    }
}

const IST_MASK: u64 = 0x7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, align(16))]
pub struct Gate {
    low: u64,
    high: u64,
}

impl Gate {
    /// Present bit clear. Vectoring through it raises #NP.
    pub const MISSING: Gate = Gate { low: 0, high: 0 };

    pub const fn new(
        handler: u64,
        selector: SegmentSelector,
        ist_index: u8,
        attributes: GateAttributes,
    ) -> Self {
        let low = (handler & 0xFFFF)
            | (selector.0 as u64) << 16
            | (ist_index as u64 & IST_MASK) << 32
            | (attributes.bits() as u64) << 40
            | ((handler >> 16) & 0xFFFF) << 48;
        let high = handler >> 32;
        Self { low, high }
    }

    /// Present, ring 0 interrupt gate.
    pub const fn interrupt(handler: u64, selector: SegmentSelector, ist_index: u8) -> Self {
        Self::new(handler, selector, ist_index, GateAttributes::KERNEL_INTERRUPT)
    }

    pub const fn handler_address(&self) -> u64 {
        (self.low & 0xFFFF) | ((self.low >> 48) & 0xFFFF) << 16 | (self.high & 0xFFFF_FFFF) << 32
    }

    pub const fn selector(&self) -> SegmentSelector {
        SegmentSelector((self.low >> 16) as u16)
    }

    /// 0 keeps the current stack; 1..=7 switches to that IST entry.
    pub const fn ist_index(&self) -> u8 {
        ((self.low >> 32) & IST_MASK) as u8
    }

    pub const fn attributes(&self) -> GateAttributes {
        GateAttributes::from_bits_retain((self.low >> 40) as u8)
    }

    pub const fn is_present(&self) -> bool {
        self.attributes().contains(GateAttributes::PRESENT)
    }
}
