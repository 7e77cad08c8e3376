//! GDT layout and construction.
//!
//! ```text
//! slot 0    null
//! slot 1    kernel code   0x08
//! slot 2    kernel data   0x10
//! slot 3    user code     0x18
//! slot 4    user data     0x20
//! slot 5-6  TSS           0x28
//! ```

use x86_64::registers::segmentation::SegmentSelector;
use x86_64::{PrivilegeLevel, VirtAddr};

use super::descriptor::{encode_segment, encode_tss_descriptor, Access, Flags};
use super::tss::TSS_LIMIT;

pub const GDT_SLOTS: usize = 7;

pub const NULL_SLOT: u16 = 0;
pub const KERNEL_CODE_SLOT: u16 = 1;
pub const KERNEL_DATA_SLOT: u16 = 2;
pub const USER_CODE_SLOT: u16 = 3;
pub const USER_DATA_SLOT: u16 = 4;
/// First of the two slots taken by the TSS descriptor.
pub const TSS_SLOT: u16 = 5;

/// Selector for a slot: index * 8, table indicator GDT, RPL 0.
pub const fn selector(slot: u16) -> SegmentSelector {
    SegmentSelector::new(slot, PrivilegeLevel::Ring0)
}

pub const KERNEL_CODE_SELECTOR: SegmentSelector = selector(KERNEL_CODE_SLOT);
pub const KERNEL_DATA_SELECTOR: SegmentSelector = selector(KERNEL_DATA_SLOT);
pub const USER_CODE_SELECTOR: SegmentSelector = selector(USER_CODE_SLOT);
pub const USER_DATA_SELECTOR: SegmentSelector = selector(USER_DATA_SLOT);
pub const TSS_SELECTOR: SegmentSelector = selector(TSS_SLOT);

/// The descriptor table as the CPU reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct GdtTable {
    slots: [u64; GDT_SLOTS],
}

impl GdtTable {
    /// Table size in bytes. `lgdt` takes this minus one.
    pub const SIZE: usize = GDT_SLOTS * 8;

    pub const fn empty() -> Self {
        Self {
            slots: [0; GDT_SLOTS],
        }
    }

    /// Build the flat-model table with a TSS descriptor for `tss_base`.
    ///
    /// Pure: the same address always yields the same bytes.
    pub fn build(tss_base: VirtAddr) -> Self {
        let mut table = Self::empty();

        table.set(KERNEL_CODE_SLOT, encode_segment(Access::KERNEL_CODE, Flags::LONG_MODE));
        table.set(KERNEL_DATA_SLOT, encode_segment(Access::KERNEL_DATA, Flags::empty()));
        table.set(USER_CODE_SLOT, encode_segment(Access::USER_CODE, Flags::LONG_MODE));
        table.set(USER_DATA_SLOT, encode_segment(Access::USER_DATA, Flags::empty()));

        let (low, high) = encode_tss_descriptor(tss_base.as_u64(), TSS_LIMIT);
        table.set(TSS_SLOT, low);
        table.set(TSS_SLOT + 1, high);

        table
    }

    fn set(&mut self, slot: u16, descriptor: u64) {
        self.slots[slot as usize] = descriptor;
    }

    pub fn slot(&self, slot: u16) -> u64 {
        self.slots[slot as usize]
    }

    pub fn slots(&self) -> &[u64; GDT_SLOTS] {
        &self.slots
    }
}
