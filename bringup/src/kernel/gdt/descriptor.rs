//! Segment descriptor encoding.
//!
//! Code/data descriptor (8 bytes):
//!
//! ```text
//!  63      56 55  52 51  48 47      40 39      16 15       0
//! | base hi  | flags| lim hi| access  | base lo   | limit lo |
//! ```
//!
//! The 64-bit TSS descriptor spans two slots: the low slot has the layout
//! above with a system type in the access byte, the high slot holds
//! `base[63:32]` in its low half.

use bitflags::bitflags;

bitflags! {
    /// Access byte (bits 40..48).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Access: u8 {
        const ACCESSED = 1 << 0;
        /// Readable for code, writable for data.
        const READ_WRITE = 1 << 1;
        /// Conforming for code, expand-down for data.
        const DIRECTION_CONFORMING = 1 << 2;
        const EXECUTABLE = 1 << 3;
        /// Code/data (set) as opposed to a system descriptor (clear).
        const CODE_DATA = 1 << 4;
        const DPL_LOW = 1 << 5;
        const DPL_HIGH = 1 << 6;
        const RING_3 = Self::DPL_LOW.bits() | Self::DPL_HIGH.bits();
        const PRESENT = 1 << 7;

        const KERNEL_CODE = Self::PRESENT.bits() | Self::CODE_DATA.bits()
            | Self::EXECUTABLE.bits() | Self::READ_WRITE.bits();
        const KERNEL_DATA = Self::PRESENT.bits() | Self::CODE_DATA.bits()
            | Self::READ_WRITE.bits();
        const USER_CODE = Self::KERNEL_CODE.bits() | Self::RING_3.bits();
        const USER_DATA = Self::KERNEL_DATA.bits() | Self::RING_3.bits();
    }
}

bitflags! {
    /// Flags nibble (bits 52..56).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        const AVAILABLE = 1 << 0;
        /// 64-bit code segment. Must be clear for data segments.
        const LONG_MODE = 1 << 1;
        /// 32-bit default operand size. Must be clear when LONG_MODE is set.
        const SIZE_32 = 1 << 2;
        const GRANULARITY_4K = 1 << 3;
    }
}

/// System type nibble for an available 64-bit TSS. `ltr` rejects anything else.
pub const TSS_AVAILABLE_64: u8 = 0x9;

/// Set by `ltr` in place of [`TSS_AVAILABLE_64`].
pub const TSS_BUSY_64: u8 = 0xB;

/// Access byte of a TSS descriptor: present, ring 0, available 64-bit TSS.
pub const TSS_ACCESS: u8 = Access::PRESENT.bits() | TSS_AVAILABLE_64;

const LIMIT_MASK: u32 = 0x000F_FFFF;

/// Flat-model code/data descriptor. Base and limit are ignored in long mode
/// and stay zero.
pub const fn encode_segment(access: Access, flags: Flags) -> u64 {
    (access.bits() as u64) << 40 | ((flags.bits() & 0x0F) as u64) << 52
}

/// Two-slot TSS descriptor, returned as (low, high).
///
/// `limit` is truncated to 20 bits, as the processor would.
pub const fn encode_tss_descriptor(base: u64, limit: u32) -> (u64, u64) {
    let limit = (limit & LIMIT_MASK) as u64;

    let low = (limit & 0xFFFF)
        | (base & 0xFF_FFFF) << 16
        | (TSS_ACCESS as u64) << 40
        | (limit >> 16) << 48
        | ((base >> 24) & 0xFF) << 56;
    let high = base >> 32;

    (low, high)
}

/// Base address of a code/data descriptor or the low half of a system one.
pub const fn decode_base(descriptor: u64) -> u32 {
    (((descriptor >> 16) & 0xFF_FFFF) | ((descriptor >> 56) & 0xFF) << 24) as u32
}

/// 20-bit limit field.
pub const fn decode_limit(descriptor: u64) -> u32 {
    ((descriptor & 0xFFFF) | ((descriptor >> 48) & 0xF) << 16) as u32
}

pub const fn decode_access(descriptor: u64) -> u8 {
    (descriptor >> 40) as u8
}

pub const fn decode_flags(descriptor: u64) -> u8 {
    ((descriptor >> 52) & 0xF) as u8
}

/// Full 64-bit base of a two-slot TSS descriptor.
pub const fn decode_tss_base(low: u64, high: u64) -> u64 {
    decode_base(low) as u64 | (high & 0xFFFF_FFFF) << 32
}

/// System type nibble of a descriptor's access byte.
pub const fn decode_system_type(descriptor: u64) -> u8 {
    decode_access(descriptor) & 0x0F
}
