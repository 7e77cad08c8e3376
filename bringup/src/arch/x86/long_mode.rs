//! Long mode (64-bit) check via CR0, CR4 and EFER.

use x86_64::registers::control::{Cr0, Cr0Flags, Cr4, Cr4Flags};
use x86_64::registers::model_specific::{Efer, EferFlags};

/// Returns true if the CPU is in 64-bit long mode (PE, PG, PAE, LME, LMA set).
pub fn is_long_mode() -> bool {
    let cr0 = Cr0::read();
    let cr4 = Cr4::read();
    let efer = Efer::read();

    cr0.contains(Cr0Flags::PROTECTED_MODE_ENABLE | Cr0Flags::PAGING)
        && cr4.contains(Cr4Flags::PHYSICAL_ADDRESS_EXTENSION)
        && efer.contains(EferFlags::LONG_MODE_ENABLE | EferFlags::LONG_MODE_ACTIVE)
}
