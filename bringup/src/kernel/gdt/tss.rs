//! Task State Segment (TSS) management
//!
//! In long mode the TSS only supplies stack pointers:
//! - RSP0..RSP2, loaded on a privilege-level change into that ring
//! - IST1..IST7, loaded when a gate names a nonzero IST index
//!
//! Only RSP0 and IST1 are populated. The TSS is filled in through a
//! [`TssBuilder`] and then frozen into its process-wide slot; nothing can
//! change it after that.

use core::mem::size_of;

use spin::Once;
use x86_64::structures::tss::TaskStateSegment;
use x86_64::VirtAddr;

use super::stack;
use crate::config::DOUBLE_FAULT_IST_INDEX;
use crate::kernel::{InitError, InitResult};

/// Size of the architectural 64-bit TSS (104 bytes).
pub const TSS_SIZE: usize = size_of::<TaskStateSegment>();

/// Descriptor limit: size minus one.
pub const TSS_LIMIT: u32 = (TSS_SIZE - 1) as u32;

/// The process-wide TSS. Written once by [`TssBuilder::freeze`].
static TSS: Once<TaskStateSegment> = Once::new();

/// Init-scoped owner of the TSS contents.
pub struct TssBuilder {
    tss: TaskStateSegment,
}

impl TssBuilder {
    pub const fn new() -> Self {
        Self {
            tss: TaskStateSegment::new(),
        }
    }

    /// Clear every stack pointer.
    ///
    /// The I/O map base is left pointing past the segment limit, which means
    /// "no I/O permission bitmap".
    pub fn reset(&mut self) -> &mut Self {
        self.tss = TaskStateSegment::new();
        self
    }

    /// Set RSP`level` (0..=2).
    pub fn set_privileged_stack(&mut self, level: u8, stack_top: VirtAddr) -> &mut Self {
        debug_assert!(level <= 2, "no privileged stack for ring {}", level);
        self.tss.privilege_stack_table[level as usize] = stack_top;
        self
    }

    /// Set IST`ist_index` (1..=7, the value a gate stores).
    pub fn set_interrupt_stack(&mut self, ist_index: u8, stack_top: VirtAddr) -> &mut Self {
        debug_assert!((1..=7).contains(&ist_index), "IST index {} out of range", ist_index);
        self.tss.interrupt_stack_table[(ist_index - 1) as usize] = stack_top;
        self
    }

    pub fn privileged_stack(&self, level: u8) -> VirtAddr {
        let table = self.tss.privilege_stack_table;
        table[level as usize]
    }

    pub fn interrupt_stack(&self, ist_index: u8) -> VirtAddr {
        let table = self.tss.interrupt_stack_table;
        table[(ist_index - 1) as usize]
    }

    /// Move the contents into the process-wide slot.
    ///
    /// The returned reference has a stable address for the rest of execution,
    /// which is what the GDT's TSS descriptor records.
    pub fn freeze(self) -> InitResult<&'static TaskStateSegment> {
        let mut frozen = false;
        let tss = TSS.call_once(|| {
            frozen = true;
            self.tss
        });
        if frozen {
            Ok(tss)
        } else {
            Err(InitError::TssAlreadyFrozen)
        }
    }
}

impl Default for TssBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Populate RSP0 with `kernel_stack_top` and IST1 with the alternate fault
/// stack, then freeze.
///
/// Must run before the GDT is built: the TSS descriptor embeds this address.
pub fn init(kernel_stack_top: VirtAddr) -> InitResult<&'static TaskStateSegment> {
    let fault_stack = stack::fault_stack();

    let mut builder = TssBuilder::new();
    builder
        .reset()
        .set_privileged_stack(0, kernel_stack_top)
        .set_interrupt_stack(DOUBLE_FAULT_IST_INDEX, fault_stack.top);

    let tss = builder.freeze()?;
    log_tss_info(tss);
    Ok(tss)
}

fn log_tss_info(tss: &TaskStateSegment) {
    let rsp = tss.privilege_stack_table;
    let ist = tss.interrupt_stack_table;

    log::info!("TSS at {:#x}, {} bytes", VirtAddr::from_ptr(tss).as_u64(), TSS_SIZE);
    log::debug!("  RSP0:      {:#x}", rsp[0].as_u64());
    log::debug!(
        "  IST{} (DF): {:#x}",
        DOUBLE_FAULT_IST_INDEX,
        ist[(DOUBLE_FAULT_IST_INDEX - 1) as usize].as_u64()
    );
}
