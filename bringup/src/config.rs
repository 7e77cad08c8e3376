//! Compile-time configuration for bring-up.

use bootloader_api::config::{BootloaderConfig, Mapping};
use log::LevelFilter;

/// Primary kernel stack (RSP0). Used on ring 3 -> ring 0 transitions.
pub const KERNEL_STACK_SIZE: usize = 32 * 1024;

/// Alternate fault stack behind IST1.
///
/// Only the double fault gate switches to it, so a corrupted or exhausted
/// kernel stack is never reused while reporting the double fault.
pub const FAULT_STACK_SIZE: usize = 8 * 1024;

/// IST slot holding the alternate fault stack (1-based, as stored in a gate).
pub const DOUBLE_FAULT_IST_INDEX: u8 = 1;

/// Stack the bootloader hands us at the entry point.
pub const BOOT_STACK_SIZE: u64 = 64 * 1024;

/// White on black.
pub const SCREEN_ATTRIBUTE: u8 = 0x0F;

/// White on red, used for the fault tag.
pub const FAULT_TAG_ATTRIBUTE: u8 = 0x4F;

#[cfg(feature = "trace-logs")]
pub const LOG_LEVEL: LevelFilter = LevelFilter::Trace;

#[cfg(not(feature = "trace-logs"))]
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Loader configuration. Physical memory is mapped so the text buffer at
/// physical 0xB8000 can be reached.
pub const BOOTLOADER_CONFIG: BootloaderConfig = {
    let mut config = BootloaderConfig::new_default();
    config.mappings.physical_memory = Some(Mapping::Dynamic);
    config.kernel_stack_size = BOOT_STACK_SIZE;
    config
};
