#![no_std]
#![no_main]

use core::panic::PanicInfo;

use bringup::arch::x86::cpu;
use bringup::{config, kernel, serial};

bootloader_api::entry_point!(kernel_main, config = &config::BOOTLOADER_CONFIG);

fn kernel_main(boot_info: &'static mut bootloader_api::BootInfo) -> ! {
    match kernel::early_init(boot_info) {
        Ok(state) => kernel::kernel_loop(state),
        Err(err) => {
            serial::write_fmt(format_args!("bring-up failed: {}\n", err));
            cpu::halt_forever()
        }
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    serial::write_fmt(format_args!("\n!!! PANIC: {}\n", info));
    cpu::halt_forever()
}
