//! Prints the disk images produced by the build script.

fn main() {
    println!("BIOS image: {}", env!("BIOS_IMAGE"));
    println!("UEFI image: {}", env!("UEFI_IMAGE"));
}
