use std::path::PathBuf;
use bootloader::{BiosBoot, UefiBoot};

fn main() {
    let workspace_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap())
        .parent()
        .unwrap()
        .to_path_buf();

    let kernel_path = workspace_root
        .join("target")
        .join("x86_64-unknown-none")
        .join("debug")
        .join("bringup");

    if !kernel_path.exists() {
        eprintln!("bringup image: no bringup ELF at {}", kernel_path.display());
        eprintln!("bringup image: build it first with `make build`");
        std::process::exit(1);
    }

    let bios_img_path = workspace_root.join("bringup-bios.img");
    eprintln!("bringup image: writing BIOS image to {}", bios_img_path.display());
    BiosBoot::new(&kernel_path)
        .create_disk_image(&bios_img_path)
        .expect("failed to create BIOS disk image");

    let uefi_img_path = workspace_root.join("bringup-uefi.img");
    eprintln!("bringup image: writing UEFI image to {}", uefi_img_path.display());
    UefiBoot::new(&kernel_path)
        .create_disk_image(&uefi_img_path)
        .expect("failed to create UEFI disk image");

    println!("cargo:rustc-env=BIOS_IMAGE={}", bios_img_path.display());
    println!("cargo:rustc-env=UEFI_IMAGE={}", uefi_img_path.display());

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", kernel_path.display());
}
