//! Build script for textpanel-firmware
//!
//! embassy-stm32 (`memory-x` feature) provides memory.x for the selected
//! chip; this only adds the linker scripts.

fn main() {
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}
