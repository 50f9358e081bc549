//! This build script copies the `memory.x` file from the crate root into
//! a directory where the linker can always find it at build time, and
//! bakes the firmware version string into the binary.

use std::{env, fs::File, io::Write, path::PathBuf};

fn main() {
    // Put `memory.x` in our output directory and ensure it's
    // on the linker search path.
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();
    println!("cargo:rustc-link-search={}", out.display());

    println!("cargo:rerun-if-changed=memory.x");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    if env::var("CARGO_FEATURE_DEFMT").is_ok() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Build info
    let pkg_version = env!("CARGO_PKG_VERSION");
    let git_hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|hash| hash.trim().to_string());

    match git_hash {
        Some(hash) => {
            println!("cargo:rustc-env=FW_VERSION={pkg_version}-{hash}")
        }
        None => println!("cargo:rustc-env=FW_VERSION={pkg_version}"),
    }
}
