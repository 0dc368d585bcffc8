// AwningLink - Build Script
//
// Sets up the ESP-IDF environment for firmware builds, stamps the version
// string and validates peer MAC overrides.

use std::env;
use std::process::Command;

/// Build-time overrides for the paired peer addresses.
const MAC_OVERRIDES: [&str; 2] = ["AWNING_RECEIVER_MAC", "AWNING_SENDER_MAC"];

fn main() {
    // Chip cfg (`esp32`, `esp32s3`, ...) comes from the ESP-IDF sysenv
    println!("cargo:rustc-check-cfg=cfg(esp32)");

    // ESP-IDF environment setup (firmware targets only)
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    // Get git version info
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=VERSION_STRING=AwningLink v{}-g{}", version, git_hash);

    for key in MAC_OVERRIDES {
        println!("cargo:rerun-if-env-changed={}", key);
        if let Ok(value) = env::var(key) {
            if !is_mac_address(&value) {
                panic!(
                    "{} must look like AA:BB:CC:DD:EE:FF, got '{}'",
                    key, value
                );
            }
        }
    }

    // Rebuild if git HEAD changes
    println!("cargo:rerun-if-changed=.git/HEAD");
}

fn is_mac_address(value: &str) -> bool {
    let parts: Vec<&str> = value.trim().split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_hexdigit()))
}
