//! Build script for hush-ap
//!
//! Stamps the binary with the git revision, build time and profile so the
//! startup banner identifies exactly what is running.

use std::process::Command;

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    let git_hash = git_revision().unwrap_or_else(|| "unknown".to_string());
    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=HUSH_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=HUSH_BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=HUSH_BUILD_PROFILE={}", profile);
}
