use std::{
    process::Command,
    time::{SystemTime, UNIX_EPOCH},
};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    if let Some(hash) = git_short_hash() {
        println!("cargo:rustc-env=TALLY_BUILD_GIT_HASH={hash}");
    }
    println!("cargo:rustc-env=TALLY_BUILD_TIME_UNIX={}", build_time_unix());
}

/// `None` outside a git checkout, `/meta` then reports a null hash.
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}

/// Unix seconds, or SOURCE_DATE_EPOCH when set.
fn build_time_unix() -> String {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .ok()
                .map(|d| d.as_secs().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
