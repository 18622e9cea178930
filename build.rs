use std::env;
use std::process::Command;
use time::OffsetDateTime;

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");

    // Reproducible builds pin the year through SOURCE_DATE_EPOCH
    let build_year = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
        .map(|dt| dt.year())
        .unwrap_or_else(|| OffsetDateTime::now_utc().year());
    println!("cargo:rustc-env=BOT_BUILD_YEAR={build_year}");

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let release = env::var("PROFILE").map(|p| p == "release").unwrap_or(false);

    let display = if release {
        version
    } else {
        // A move off (or onto) the release tag changes the display version
        println!("cargo:rerun-if-changed=.git/HEAD");
        println!("cargo:rerun-if-changed=.git/refs/tags");
        if tagged_as(&version) {
            version
        } else {
            format!("{version}-dev")
        }
    };
    println!("cargo:rustc-env=BOT_VERSION_DISPLAY={display}");
}

/// True when HEAD carries exactly the `v<version>` tag.
fn tagged_as(version: &str) -> bool {
    Command::new("git")
        .args(["describe", "--tags", "--exact-match"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .is_some_and(|tag| tag.trim() == format!("v{version}"))
}
