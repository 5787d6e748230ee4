use std::env;
use std::process::Command;

fn emit(name: &str, value: &str) {
    println!("cargo:rustc-env={}={}", name, value);
}

fn env_or_unknown(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| "unknown".to_string())
}

/// First non-empty line of a successful command's stdout.
fn command_line(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()?
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Cargo feature flags of this crate, sorted, or `none`.
fn enabled_features() -> String {
    let mut features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_").map(str::to_lowercase))
        .collect();
    features.sort();
    if features.is_empty() {
        "none".to_string()
    } else {
        features.join(",")
    }
}

/// CI ref, then git describe, then the short hash, then the crate version.
fn repository_version() -> String {
    env::var("CI_BUILD_REF")
        .ok()
        .filter(|val| !val.is_empty())
        .or_else(|| command_line("git", &["describe", "--always", "--dirty", "--long", "--tags"]))
        .or_else(|| command_line("git", &["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| env_or_unknown("CARGO_PKG_VERSION"))
}

fn main() {
    for path in ["build.rs", "../../.git/HEAD", "../../.git/refs/heads"] {
        println!("cargo:rerun-if-changed={}", path);
    }

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    emit("BUILD_PROFILE", &env_or_unknown("PROFILE"));
    emit("BUILD_FEATURES", &enabled_features());
    emit("REPO_VERSION", &repository_version());
    emit("BUILD_TIMESTAMP", &chrono::Utc::now().to_rfc3339());
    emit(
        "RUST_VERSION",
        &command_line(&rustc, &["--version"]).unwrap_or_else(|| "unknown".to_string()),
    );
    if let Ok(target) = env::var("TARGET") {
        emit("BUILD_TARGET", &target);
    }
}
