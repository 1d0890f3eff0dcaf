//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use nutripick::test_utils::fixtures::{elevated_context, high_bp_profile, sample_catalog};

const NP_VARS: &[&str] = &[
    "NP_CONFIG",
    "NP_PAGE_SIZE",
    "NP_DIET",
    "NP_SATVIK_ONLY",
    "NP_NOVELTY_SEED",
    "NP_STORAGE_BACKEND",
    "NP_CATALOG",
    "NP_CONTEXT",
    "NP_PROFILE",
    "NP_SUITABILITY_URL",
    "NP_EVIDENCE_URL",
    "NP_NUTRITION_URL",
    "NP_NARRATIVE_URL",
    "RUST_LOG",
];

/// The binary pointed at `root`, isolated from the user's config and with
/// novelty disabled so orderings are exact.
pub fn np(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nutripick").unwrap();
    for var in NP_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NP_ROOT", root)
        .env("HOME", root)
        .env("XDG_CONFIG_HOME", root.join("xdg"))
        .env("NP_NOVELTY_MAX", "0");
    cmd
}

/// Catalog, wearable context and profile for the sample menu.
pub fn seed_root(root: &Path) {
    let catalog = serde_json::to_string_pretty(&sample_catalog()).unwrap();
    std::fs::write(root.join("catalog.json"), catalog).unwrap();
    std::fs::write(root.join("context.json"), elevated_context().to_string()).unwrap();
    std::fs::write(root.join("profile.json"), high_bp_profile().to_string()).unwrap();
}

pub fn robot_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}
