//! CLI argument handling tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_displays() {
    let mut cmd = Command::cargo_bin("emolens").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("facial emotion"));
}

#[test]
fn test_version_displays() {
    let mut cmd = Command::cargo_bin("emolens").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("emolens"));
}

#[test]
fn test_no_paths_is_an_invocation_error() {
    let mut cmd = Command::cargo_bin("emolens").unwrap();
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

#[test]
fn test_min_face_size_out_of_range_rejected() {
    let mut cmd = Command::cargo_bin("emolens").unwrap();
    cmd.arg("--min-face-size").arg("1.5").arg("some.jpg");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not in 0.0..=1.0"));
}

#[test]
fn test_min_face_size_not_a_number_rejected() {
    let mut cmd = Command::cargo_bin("emolens").unwrap();
    cmd.arg("--min-face-size").arg("big").arg("some.jpg");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not a valid number"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    let mut cmd = Command::cargo_bin("emolens").unwrap();
    cmd.arg("frobnicate");
    // Parsed as a path to classify, which then fails on missing models or
    // unsupported file; either way this must not succeed.
    cmd.assert().failure();
}

#[test]
fn test_invalid_format_rejected() {
    let mut cmd = Command::cargo_bin("emolens").unwrap();
    cmd.arg("--format").arg("xml").arg("some.jpg");
    cmd.assert().failure();
}
