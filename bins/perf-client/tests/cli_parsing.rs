//! CLI argument parsing tests. These run without kernel SCTP.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_runs() {
    Command::cargo_bin("sctpx-perf-client")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("performance measurement client"));
}

#[test]
fn rejects_out_of_range_port() {
    Command::cargo_bin("sctpx-perf-client")
        .unwrap()
        .args(["127.0.0.1", "70000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn rejects_unknown_mode() {
    Command::cargo_bin("sctpx-perf-client")
        .unwrap()
        .args(["127.0.0.1", "19100", "warp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn rejects_non_numeric_iterations() {
    Command::cargo_bin("sctpx-perf-client")
        .unwrap()
        .args(["127.0.0.1", "19100", "rtt", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
