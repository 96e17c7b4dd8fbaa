//! CLI argument parsing tests. These run without kernel SCTP.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_runs() {
    Command::cargo_bin("sctpx-multi-client")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Multi-homed SCTP"));
}

#[test]
fn rejects_out_of_range_port() {
    Command::cargo_bin("sctpx-multi-client")
        .unwrap()
        .args(["127.0.0.1,127.0.0.2", "99999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn rejects_non_numeric_stream() {
    Command::cargo_bin("sctpx-multi-client")
        .unwrap()
        .args(["127.0.0.1,127.0.0.2", "19002", "payload", "six"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
