use assert_cmd::Command;
use predicates::prelude::*;

fn bookswap() -> Command {
    let mut cmd = Command::cargo_bin("bookswap").unwrap();
    cmd.env_remove("BOOKSWAP_ENV")
        .env_remove("BOOKSWAP_CONFIG_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    bookswap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("places"));
}

#[test]
fn places_prints_default_catalog() {
    bookswap()
        .arg("places")
        .assert()
        .success()
        .stdout(predicate::str::contains("Room B104"));
}

#[test]
fn settings_are_printed_as_json() {
    let output = bookswap().arg("settings").output().unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["environment"], "local");
    assert_eq!(settings["exchange"]["sibling_policy"], "auto_reject");
}

#[test]
fn unknown_environment_is_rejected() {
    bookswap()
        .env("BOOKSWAP_ENV", "mars")
        .arg("places")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported environment"));
}
