use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("boutiq"));
    cmd.arg("tests/fixtures/catalog.csv")
        .arg("tests/fixtures/purchases.csv")
        .arg("--settings")
        .arg("tests/fixtures/settings.csv")
        .arg("--settle-delay-ms")
        .arg("1");

    cmd.assert()
        .success()
        // Two tote bags at 20.00 settle successfully.
        .stdout(predicate::str::contains("paid"))
        .stdout(predicate::str::contains("40.00"))
        .stdout(predicate::str::contains("11111111-1111-4111-8111-111111111111"))
        // The mug has zero stock: rejected before any order exists.
        .stderr(predicate::str::contains("insufficient stock"))
        .stdout(predicate::str::contains("22222222-2222-4222-8222-222222222222").not());

    Ok(())
}

#[test]
fn test_cli_without_settings_reports_unconfigured_shop() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("boutiq"));
    cmd.arg("tests/fixtures/catalog.csv")
        .arg("tests/fixtures/purchases.csv")
        .arg("--settle-delay-ms")
        .arg("1");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "no active payment credential configured",
        ))
        .stdout(predicate::str::contains("paid").not());

    Ok(())
}

#[test]
fn test_cli_missing_catalog_file_fails() {
    let mut cmd = Command::new(cargo_bin!("boutiq"));
    cmd.arg("does-not-exist.csv").arg("tests/fixtures/purchases.csv");

    cmd.assert().failure();
}
