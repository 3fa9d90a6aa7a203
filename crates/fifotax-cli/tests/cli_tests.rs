#![allow(clippy::panic)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn events_command_fails_without_args() {
    let mut cmd = cargo_bin_cmd!("fifotax-tool");
    cmd.assert().failure();
}

#[test]
fn report_command_fails_without_required_flags() {
    let mut cmd = cargo_bin_cmd!("fifotax-tool");
    cmd.arg("report").arg("tests/fixtures/events.json").assert().failure();
}

#[test]
fn events_command_normalises_and_prints_json() {
    let mut cmd = cargo_bin_cmd!("fifotax-tool");
    cmd.arg("events")
        .arg("tests/fixtures/events.json")
        .arg("--prices")
        .arg("tests/fixtures/prices.json")
        .assert()
        .success()
        .stdout(contains("\"event\": \"rsu_vest\""))
        .stdout(contains("\"historic_qty\": \"10\""));
}

#[test]
fn report_command_plain_output_contains_expected_sections_and_sale() {
    let mut cmd = cargo_bin_cmd!("fifotax-tool");
    cmd.arg("report")
        .arg("tests/fixtures/events.json")
        .arg("--prices")
        .arg("tests/fixtures/prices.json")
        .arg("--rates")
        .arg("tests/fixtures/rates.json")
        .arg("--year")
        .arg("2022")
        .arg("--format")
        .arg("plain")
        .assert()
        .success()
        .stdout(contains("# SUMMARY"))
        .stdout(contains("# SHARES"))
        .stdout(contains("NVDA"));
}

#[test]
fn report_command_json_output_is_parseable_and_has_one_sold_share() {
    let mut cmd = cargo_bin_cmd!("fifotax-tool");
    let output = cmd
        .arg("report")
        .arg("tests/fixtures/events.json")
        .arg("--prices")
        .arg("tests/fixtures/prices.json")
        .arg("--rates")
        .arg("tests/fixtures/rates.json")
        .arg("--year")
        .arg("2022")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap_or_else(|e| panic!("failed to run CLI: {e}"));

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not valid JSON: {e}\n{stdout}"));
    let shares = report["shares"].as_array().unwrap_or_else(|| panic!("expected shares array in {report}"));
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0]["symbol"], "NVDA");
    assert_eq!(shares[0]["quantity"], "4");
}

#[test]
fn report_command_fails_on_missing_rates_file() {
    let mut cmd = cargo_bin_cmd!("fifotax-tool");
    cmd.arg("report")
        .arg("tests/fixtures/events.json")
        .arg("--rates")
        .arg("tests/fixtures/does_not_exist.json")
        .arg("--year")
        .arg("2022")
        .assert()
        .failure();
}
