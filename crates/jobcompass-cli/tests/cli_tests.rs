use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn company_reports_official_domain_without_a_mapping_file() {
    let mut cmd = Command::cargo_bin("jobcompass").unwrap();
    cmd.args(["company", "サンプル商事", "https://www.sample-trading.co.jp/"]);
    cmd.assert().success().stdout(predicate::str::contains("official:"));
}

#[test]
fn classify_resolves_via_rule_match_without_network_access() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "新卒採用情報です。25卒の皆様を対象とした募集を開始しました。").unwrap();

    let mut cmd = Command::cargo_bin("jobcompass").unwrap();
    cmd.args(["classify", "https://example.co.jp/recruit/newgrad", "新卒採用情報"]);
    cmd.arg(tmp.path());
    cmd.assert().success().stdout(predicate::str::contains("new_grad_recruitment"));
}

#[test]
fn status_prints_config_summary() {
    let mut cmd = Command::cargo_bin("jobcompass").unwrap();
    cmd.args(["--format", "json", "status"]);
    cmd.assert().success().stdout(predicate::str::contains("embedding_model"));
}
