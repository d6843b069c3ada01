use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn write_config(dir: &Path) -> String {
    let cfg = dir.join("harvest.yaml");
    let yaml = format!(
        "paths:\n  discovery_cache: '{}'\n  traffic_cache: '{}'\n  report_csv: '{}'\n",
        dir.join("discoveries.json").display(),
        dir.join("traffic.json").display(),
        dir.join("report.csv").display(),
    );
    std::fs::write(&cfg, yaml).unwrap();
    cfg.to_string_lossy().to_string()
}

#[test]
fn plan_lists_candidates_without_touching_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = write_config(dir.path());

    let mut cmd = Command::cargo_bin("fdx")?;
    cmd.current_dir(dir.path()).args([
        "plan",
        "--config",
        &cfg,
        "--start",
        "2025-06-04",
        "--end",
        "2025-06-16",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("candidates=2"))
        .stdout(predicate::str::contains("candidate=2025-06-02"))
        .stdout(predicate::str::contains("candidate=2025-06-09"));

    assert!(!dir.path().join("discoveries.json").exists());
    Ok(())
}

#[test]
fn plan_skips_intervals_already_fetched() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = write_config(dir.path());
    let snapshot = r#"{"meta":{"version":1},"intervals":{"2025-06-02":{"fetched_at":"2025-06-20T00:00:00Z"}},"entities":{}}"#;
    std::fs::write(dir.path().join("discoveries.json"), snapshot)?;

    let mut cmd = Command::cargo_bin("fdx")?;
    cmd.current_dir(dir.path()).args([
        "plan",
        "--config",
        &cfg,
        "--start",
        "2025-06-02",
        "--end",
        "2025-06-16",
        "--safety-weeks",
        "0",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("candidates=1 already_fetched=1"))
        .stdout(predicate::str::contains("candidate=2025-06-09"));

    // unchanged on disk
    assert_eq!(std::fs::read_to_string(dir.path().join("discoveries.json"))?, snapshot);
    Ok(())
}

#[test]
fn strict_rejects_unknown_config_keys() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = dir.path().join("typo.yaml");
    std::fs::write(&cfg, "harvest:\n  safty_weeks: 3\n")?;

    let mut cmd = Command::cargo_bin("fdx")?;
    cmd.current_dir(dir.path())
        .args(["plan", "--strict", "--config"])
        .arg(&cfg);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));
    Ok(())
}
