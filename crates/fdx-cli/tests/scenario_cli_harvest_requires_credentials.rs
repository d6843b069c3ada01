use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// Missing credentials abort before the store is even opened, so no request
/// is sent and nothing is written.
#[test]
fn harvest_without_credentials_fails_fast() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = dir.path().join("harvest.yaml");
    let yaml = format!(
        "edsm:\n  base_url: 'http://127.0.0.1:1'\n  keys_env:\n    commander: 'FDX_CLI_TEST_NO_COMMANDER'\n    api_key: 'FDX_CLI_TEST_NO_API_KEY'\npaths:\n  discovery_cache: '{}'\n",
        dir.path().join("discoveries.json").display()
    );
    std::fs::write(&cfg, yaml)?;

    let mut cmd = Command::cargo_bin("fdx")?;
    cmd.current_dir(dir.path())
        .env_remove("FDX_CLI_TEST_NO_COMMANDER")
        .env_remove("FDX_CLI_TEST_NO_API_KEY")
        .args(["harvest", "--end", "2025-06-16", "--config"])
        .arg(&cfg);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_CREDENTIALS_MISSING"))
        .stderr(predicate::str::contains("FDX_CLI_TEST_NO_COMMANDER"));

    assert!(!dir.path().join("discoveries.json").exists());
    Ok(())
}
